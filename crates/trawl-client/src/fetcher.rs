use std::time::Duration;

use reqwest::Client;
use trawl_core::error::AppError;
use trawl_core::traits::{ByteFetcher, ByteResponse, FetchedPage, Fetcher};

const USER_AGENT: &str = "Trawl/0.1 (content harvester)";

fn build_client(timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Generic(format!("Failed to build HTTP client: {e}")))
}

/// Static-page fetcher using reqwest.
///
/// Downloads raw HTML without executing scripts, following redirects and
/// reporting the final URL. Any non-2xx status or transport failure is
/// reported as [`AppError::FetchError`].
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::FetchError(format!("timeout fetching {url}: {e}"))
            } else if e.is_connect() {
                AppError::FetchError(format!("connect failed for {url}: {e}"))
            } else {
                AppError::FetchError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::FetchError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| AppError::FetchError(format!("Failed to read response body: {e}")))?;

        Ok(FetchedPage {
            url: final_url,
            html,
        })
    }
}

/// Binary payload fetcher using reqwest.
///
/// Returns every HTTP response as-is, whatever its status; only
/// connection-level failures become [`AppError::TransportError`].
#[derive(Clone)]
pub struct ReqwestByteFetcher {
    client: Client,
}

impl ReqwestByteFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(60))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }
}

impl ByteFetcher for ReqwestByteFetcher {
    async fn get(&self, url: &str) -> Result<ByteResponse, AppError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::TransportError(format!("Failed to read body: {e}")))?;

        Ok(ByteResponse {
            status,
            body: body.to_vec(),
        })
    }
}
