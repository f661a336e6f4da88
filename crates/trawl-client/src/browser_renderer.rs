use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use trawl_core::error::AppError;
use trawl_core::traits::Renderer;

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Headless-Chromium renderer session driven over the Chrome DevTools Protocol.
///
/// One instance owns one browser process and at most one tab. Create a fresh
/// renderer per load; [`Renderer::close`] shuts the process down and is a
/// no-op when called again.
///
/// # Example
///
/// ```rust,no_run
/// use trawl_client::BrowserRenderer;
/// use trawl_core::traits::Renderer;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let mut renderer = BrowserRenderer::launch().await?;
/// renderer.open("https://example.com").await?;
/// renderer.trigger_lazy_load().await?;
/// let html = renderer.snapshot().await?;
/// renderer.close().await;
/// # Ok(())
/// # }
/// ```
pub struct BrowserRenderer {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    page: Option<Page>,
    timeout: Duration,
}

impl BrowserRenderer {
    /// Launches a headless Chromium browser with a **30 s** per-command timeout.
    ///
    /// Requires a Chromium / Chrome binary reachable via `$PATH`, `CHROME_BIN`,
    /// or one of the well-known install locations.
    pub async fn launch() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(30)).await
    }

    /// Launches a headless Chromium browser with a custom per-command timeout.
    pub async fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let mut builder = BrowserConfig::builder().no_sandbox().disable_default_args();

        if let Some(bin) = find_chrome_binary() {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        let config = builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .build()
            .map_err(|e| AppError::RendererError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::RendererError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        Ok(Self {
            browser: Some(browser),
            handler: Some(handler),
            page: None,
            timeout,
        })
    }

    fn page(&self) -> Result<&Page, AppError> {
        self.page
            .as_ref()
            .ok_or_else(|| AppError::RendererError("No page open".into()))
    }

    async fn bounded<T, Fut>(&self, what: &str, fut: Fut) -> Result<T, AppError>
    where
        Fut: Future<Output = Result<T, chromiumoxide::error::CdpError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AppError::RendererError(format!("{what}: {e}"))),
            Err(_) => Err(AppError::RendererError(format!(
                "{what}: timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

impl Renderer for BrowserRenderer {
    async fn open(&mut self, url: &str) -> Result<(), AppError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| AppError::RendererError("Browser already closed".into()))?;

        let page = self
            .bounded(&format!("Failed to navigate to {url}"), browser.new_page(url))
            .await?;

        // <body> present is the minimal signal that the page rendered.
        self.bounded("Page did not render body", page.find_element("body"))
            .await?;

        self.page = Some(page);
        Ok(())
    }

    async fn trigger_lazy_load(&mut self) -> Result<(), AppError> {
        let page = self.page()?;
        self.bounded("Scroll failed", page.evaluate(SCROLL_TO_BOTTOM))
            .await?;
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<String, AppError> {
        let page = self.page()?;
        self.bounded("Failed to read page content", page.content())
            .await
    }

    async fn current_url(&mut self) -> Option<String> {
        let page = self.page.as_ref()?;
        page.url().await.ok().flatten()
    }

    async fn close(&mut self) {
        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!("Failed to close browser cleanly: {e}");
            }
            if let Err(e) = browser.wait().await {
                tracing::warn!("Failed to wait for browser exit: {e}");
            }
            tracing::debug!("Browser closed");
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

/// Tries to locate the real Chrome/Chromium binary.
///
/// The snap wrapper at `/snap/bin/chromium` strips unknown CLI flags and
/// breaks headless mode, so the binary inside the snap is preferred. Returns
/// `None` to let `chromiumoxide` do its own lookup.
fn find_chrome_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    [
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}
