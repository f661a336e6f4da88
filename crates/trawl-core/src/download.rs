//! Concurrent, failure-isolated download of image assets.
//!
//! Every input URL produces exactly one [`DownloadOutcome`]; a failing item
//! is recorded and logged, never propagated. The only batch-level error is
//! failing to create the destination folder.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use futures::stream;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::DownloaderConfig;
use crate::error::AppError;
use crate::models::{DownloadOutcome, DownloadStatus, DownloadSummary, compute_hash};
use crate::traits::ByteFetcher;

/// Downloads a batch of URLs into a folder with a bounded number of concurrent fetches.
#[derive(Clone)]
pub struct AssetDownloader<B> {
    fetcher: B,
    concurrency: usize,
}

impl<B: ByteFetcher> AssetDownloader<B> {
    pub fn new(fetcher: B, config: DownloaderConfig) -> Self {
        Self {
            fetcher,
            concurrency: config.concurrency.max(1),
        }
    }

    /// Download every URL into `destination`. See [`download_all_with_cancel`](Self::download_all_with_cancel).
    pub async fn download_all(
        &self,
        urls: &[String],
        destination: &Path,
    ) -> Result<Vec<DownloadOutcome>, AppError> {
        self.download_all_with_cancel(urls, destination, &CancellationToken::new())
            .await
    }

    /// Download every URL into `destination`, creating it first.
    ///
    /// Outcomes are returned in input order. Once `cancel` fires no new fetch
    /// is started; items not yet dispatched are reported as skipped while
    /// in-flight fetches run to completion.
    pub async fn download_all_with_cancel(
        &self,
        urls: &[String],
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<DownloadOutcome>, AppError> {
        tokio::fs::create_dir_all(destination).await.map_err(|e| {
            AppError::FilesystemError(format!(
                "Failed to create destination {}: {e}",
                destination.display()
            ))
        })?;

        tracing::info!(
            count = urls.len(),
            dest = %destination.display(),
            concurrency = self.concurrency,
            "Downloading images"
        );

        let mut indexed: Vec<(usize, DownloadOutcome)> = stream::iter(urls.iter().enumerate())
            .map(|(idx, url)| async move {
                if cancel.is_cancelled() {
                    let skipped = DownloadStatus::Skipped("cancelled".into());
                    return (idx, DownloadOutcome::failed(url.as_str(), skipped));
                }
                (idx, self.download_one(url, destination).await)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        indexed.sort_by_key(|(idx, _)| *idx);
        let outcomes: Vec<DownloadOutcome> = indexed.into_iter().map(|(_, o)| o).collect();

        let summary = DownloadSummary::from_outcomes(&outcomes);
        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed(),
            skipped = summary.skipped,
            "Image downloads finished"
        );
        Ok(outcomes)
    }

    async fn download_one(&self, url: &str, destination: &Path) -> DownloadOutcome {
        if url.trim().is_empty() {
            return DownloadOutcome::failed(url, DownloadStatus::Skipped("blank url".into()));
        }

        let response = match self.fetcher.get(url).await {
            Ok(response) => response,
            Err(e) => {
                let message = match e {
                    AppError::TransportError(msg) => msg,
                    other => other.to_string(),
                };
                tracing::warn!(%url, error = %message, "Image download failed");
                return DownloadOutcome::failed(url, DownloadStatus::TransportError(message));
            }
        };

        if response.status != 200 {
            tracing::warn!(%url, status = response.status, "Image download failed");
            return DownloadOutcome::failed(url, DownloadStatus::HttpError(response.status));
        }

        let filename = derive_filename(url);
        match write_replacing(destination, &filename, &response.body).await {
            Ok(path) => {
                tracing::debug!(
                    %url,
                    path = %path.display(),
                    bytes = response.body.len(),
                    "Saved image"
                );
                DownloadOutcome::success(url, path)
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "Failed to save image");
                DownloadOutcome::failed(url, DownloadStatus::FilesystemError(e.to_string()))
            }
        }
    }
}

/// Local filename for a URL: the last path segment without query or fragment.
///
/// Falls back to `image-<hash>` when the URL has no usable last segment
/// (e.g. `https://host/`).
pub fn derive_filename(url: &str) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let segment = segment.trim();
    if is_safe_filename(segment) {
        segment.to_string()
    } else {
        format!("image-{}", &compute_hash(url)[..16])
    }
}

fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':', '\0'])
}

/// Write `bytes` to `dir/filename`, replacing any existing file.
///
/// Bytes go to a uniquely named `.part` sibling first and are renamed into
/// place, so an interrupted write never leaves a truncated file under the
/// final name.
async fn write_replacing(dir: &Path, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let target = dir.join(filename);
    let partial = dir.join(format!(".{filename}.{}.part", uuid::Uuid::new_v4().simple()));

    if let Err(e) = tokio::fs::write(&partial, bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }
    if let Err(e) = tokio::fs::rename(&partial, &target).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }
    Ok(target)
}
