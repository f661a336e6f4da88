use std::path::PathBuf;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::aggregate;
use crate::classifier::ContentClassifier;
use crate::config::{HarvestConfig, MergeOptions};
use crate::download::AssetDownloader;
use crate::error::AppError;
use crate::export::{OutputLayout, to_records};
use crate::loader::IncrementalLoader;
use crate::models::{DownloadOutcome, DownloadSummary, ResultSet, StreamKind};
use crate::snapshot::PageSnapshot;
use crate::traits::{ByteFetcher, Fetcher, Renderer, TableWriter};

/// What a finished harvest produced on disk.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    pub url: String,
    pub images: usize,
    pub videos: usize,
    pub links: usize,
    pub texts: usize,
    pub tables: Vec<PathBuf>,
    pub downloads: DownloadSummary,
    pub outcomes: Vec<DownloadOutcome>,
}

/// Orchestrates the full pipeline: load → classify → merge → export → download.
///
/// Generic over the byte fetcher and table writer so the whole flow runs
/// against mocks in tests. Page sources (renderer or static fetcher) are
/// passed per call, since a renderer session lives for one load only.
pub struct HarvestService<B, W>
where
    B: ByteFetcher,
    W: TableWriter,
{
    classifier: ContentClassifier,
    loader: IncrementalLoader,
    merge: MergeOptions,
    downloader: AssetDownloader<B>,
    writer: W,
}

impl<B, W> HarvestService<B, W>
where
    B: ByteFetcher,
    W: TableWriter,
{
    pub fn new(config: &HarvestConfig, byte_fetcher: B, writer: W) -> Result<Self, AppError> {
        config.validate()?;
        let classifier = ContentClassifier::new(&config.classifier)?;
        Ok(Self {
            loader: IncrementalLoader::new(classifier.clone(), config.loader),
            classifier,
            merge: config.merge,
            downloader: AssetDownloader::new(byte_fetcher, config.downloader),
            writer,
        })
    }

    /// Scroll-load `url` in `renderer` and return the merged streams.
    pub async fn collect_rendered<R: Renderer>(
        &self,
        renderer: &mut R,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ResultSet, AppError> {
        let raw = self.loader.load_with_cancel(renderer, url, cancel).await?;
        Ok(aggregate::finalize(raw, self.merge))
    }

    /// Fetch `url` without a browser, classify it once, and return the merged streams.
    pub async fn collect_static<F: Fetcher>(
        &self,
        fetcher: &F,
        url: &str,
    ) -> Result<ResultSet, AppError> {
        tracing::info!("Fetching {}", url);
        let page = fetcher.fetch(url).await?;
        tracing::info!(final_url = %page.url, "Fetched {} bytes of HTML", page.html.len());

        let raw = {
            let snapshot = PageSnapshot::parse(&page.html, Some(&page.url));
            self.classifier.classify(&snapshot)
        };
        Ok(aggregate::finalize(raw, self.merge))
    }

    /// Write one table per stream into the layout's output directory.
    pub fn export(&self, set: &ResultSet, layout: &OutputLayout) -> Result<Vec<PathBuf>, AppError> {
        std::fs::create_dir_all(&layout.output_dir).map_err(|e| {
            AppError::FilesystemError(format!(
                "Failed to create output directory {}: {e}",
                layout.output_dir.display()
            ))
        })?;

        let tables = to_records(set);
        let mut written = Vec::with_capacity(4);
        for table in tables.iter() {
            let path = layout.table_path(table.kind);
            self.writer.write(table, &path)?;
            tracing::info!(
                stream = %table.kind,
                rows = table.len(),
                path = %path.display(),
                "Data saved"
            );
            written.push(path);
        }
        Ok(written)
    }

    /// Download the image stream into the layout's image folder.
    pub async fn download_images(
        &self,
        set: &ResultSet,
        layout: &OutputLayout,
        cancel: &CancellationToken,
    ) -> Result<Vec<DownloadOutcome>, AppError> {
        let urls = set.image_urls();
        self.downloader
            .download_all_with_cancel(&urls, layout.images_dir(), cancel)
            .await
    }

    /// Export every stream, then download images.
    pub async fn materialize(
        &self,
        url: &str,
        set: &ResultSet,
        layout: &OutputLayout,
        cancel: &CancellationToken,
    ) -> Result<HarvestReport, AppError> {
        let tables = self.export(set, layout)?;
        let outcomes = self.download_images(set, layout, cancel).await?;

        Ok(HarvestReport {
            url: url.to_string(),
            images: set.len(StreamKind::Images),
            videos: set.len(StreamKind::Videos),
            links: set.len(StreamKind::Links),
            texts: set.len(StreamKind::Texts),
            tables,
            downloads: DownloadSummary::from_outcomes(&outcomes),
            outcomes,
        })
    }
}
