use tokio_util::sync::CancellationToken;

use crate::classifier::ContentClassifier;
use crate::config::LoaderConfig;
use crate::error::AppError;
use crate::models::ResultSet;
use crate::snapshot::PageSnapshot;
use crate::traits::Renderer;

/// Drives a renderer through repeated trigger → settle → snapshot → classify cycles.
///
/// Every cycle re-classifies the whole page rather than diffing DOMs, because
/// lazy-loading pages may replace content between triggers. The result is
/// the raw concatenation of all cycles; dedup happens in [`crate::aggregate`].
#[derive(Debug, Clone)]
pub struct IncrementalLoader {
    classifier: ContentClassifier,
    config: LoaderConfig,
}

impl IncrementalLoader {
    pub fn new(classifier: ContentClassifier, config: LoaderConfig) -> Self {
        Self { classifier, config }
    }

    /// Load `url` and run all cycles. See [`load_with_cancel`](Self::load_with_cancel).
    pub async fn load<R: Renderer>(
        &self,
        renderer: &mut R,
        url: &str,
    ) -> Result<ResultSet, AppError> {
        self.load_with_cancel(renderer, url, &CancellationToken::new())
            .await
    }

    /// Load `url` and run all cycles, stopping early if `cancel` fires.
    ///
    /// The renderer is closed exactly once before returning, whatever the
    /// outcome. Any renderer failure (including a failed `open`) aborts the
    /// load and discards everything gathered so far.
    pub async fn load_with_cancel<R: Renderer>(
        &self,
        renderer: &mut R,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ResultSet, AppError> {
        let result = self.run_cycles(renderer, url, cancel).await;
        renderer.close().await;

        match &result {
            Ok(set) => tracing::info!(%url, items = set.total(), "Page load complete"),
            Err(AppError::Cancelled) => tracing::warn!(%url, "Page load cancelled"),
            Err(e) => tracing::error!(%url, error = %e, "Page load failed"),
        }
        result
    }

    async fn run_cycles<R: Renderer>(
        &self,
        renderer: &mut R,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ResultSet, AppError> {
        tracing::info!(%url, cycles = self.config.max_cycles, "Opening page");
        renderer.open(url).await?;

        let mut accumulated = ResultSet::new();
        for cycle in 1..=self.config.max_cycles {
            if cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }

            renderer.trigger_lazy_load().await?;

            // Fixed settle time; there is no signal for "lazy content finished".
            tokio::select! {
                _ = cancel.cancelled() => return Err(AppError::Cancelled),
                _ = tokio::time::sleep(self.config.settle) => {}
            }

            let html = renderer.snapshot().await?;
            let base_url = renderer
                .current_url()
                .await
                .unwrap_or_else(|| url.to_string());
            let batch = self.classify_html(&html, &base_url);

            tracing::info!(
                cycle,
                images = batch.images.len(),
                videos = batch.videos.len(),
                links = batch.links.len(),
                texts = batch.texts.len(),
                "Cycle complete"
            );
            accumulated.append(batch);
        }

        Ok(accumulated)
    }

    // The parsed DOM is not `Send`; keep it out of the async state machine.
    fn classify_html(&self, html: &str, base_url: &str) -> ResultSet {
        let snapshot = PageSnapshot::parse(html, Some(base_url));
        self.classifier.classify(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::aggregate;
    use crate::config::{ClassifierConfig, MergeOptions};
    use crate::testutil::MockRenderer;

    fn loader(max_cycles: usize, settle: Duration) -> IncrementalLoader {
        let classifier = ContentClassifier::new(&ClassifierConfig::default()).unwrap();
        IncrementalLoader::new(classifier, LoaderConfig { max_cycles, settle })
    }

    #[tokio::test]
    async fn two_cycles_capture_old_and_new_text_and_close_once() {
        let mut renderer = MockRenderer::new("<p>old text</p>", "<p>new text</p>");
        let result = loader(2, Duration::from_millis(1))
            .load(&mut renderer, "https://example.com")
            .await
            .unwrap();

        let merged = aggregate::finalize(result, MergeOptions::default());
        let texts: Vec<_> = merged.texts.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(texts, ["old text", "new text"]);

        assert_eq!(renderer.triggers(), 2);
        assert_eq!(renderer.snapshots(), 2);
        assert_eq!(renderer.close_count(), 1);
    }

    #[tokio::test]
    async fn raw_result_contains_every_cycle() {
        let mut renderer = MockRenderer::new(r#"<img src="a.png">"#, "<p>more</p>");
        let result = loader(3, Duration::from_millis(1))
            .load(&mut renderer, "https://example.com/")
            .await
            .unwrap();

        // The same image is seen once per cycle before aggregation.
        assert_eq!(result.images.len(), 3);
        assert_eq!(result.images[0].url, "https://example.com/a.png");
        // "more" x1 in cycle 1, x2 in cycle 2, x3 in cycle 3.
        assert_eq!(result.texts.len(), 6);
    }

    #[tokio::test]
    async fn open_failure_fails_fast_and_still_closes() {
        let mut renderer = MockRenderer::new("<p>x</p>", "")
            .with_open_error(AppError::RendererError("net::ERR_NAME_NOT_RESOLVED".into()));

        let err = loader(5, Duration::from_millis(1))
            .load(&mut renderer, "https://nope.invalid")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RendererError(_)));
        assert_eq!(renderer.triggers(), 0);
        assert_eq!(renderer.close_count(), 1);
    }

    #[tokio::test]
    async fn snapshot_failure_aborts_whole_load() {
        let mut renderer = MockRenderer::new("<p>x</p>", "<p>y</p>")
            .with_snapshot_error_on(2, AppError::RendererError("target crashed".into()));

        let err = loader(4, Duration::from_millis(1))
            .load(&mut renderer, "https://example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RendererError(_)));
        assert_eq!(renderer.snapshots(), 2);
        assert_eq!(renderer.close_count(), 1);
    }

    #[tokio::test]
    async fn cancel_during_settle_closes_session() {
        let mut renderer = MockRenderer::new("<p>x</p>", "<p>y</p>");
        let token = CancellationToken::new();
        let loader = loader(5, Duration::from_secs(60));

        let (result, _) = tokio::join!(
            loader.load_with_cancel(&mut renderer, "https://example.com", &token),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                token.cancel();
            }
        );

        assert!(matches!(result, Err(AppError::Cancelled)));
        assert_eq!(renderer.snapshots(), 0);
        assert_eq!(renderer.close_count(), 1);
    }

    #[tokio::test]
    async fn zero_cycles_yields_empty_result() {
        let mut renderer = MockRenderer::new("<p>x</p>", "<p>y</p>");
        let result = loader(0, Duration::from_millis(1))
            .load(&mut renderer, "https://example.com")
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(renderer.opened(), ["https://example.com"]);
        assert_eq!(renderer.close_count(), 1);
    }
}
