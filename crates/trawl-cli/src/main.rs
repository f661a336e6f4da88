use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use trawl_client::{CsvTableWriter, ReqwestByteFetcher, ReqwestFetcher};
use trawl_core::config::split_list;
use trawl_core::{HarvestConfig, HarvestService, OutputLayout, ResultSet};

#[derive(Parser)]
#[command(name = "trawl", version, about = "Harvest images, videos, links and text from web pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the page in headless Chromium, scrolling to load lazy content
    Render {
        /// Target URL
        #[arg(short, long)]
        url: String,

        /// Number of scroll/snapshot cycles (default 5)
        #[arg(short, long, env = "TRAWL_MAX_CYCLES")]
        cycles: Option<usize>,

        /// Milliseconds to wait after each scroll (default 3000)
        #[arg(long, env = "TRAWL_SETTLE_MS")]
        settle_ms: Option<u64>,

        /// Per-command browser timeout in seconds
        #[arg(long, env = "TRAWL_BROWSER_TIMEOUT", default_value_t = 30)]
        browser_timeout: u64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Fetch the page over plain HTTP without running scripts
    Fetch {
        /// Target URL
        #[arg(short, long)]
        url: String,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Directory for the CSV tables
    #[arg(short, long, env = "TRAWL_OUTPUT_DIR", default_value = ".")]
    out: PathBuf,

    /// Directory for downloaded images (defaults to <out>/images)
    #[arg(long, env = "TRAWL_IMAGES_DIR")]
    images_dir: Option<PathBuf>,

    /// Maximum concurrent image downloads (default 8)
    #[arg(long, env = "TRAWL_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Keep only the first occurrence of each image URL
    #[arg(long, env = "TRAWL_UNIQUE_IMAGES", default_value_t = false)]
    unique_images: bool,

    /// Comma-separated tags feeding the text stream
    #[arg(long, env = "TRAWL_TEXT_TAGS")]
    text_tags: Option<String>,

    /// Comma-separated attributes tried when <img src> is empty (default data-src)
    #[arg(long, env = "TRAWL_IMAGE_FALLBACK_ATTRS")]
    image_fallback_attrs: Option<String>,

    /// Write the tables but do not download images
    #[arg(long, default_value_t = false)]
    no_download: bool,
}

impl OutputArgs {
    fn layout(&self) -> OutputLayout {
        let layout = OutputLayout::new(&self.out);
        match &self.images_dir {
            Some(dir) => layout.with_images_dir(dir),
            None => layout,
        }
    }

    fn apply(&self, config: &mut HarvestConfig) {
        if let Some(concurrency) = self.concurrency {
            config.downloader.concurrency = concurrency;
        }
        if self.unique_images {
            config.merge.unique_images = true;
        }
        if let Some(tags) = &self.text_tags {
            config.classifier.text_tags = split_list(tags);
        }
        if let Some(attrs) = &self.image_fallback_attrs {
            config.classifier.image_fallback_attrs = split_list(attrs);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("trawl=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    // Flags override the environment; the merged result is validated when the service is built.
    let mut config = HarvestConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping");
            on_signal.cancel();
        }
    });

    match cli.command {
        Commands::Render {
            url,
            cycles,
            settle_ms,
            browser_timeout,
            output,
        } => {
            if let Some(cycles) = cycles {
                config.loader.max_cycles = cycles;
            }
            if let Some(ms) = settle_ms {
                config.loader.settle = Duration::from_millis(ms);
            }
            output.apply(&mut config);

            let svc = build_service(&config)?;
            let set = collect_rendered(&svc, &url, Duration::from_secs(browser_timeout), &cancel)
                .await?;
            finish(&svc, &url, &set, &output, &cancel).await?;
        }
        Commands::Fetch { url, output } => {
            output.apply(&mut config);

            let svc = build_service(&config)?;
            let fetcher = ReqwestFetcher::new().context("Failed to create HTTP client")?;
            let set = svc
                .collect_static(&fetcher, &url)
                .await
                .map_err(|e| anyhow::anyhow!(e))
                .with_context(|| format!("Failed to fetch {url}"))?;
            finish(&svc, &url, &set, &output, &cancel).await?;
        }
    }

    Ok(())
}

type Service = HarvestService<ReqwestByteFetcher, CsvTableWriter>;

fn build_service(config: &HarvestConfig) -> Result<Service> {
    let bytes = ReqwestByteFetcher::new().context("Failed to create HTTP client")?;
    HarvestService::new(config, bytes, CsvTableWriter::new()).map_err(|e| anyhow::anyhow!(e))
}

#[cfg(feature = "browser")]
async fn collect_rendered(
    svc: &Service,
    url: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<ResultSet> {
    use trawl_client::BrowserRenderer;

    let mut renderer = BrowserRenderer::with_timeout(timeout)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to start headless browser")?;

    svc.collect_rendered(&mut renderer, url, cancel)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("Failed to load {url}"))
}

#[cfg(not(feature = "browser"))]
async fn collect_rendered(
    _svc: &Service,
    _url: &str,
    _timeout: Duration,
    _cancel: &CancellationToken,
) -> Result<ResultSet> {
    anyhow::bail!("trawl was built without the `browser` feature; use `trawl fetch` instead")
}

/// Export the tables, download images, and print the report as JSON.
async fn finish(
    svc: &Service,
    url: &str,
    set: &ResultSet,
    output: &OutputArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let layout = output.layout();

    if output.no_download {
        let tables = svc
            .export(set, &layout)
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to write tables")?;
        println!("{}", serde_json::to_string_pretty(&tables)?);
        return Ok(());
    }

    let report = svc
        .materialize(url, set, &layout, cancel)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to save results")?;

    for outcome in report.outcomes.iter().filter(|o| !o.status.is_success()) {
        eprintln!("Image not saved from {}: {}", outcome.url, outcome.status);
    }
    tracing::info!(
        images = report.images,
        videos = report.videos,
        links = report.links,
        texts = report.texts,
        downloaded = report.downloads.succeeded,
        failed = report.downloads.failed(),
        "Harvest complete"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
