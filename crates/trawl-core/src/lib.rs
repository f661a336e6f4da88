pub mod aggregate;
pub mod classifier;
pub mod config;
pub mod download;
pub mod error;
pub mod export;
pub mod harvest;
pub mod loader;
pub mod models;
pub mod snapshot;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;

pub use classifier::ContentClassifier;
pub use config::HarvestConfig;
pub use download::{AssetDownloader, derive_filename};
pub use error::AppError;
pub use export::{ExportTables, OutputLayout, Table, to_records};
pub use harvest::{HarvestReport, HarvestService};
pub use loader::IncrementalLoader;
pub use models::{DownloadOutcome, DownloadStatus, ResultSet, compute_hash};
pub use snapshot::PageSnapshot;
pub use traits::{ByteFetcher, ByteResponse, FetchedPage, Fetcher, Renderer, TableWriter};
