pub mod csv_writer;
pub mod fetcher;

#[cfg(feature = "browser")]
pub mod browser_renderer;

pub use csv_writer::CsvTableWriter;
pub use fetcher::{ReqwestByteFetcher, ReqwestFetcher};

#[cfg(feature = "browser")]
pub use browser_renderer::BrowserRenderer;
