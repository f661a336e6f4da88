use std::future::Future;
use std::path::Path;

use crate::error::AppError;
use crate::export::Table;

/// A page fetched without a browser.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects, the base for relative references.
    pub url: String,
    pub html: String,
}

/// Fetches raw HTML content from a URL without executing scripts.
pub trait Fetcher: Send + Sync + Clone {
    /// Fails with [`AppError::FetchError`] on non-2xx responses or transport failures.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, AppError>> + Send;
}

/// A stateful page-rendering session (e.g. a headless browser tab).
///
/// Driven through `&mut self` so a single session can never be used by two
/// loads at once. `close` must be idempotent and safe to call after any
/// failure, including a failed `open`.
pub trait Renderer: Send {
    /// Navigate to `url`. Fails with [`AppError::RendererError`].
    fn open(&mut self, url: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Ask the page to load more content (scroll to the bottom).
    fn trigger_lazy_load(&mut self) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Serialize the current DOM as HTML.
    fn snapshot(&mut self) -> impl Future<Output = Result<String, AppError>> + Send;

    /// URL of the document currently loaded, used as the base for relative URLs.
    fn current_url(&mut self) -> impl Future<Output = Option<String>> + Send {
        async { None }
    }

    /// Release the session.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Raw HTTP response returned by a [`ByteFetcher`].
#[derive(Debug, Clone)]
pub struct ByteResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Downloads arbitrary byte payloads by URL.
pub trait ByteFetcher: Send + Sync + Clone + 'static {
    /// Returns the response for any HTTP status; fails with
    /// [`AppError::TransportError`] only on connection-level failures.
    fn get(&self, url: &str) -> impl Future<Output = Result<ByteResponse, AppError>> + Send;
}

/// Serializes a [`Table`] to a delimited file, overwriting any existing file.
pub trait TableWriter: Send + Sync + Clone {
    fn write(&self, table: &Table, path: &Path) -> Result<(), AppError>;
}
