//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::export::Table;
use crate::traits::{ByteFetcher, ByteResponse, FetchedPage, Fetcher, Renderer, TableWriter};

// ---------------------------------------------------------------------------
// MockRenderer
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RendererState {
    opened: Vec<String>,
    triggers: usize,
    snapshots: usize,
    closes: usize,
}

/// Mock renderer whose page grows by `appended` on every lazy-load trigger.
#[derive(Clone)]
pub struct MockRenderer {
    initial: String,
    appended: String,
    open_error: Arc<Mutex<Option<AppError>>>,
    /// (1-based snapshot number, error to return)
    snapshot_error: Arc<Mutex<Option<(usize, AppError)>>>,
    state: Arc<Mutex<RendererState>>,
}

impl MockRenderer {
    pub fn new(initial: &str, appended: &str) -> Self {
        Self {
            initial: initial.to_string(),
            appended: appended.to_string(),
            open_error: Arc::new(Mutex::new(None)),
            snapshot_error: Arc::new(Mutex::new(None)),
            state: Arc::new(Mutex::new(RendererState::default())),
        }
    }

    pub fn with_open_error(self, error: AppError) -> Self {
        *self.open_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_snapshot_error_on(self, snapshot: usize, error: AppError) -> Self {
        *self.snapshot_error.lock().unwrap() = Some((snapshot, error));
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }

    pub fn triggers(&self) -> usize {
        self.state.lock().unwrap().triggers
    }

    pub fn snapshots(&self) -> usize {
        self.state.lock().unwrap().snapshots
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().closes
    }
}

impl Renderer for MockRenderer {
    async fn open(&mut self, url: &str) -> Result<(), AppError> {
        self.state.lock().unwrap().opened.push(url.to_string());
        match self.open_error.lock().unwrap().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn trigger_lazy_load(&mut self) -> Result<(), AppError> {
        self.state.lock().unwrap().triggers += 1;
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<String, AppError> {
        let (n, triggers) = {
            let mut state = self.state.lock().unwrap();
            state.snapshots += 1;
            (state.snapshots, state.triggers)
        };

        let mut err = self.snapshot_error.lock().unwrap();
        if err.as_ref().is_some_and(|(at, _)| *at == n) {
            if let Some((_, e)) = err.take() {
                return Err(e);
            }
        }

        Ok(format!(
            "<html><body>{}{}</body></html>",
            self.initial,
            self.appended.repeat(triggers)
        ))
    }

    async fn current_url(&mut self) -> Option<String> {
        self.state.lock().unwrap().opened.last().cloned()
    }

    async fn close(&mut self) {
        self.state.lock().unwrap().closes += 1;
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns a configurable response.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns a default HTML string.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    /// Reported final URL; the requested URL when unset.
    final_url: Option<String>,
}

impl MockFetcher {
    pub fn new(html: &str) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Ok(html.to_string())])),
            final_url: None,
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Err(error)])),
            final_url: None,
        }
    }

    /// Pretend the request was redirected to `url`.
    pub fn with_final_url(mut self, url: &str) -> Self {
        self.final_url = Some(url.to_string());
        self
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, AppError> {
        let html = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                "<html><body>default</body></html>".to_string()
            } else {
                responses.remove(0)?
            }
        };
        Ok(FetchedPage {
            url: self.final_url.clone().unwrap_or_else(|| url.to_string()),
            html,
        })
    }
}

// ---------------------------------------------------------------------------
// MockByteFetcher
// ---------------------------------------------------------------------------

/// Canned reply for one URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Status(u16, Vec<u8>),
    Transport(String),
}

#[derive(Default)]
struct InFlight {
    current: usize,
    max: usize,
}

/// Mock byte fetcher keyed by URL. Unknown URLs answer 404.
#[derive(Clone, Default)]
pub struct MockByteFetcher {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    delay: Duration,
    requested: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<Mutex<InFlight>>,
}

impl MockByteFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, response: MockResponse) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
        self
    }

    /// Hold every request for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    /// Highest number of requests observed in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.in_flight.lock().unwrap().max
    }
}

impl ByteFetcher for MockByteFetcher {
    async fn get(&self, url: &str) -> Result<ByteResponse, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            in_flight.current += 1;
            in_flight.max = in_flight.max.max(in_flight.current);
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.lock().unwrap().current -= 1;

        let response = self.responses.lock().unwrap().get(url).cloned();
        match response {
            Some(MockResponse::Status(status, body)) => Ok(ByteResponse { status, body }),
            Some(MockResponse::Transport(msg)) => Err(AppError::TransportError(msg)),
            None => Ok(ByteResponse {
                status: 404,
                body: Vec::new(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MockTableWriter
// ---------------------------------------------------------------------------

/// Mock writer that records every table and its destination.
#[derive(Clone, Default)]
pub struct MockTableWriter {
    pub written: Arc<Mutex<Vec<(PathBuf, Table)>>>,
    error: Arc<Mutex<Option<AppError>>>,
}

impl MockTableWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer that fails on its first write.
    pub fn with_error(error: AppError) -> Self {
        Self {
            written: Arc::new(Mutex::new(Vec::new())),
            error: Arc::new(Mutex::new(Some(error))),
        }
    }
}

impl TableWriter for MockTableWriter {
    fn write(&self, table: &Table, path: &Path) -> Result<(), AppError> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        self.written
            .lock()
            .unwrap()
            .push((path.to_path_buf(), table.clone()));
        Ok(())
    }
}
