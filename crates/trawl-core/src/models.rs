use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// An `<img>` found on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Image {
    pub url: String,
    pub alt_text: Option<String>,
}

/// A playable source: `<video src>`, a nested `<source src>`, or an `<iframe src>` embed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Video {
    pub url: String,
}

/// An anchor. `url` is `None` when the anchor has no usable `href`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Link {
    pub url: Option<String>,
}

/// Rendered text of a text-bearing element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Text {
    pub content: String,
}

/// The four content streams a page is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Images,
    Videos,
    Links,
    Texts,
}

impl StreamKind {
    pub const ALL: [StreamKind; 4] = [
        StreamKind::Images,
        StreamKind::Videos,
        StreamKind::Links,
        StreamKind::Texts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Images => "images",
            StreamKind::Videos => "videos",
            StreamKind::Links => "links",
            StreamKind::Texts => "texts",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Four ordered streams of extracted content, accumulated over one or more passes.
///
/// Each stream holds one item kind, so the stream a value sits in is its tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    pub images: Vec<Image>,
    pub videos: Vec<Video>,
    pub links: Vec<Link>,
    pub texts: Vec<Text>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every stream of `other` after the corresponding stream of `self`.
    pub fn append(&mut self, mut other: ResultSet) {
        self.images.append(&mut other.images);
        self.videos.append(&mut other.videos);
        self.links.append(&mut other.links);
        self.texts.append(&mut other.texts);
    }

    pub fn len(&self, kind: StreamKind) -> usize {
        match kind {
            StreamKind::Images => self.images.len(),
            StreamKind::Videos => self.videos.len(),
            StreamKind::Links => self.links.len(),
            StreamKind::Texts => self.texts.len(),
        }
    }

    pub fn total(&self) -> usize {
        StreamKind::ALL.iter().map(|k| self.len(*k)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Image URLs in stream order, skipping blanks.
    pub fn image_urls(&self) -> Vec<String> {
        self.images
            .iter()
            .filter(|i| !i.url.trim().is_empty())
            .map(|i| i.url.clone())
            .collect()
    }
}

/// Result of a single download attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DownloadStatus {
    Success,
    HttpError(u16),
    TransportError(String),
    FilesystemError(String),
    /// Never dispatched: blank URL or batch cancelled before this item started.
    Skipped(String),
}

impl DownloadStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadStatus::Success)
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadStatus::Success => write!(f, "success"),
            DownloadStatus::HttpError(code) => write!(f, "HTTP {code}"),
            DownloadStatus::TransportError(msg) => write!(f, "transport error: {msg}"),
            DownloadStatus::FilesystemError(msg) => write!(f, "filesystem error: {msg}"),
            DownloadStatus::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// Per-URL record produced by the asset downloader. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadOutcome {
    pub url: String,
    #[serde(flatten)]
    pub status: DownloadStatus,
    pub local_path: Option<PathBuf>,
}

impl DownloadOutcome {
    pub fn success(url: impl Into<String>, local_path: PathBuf) -> Self {
        Self {
            url: url.into(),
            status: DownloadStatus::Success,
            local_path: Some(local_path),
        }
    }

    pub fn failed(url: impl Into<String>, status: DownloadStatus) -> Self {
        Self {
            url: url.into(),
            status,
            local_path: None,
        }
    }
}

/// Counts per outcome class for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub succeeded: usize,
    pub http_errors: usize,
    pub transport_errors: usize,
    pub filesystem_errors: usize,
    pub skipped: usize,
}

impl DownloadSummary {
    pub fn from_outcomes(outcomes: &[DownloadOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome.status {
                DownloadStatus::Success => summary.succeeded += 1,
                DownloadStatus::HttpError(_) => summary.http_errors += 1,
                DownloadStatus::TransportError(_) => summary.transport_errors += 1,
                DownloadStatus::FilesystemError(_) => summary.filesystem_errors += 1,
                DownloadStatus::Skipped(_) => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn failed(&self) -> usize {
        self.http_errors + self.transport_errors + self.filesystem_errors
    }
}

/// Compute a SHA-256 hash of a string, returned as 64-char hex.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
