use std::path::{Path, PathBuf};

use crate::models::{ResultSet, StreamKind};

/// Rows for one stream, with the stream's fixed column schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub kind: StreamKind,
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn new(kind: StreamKind, rows: Vec<Vec<String>>) -> Self {
        Self {
            kind,
            columns: columns_for(kind),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column schema per stream.
pub fn columns_for(kind: StreamKind) -> &'static [&'static str] {
    match kind {
        StreamKind::Images => &["src", "alt"],
        StreamKind::Videos => &["video_src"],
        StreamKind::Links => &["url"],
        StreamKind::Texts => &["text"],
    }
}

/// One table per stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTables {
    pub images: Table,
    pub videos: Table,
    pub links: Table,
    pub texts: Table,
}

impl ExportTables {
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        [&self.images, &self.videos, &self.links, &self.texts].into_iter()
    }
}

/// Convert a result set into tabular records. Items without a URL are dropped.
pub fn to_records(set: &ResultSet) -> ExportTables {
    let images = set
        .images
        .iter()
        .filter(|i| !i.url.trim().is_empty())
        .map(|i| vec![i.url.clone(), i.alt_text.clone().unwrap_or_default()])
        .collect();

    let videos = set
        .videos
        .iter()
        .filter(|v| !v.url.trim().is_empty())
        .map(|v| vec![v.url.clone()])
        .collect();

    let links = set
        .links
        .iter()
        .filter_map(|l| l.url.as_deref())
        .filter(|u| !u.trim().is_empty())
        .map(|u| vec![u.to_string()])
        .collect();

    let texts = set.texts.iter().map(|t| vec![t.content.clone()]).collect();

    ExportTables {
        images: Table::new(StreamKind::Images, images),
        videos: Table::new(StreamKind::Videos, videos),
        links: Table::new(StreamKind::Links, links),
        texts: Table::new(StreamKind::Texts, texts),
    }
}

/// Where the harvest writes its artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub output_dir: PathBuf,
    pub images_dir: PathBuf,
}

impl OutputLayout {
    /// Tables in `output_dir`, images in `output_dir/images`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let images_dir = output_dir.join("images");
        Self {
            output_dir,
            images_dir,
        }
    }

    pub fn with_images_dir(mut self, images_dir: impl Into<PathBuf>) -> Self {
        self.images_dir = images_dir.into();
        self
    }

    pub fn table_path(&self, kind: StreamKind) -> PathBuf {
        self.output_dir.join(file_name(kind))
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }
}

fn file_name(kind: StreamKind) -> &'static str {
    match kind {
        StreamKind::Images => "image_data.csv",
        StreamKind::Videos => "video_data.csv",
        StreamKind::Links => "link_data.csv",
        StreamKind::Texts => "text_data.csv",
    }
}
