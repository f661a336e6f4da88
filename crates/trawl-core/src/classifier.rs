//! Splits a page snapshot into the four content streams.
//!
//! Classification is a pure read of the snapshot: a node missing the
//! attribute a stream needs is skipped for that stream, never reported as an
//! error. Blank URLs and blank text are dropped here, so every downstream
//! stage can assume non-empty values (links excepted, see [`Link`]).

use scraper::{ElementRef, Node, Selector};

use crate::config::ClassifierConfig;
use crate::error::AppError;
use crate::models::{Image, Link, ResultSet, Text, Video};
use crate::snapshot::PageSnapshot;

/// Elements whose text content is never rendered.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements laid out on their own line; `br` included.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "td", "th",
    "tr", "ul",
];

/// Rule-based classifier with precompiled selectors.
#[derive(Debug, Clone)]
pub struct ContentClassifier {
    images: Selector,
    media: Selector,
    sources: Selector,
    links: Selector,
    texts: Selector,
    image_fallback_attrs: Vec<String>,
}

impl ContentClassifier {
    /// Compile the selectors for `config`.
    ///
    /// Fails with [`AppError::ConfigError`] when a configured text tag is not
    /// a valid selector.
    pub fn new(config: &ClassifierConfig) -> Result<Self, AppError> {
        if config.text_tags.is_empty() {
            return Err(AppError::ConfigError(
                "at least one text tag is required".into(),
            ));
        }
        let text_selector = config.text_tags.join(", ");

        Ok(Self {
            images: compile("img")?,
            media: compile("video, iframe")?,
            sources: compile("source")?,
            links: compile("a")?,
            texts: compile(&text_selector)?,
            image_fallback_attrs: config.image_fallback_attrs.clone(),
        })
    }

    /// Classify every relevant node of `snapshot` into a fresh [`ResultSet`].
    pub fn classify(&self, snapshot: &PageSnapshot) -> ResultSet {
        let result = ResultSet {
            images: self.extract_images(snapshot),
            videos: self.extract_videos(snapshot),
            links: self.extract_links(snapshot),
            texts: self.extract_texts(snapshot),
        };
        tracing::debug!(
            images = result.images.len(),
            videos = result.videos.len(),
            links = result.links.len(),
            texts = result.texts.len(),
            "Classified snapshot"
        );
        result
    }

    fn extract_images(&self, snapshot: &PageSnapshot) -> Vec<Image> {
        snapshot
            .select(&self.images)
            .filter_map(|img| {
                let url = self.image_source(snapshot, img)?;
                let alt_text = img
                    .value()
                    .attr("alt")
                    .or_else(|| img.value().attr("aria-label"))
                    .map(str::to_string);
                Some(Image { url, alt_text })
            })
            .collect()
    }

    /// `src`, or the first lazy-load attribute carrying a value.
    fn image_source(&self, snapshot: &PageSnapshot, img: ElementRef<'_>) -> Option<String> {
        let el = img.value();
        el.attr("src")
            .and_then(|v| snapshot.resolve(v))
            .or_else(|| {
                self.image_fallback_attrs
                    .iter()
                    .find_map(|attr| el.attr(attr).and_then(|v| snapshot.resolve(v)))
            })
    }

    fn extract_videos(&self, snapshot: &PageSnapshot) -> Vec<Video> {
        let mut videos = Vec::new();
        for node in snapshot.select(&self.media) {
            if let Some(url) = node.value().attr("src").and_then(|v| snapshot.resolve(v)) {
                videos.push(Video { url });
            }
            if node.value().name() == "video" {
                videos.extend(
                    node.select(&self.sources)
                        .filter_map(|s| s.value().attr("src"))
                        .filter_map(|v| snapshot.resolve(v))
                        .map(|url| Video { url }),
                );
            }
        }
        videos
    }

    fn extract_links(&self, snapshot: &PageSnapshot) -> Vec<Link> {
        snapshot
            .select(&self.links)
            .map(|a| Link {
                url: a.value().attr("href").and_then(|v| snapshot.resolve(v)),
            })
            .collect()
    }

    fn extract_texts(&self, snapshot: &PageSnapshot) -> Vec<Text> {
        snapshot
            .select(&self.texts)
            .map(rendered_text)
            .filter(|t| !t.is_empty())
            .map(|content| Text { content })
            .collect()
    }
}

fn compile(selector: &str) -> Result<Selector, AppError> {
    Selector::parse(selector)
        .map_err(|e| AppError::ConfigError(format!("invalid selector '{selector}': {e}")))
}

/// Visible text of an element with whitespace runs collapsed to one space.
///
/// Block boundaries and `<br>` break words apart the way a browser lays
/// them out on separate lines.
fn rendered_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_visible_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if HIDDEN_TAGS.contains(&name) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child) = ElementRef::wrap(child) {
                    push_visible_text(child, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}
