use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A parsed, read-only view of a page's DOM at one point in time.
///
/// Holds the parsed tree plus the URL the document was loaded from, so
/// attribute values can be resolved to absolute URLs the way a browser
/// reports them.
pub struct PageSnapshot {
    document: Html,
    base_url: Option<Url>,
}

impl PageSnapshot {
    /// Parse a full HTML document loaded from `page_url`.
    ///
    /// A `<base href>` in the document takes precedence, joined onto
    /// `page_url` when relative. `page_url` is ignored when it does not parse.
    pub fn parse(html: &str, page_url: Option<&str>) -> Self {
        let document = Html::parse_document(html);
        let page_url = page_url.and_then(|u| Url::parse(u).ok());
        let base_url = document_base(&document, page_url.as_ref()).or(page_url);
        Self { document, base_url }
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// All elements matching `selector`, in document order.
    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = ElementRef<'a>> {
        self.document.select(selector)
    }

    /// Resolve an attribute value against the document URL.
    ///
    /// Blank values yield `None`. Values that cannot be joined (no base URL,
    /// or an unparseable reference) are returned trimmed but unchanged.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match &self.base_url {
            Some(base) => Some(
                base.join(raw)
                    .map(String::from)
                    .unwrap_or_else(|_| raw.to_string()),
            ),
            None => Some(raw.to_string()),
        }
    }
}

/// The first `<base href>` of the document, resolved like a browser would.
fn document_base(document: &Html, page_url: Option<&Url>) -> Option<Url> {
    let selector = Selector::parse("base[href]").ok()?;
    let href = document.select(&selector).next()?.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    match page_url {
        Some(page) => page.join(href).ok(),
        None => Url::parse(href).ok(),
    }
}
