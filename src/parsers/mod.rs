pub mod html;
pub mod text;

#[cfg(test)]
mod tests;

use scraper::{ElementRef, Html};
use url::Url;

/// A parsed, queryable HTML document together with the URL it was read from.
///
/// The tree is a working copy: the noise filter removes subtrees from it,
/// while the source string it was parsed from is left untouched.
pub struct Document {
    url: Url,
    html: Html,
}

impl Document {
    /// Parse an HTML string. Parsing is lenient and never fails; broken
    /// markup yields whatever tree the HTML5 algorithm recovers.
    pub fn parse(source: &str, url: Url) -> Self {
        ::log::trace!("Parsing {} bytes of HTML from {}", source.len(), url);
        Self {
            url,
            html: Html::parse_document(source),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub(crate) fn html_mut(&mut self) -> &mut Html {
        &mut self.html
    }

    /// The `<body>` element, if the document has one
    pub fn body(&self) -> Option<ElementRef<'_>> {
        self.html
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "body")
    }

    /// Visible text of the body (empty when there is no body)
    pub fn body_text(&self) -> String {
        self.body().map(html::visible_text).unwrap_or_default()
    }
}

/// HTML captured from one page, with the URL it was captured at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSource {
    pub url: Url,
    pub html: String,
}

impl PageSource {
    pub fn new(url: Url, html: String) -> Self {
        Self { url, html }
    }

    pub fn parse(&self) -> Document {
        Document::parse(&self.html, self.url.clone())
    }
}
