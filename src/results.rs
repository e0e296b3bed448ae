use crate::error::{ErrorEntry, ErrorLog};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured description of one scraped page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    /// The requested URL
    pub url: String,

    /// RFC 3339 completion timestamp
    pub scraped_at: String,

    pub meta: Meta,

    /// Sections in document order
    pub sections: Vec<Section>,

    pub interactions: InteractionRecord,

    /// Recoverable failures, in order of occurrence
    pub errors: Vec<ErrorEntry>,
}

/// Page-level metadata read from the document head
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub canonical: Option<String>,
}

/// Classification of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Hero,
    Nav,
    Section,
    Footer,
    Pricing,
    Faq,
    /// Generic fallback when no rule matches
    Unknown,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Hero => "hero",
            SectionType::Nav => "nav",
            SectionType::Section => "section",
            SectionType::Footer => "footer",
            SectionType::Pricing => "pricing",
            SectionType::Faq => "faq",
            SectionType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified, labelled region of a page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// `<type>-<ordinal>`, unique within a result
    pub id: String,

    #[serde(rename = "type")]
    pub kind: SectionType,

    pub label: String,

    /// Absolute URL of the page this section was read from
    pub source_url: String,

    pub content: Content,

    /// Serialized HTML, at most 1000 characters
    pub raw_html: String,

    /// Whether `raw_html` was cut short
    pub truncated: bool,
}

/// Everything extracted from a section's subtree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub headings: Vec<String>,
    pub text: String,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    pub lists: Vec<Vec<String>>,
    /// Each table is a list of rows of cell text
    pub tables: Vec<Vec<Vec<String>>>,
}

impl Content {
    /// No text, links or images
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.links.is_empty() && self.images.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    /// Always absolute
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Always absolute
    pub src: String,
    pub alt: String,
}

/// What the interaction automator did to the rendered page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Human-readable descriptors of successful clicks
    pub clicks: Vec<String>,

    /// Infinite-scroll steps performed
    pub scrolls: usize,

    /// Visited page URLs, origin first
    pub pages: Vec<String>,
}

impl InteractionRecord {
    /// A record for a page that was only visited, never interacted with
    pub fn visited(url: &str) -> Self {
        Self {
            clicks: Vec::new(),
            scrolls: 0,
            pages: vec![url.to_string()],
        }
    }
}

/// Envelope printed by the CLI, matching the service response shape
#[derive(Debug, Serialize)]
pub struct ScrapeResponse<'a> {
    pub result: &'a ScrapeResult,
}

/// Packages the output of every stage into the final result.
///
/// An empty section list always comes with at least one error explaining it.
pub fn assemble(
    url: &str,
    meta: Meta,
    sections: Vec<Section>,
    interactions: InteractionRecord,
    mut errors: ErrorLog,
) -> ScrapeResult {
    if sections.is_empty() && errors.is_empty() {
        errors.push(
            crate::error::Phase::Parse,
            "no sections could be extracted from the document",
        );
    }

    ScrapeResult {
        url: url.to_string(),
        scraped_at: chrono::Utc::now().to_rfc3339(),
        meta,
        sections,
        interactions,
        errors: errors.into_entries(),
    }
}
