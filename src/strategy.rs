use crate::config::{ScraperConfig, SufficiencyConfig};
use crate::error::{ErrorLog, ExtractError, Phase};
use crate::fetchers::render::render;
use crate::fetchers::{Browser, Fetcher};
use crate::filter::NoiseFilter;
use crate::parsers::html::{self, visible_text};
use crate::parsers::{Document, PageSource};
use crate::results::InteractionRecord;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Containers client-side frameworks render into
const SCRIPT_ROOTS: &[&str] = &[
    "#root",
    "#__next",
    "#app",
    "#___gatsby",
    "#__nuxt",
    "[data-reactroot]",
    "[ng-app]",
    "[data-v-app]",
];

const LOADING_PLACEHOLDERS: &[&str] = &[
    r#"[aria-busy="true"]"#,
    r#"[class*="skeleton"]"#,
    ".loading-placeholder",
    "#loading",
    ".spinner",
];

const LANDMARK_TAGS: &[&str] = &[
    "header", "nav", "main", "section", "article", "aside", "footer", "h1", "h2", "h3", "table",
];

const LANDMARK_ROLES: &[&str] = &[
    "banner",
    "navigation",
    "main",
    "region",
    "complementary",
    "contentinfo",
];

/// How the final document was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Static,
    Rendered,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Static => write!(f, "static"),
            Strategy::Rendered => write!(f, "rendered"),
        }
    }
}

/// Why static content was judged insufficient
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insufficiency {
    MissingBody,
    TooLittleText { length: usize, minimum: usize },
    TooFewLandmarks { count: usize, minimum: usize },
    EmptyScriptRoot { selector: &'static str },
    LoadingPlaceholder { selector: &'static str },
}

impl fmt::Display for Insufficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insufficiency::MissingBody => write!(f, "document has no body"),
            Insufficiency::TooLittleText { length, minimum } => {
                write!(f, "{} characters of text, {} required", length, minimum)
            }
            Insufficiency::TooFewLandmarks { count, minimum } => {
                write!(f, "{} landmarks, {} required", count, minimum)
            }
            Insufficiency::EmptyScriptRoot { selector } => {
                write!(f, "script root {} is empty", selector)
            }
            Insufficiency::LoadingPlaceholder { selector } => {
                write!(f, "loading placeholder {} present", selector)
            }
        }
    }
}

/// Outcome of the fetch sufficiency heuristic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub text_length: usize,
    pub landmarks: usize,
    pub reasons: Vec<Insufficiency>,
}

impl Assessment {
    pub fn is_sufficient(&self) -> bool {
        self.reasons.is_empty()
    }
}

/// Decide whether a statically fetched document is good enough to extract from
pub fn assess(doc: &Document, thresholds: &SufficiencyConfig) -> Result<Assessment, ExtractError> {
    let Some(body) = doc.body() else {
        return Ok(Assessment {
            text_length: 0,
            landmarks: 0,
            reasons: vec![Insufficiency::MissingBody],
        });
    };

    let mut reasons = Vec::new();

    // a headed paragraph is a complete page however short it is
    let text_length = visible_text(body).chars().count();
    if text_length < thresholds.min_text_length && !has_headed_paragraph(body) {
        reasons.push(Insufficiency::TooLittleText {
            length: text_length,
            minimum: thresholds.min_text_length,
        });
    }

    let landmarks = count_landmarks(body, thresholds.min_list_items);
    if landmarks < thresholds.min_landmarks {
        reasons.push(Insufficiency::TooFewLandmarks {
            count: landmarks,
            minimum: thresholds.min_landmarks,
        });
    }

    for css in SCRIPT_ROOTS {
        if let Some(root) = html::first(doc.html(), css)? {
            if visible_text(root).chars().count() < thresholds.min_root_text {
                reasons.push(Insufficiency::EmptyScriptRoot { selector: *css });
            }
        }
    }

    for css in LOADING_PLACEHOLDERS {
        if html::first(doc.html(), css)?.is_some() {
            reasons.push(Insufficiency::LoadingPlaceholder { selector: *css });
        }
    }

    Ok(Assessment {
        text_length,
        landmarks,
        reasons,
    })
}

fn has_headed_paragraph(body: ElementRef<'_>) -> bool {
    let mut heading = false;
    let mut paragraph = false;
    for element in body.descendants().filter_map(ElementRef::wrap) {
        match element.value().name() {
            "h1" | "h2" | "h3" if !heading => heading = !visible_text(element).is_empty(),
            "p" if !paragraph => paragraph = !visible_text(element).is_empty(),
            _ => {}
        }
        if heading && paragraph {
            return true;
        }
    }
    false
}

fn count_landmarks(body: ElementRef<'_>, min_list_items: usize) -> usize {
    body.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| {
            let value = e.value();
            let name = value.name();
            if LANDMARK_TAGS.contains(&name) {
                return true;
            }
            if value.attr("role").is_some_and(|r| LANDMARK_ROLES.contains(&r.trim())) {
                return true;
            }
            matches!(name, "ul" | "ol")
                && e
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| c.value().name() == "li")
                    .count()
                    >= min_list_items
        })
        .count()
}

/// Documents obtained for one scrape, with how they were obtained
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Origin page first; empty when no document could be obtained at all
    pub pages: Vec<PageSource>,
    pub strategy: Strategy,
    pub interactions: InteractionRecord,
}

/// Picks between static and rendered fetching
pub struct StrategySelector<'a> {
    pub config: &'a ScraperConfig,
    pub fetcher: &'a dyn Fetcher,
    pub browser: Option<&'a dyn Browser>,
    pub noise: &'a NoiseFilter,
}

impl StrategySelector<'_> {
    /// Static fetch first; rendered fetch when that fails or looks insufficient.
    /// Never fails: problems are logged and the best available pages returned.
    pub async fn select(&self, url: &Url, errors: &mut ErrorLog) -> Fetched {
        let fetch_timeout = Duration::from_secs(self.config.timeouts.fetch_secs);
        let static_page = match tokio::time::timeout(fetch_timeout, self.fetcher.fetch(url)).await {
            Ok(Ok(page)) => Some(page),
            Ok(Err(e)) => {
                errors.push(Phase::Fetch, format!("static fetch of {} failed: {}", url, e));
                None
            }
            Err(_) => {
                errors.push(
                    Phase::Fetch,
                    format!(
                        "static fetch of {} timed out after {}s",
                        url, self.config.timeouts.fetch_secs
                    ),
                );
                None
            }
        };

        if let Some(page) = &static_page {
            match self.is_sufficient(page) {
                Ok(true) => {
                    ::log::info!("Static content of {} is sufficient", page.url);
                    return Self::static_result(page.clone());
                }
                Ok(false) => {}
                Err(e) => errors.push(
                    Phase::Parse,
                    format!("could not assess static content of {}: {}", page.url, e),
                ),
            }
        }

        let browser = match self.browser {
            Some(browser) if self.config.render => browser,
            _ => {
                ::log::info!("Rendering disabled; using static content of {}", url);
                return Self::fallback(static_page, url);
            }
        };

        match render(browser, url, self.config, self.noise, errors).await {
            Ok(rendered) => {
                ::log::info!("Using rendered content of {}", url);
                Fetched {
                    pages: rendered.pages,
                    strategy: Strategy::Rendered,
                    interactions: rendered.interactions,
                }
            }
            Err(e) => {
                errors.push(Phase::Render, format!("rendered fetch of {} failed: {}", url, e));
                Self::fallback(static_page, url)
            }
        }
    }

    /// Parse, strip noise and run the heuristic without holding the tree across an await
    fn is_sufficient(&self, page: &PageSource) -> Result<bool, ExtractError> {
        let mut doc = page.parse();
        self.noise.apply(&mut doc);
        let assessment = assess(&doc, &self.config.sufficiency)?;
        if !assessment.is_sufficient() {
            let reasons: Vec<String> = assessment.reasons.iter().map(|r| r.to_string()).collect();
            ::log::info!(
                "Static content of {} is insufficient: {}",
                page.url,
                reasons.join("; ")
            );
        }
        Ok(assessment.is_sufficient())
    }

    fn static_result(page: PageSource) -> Fetched {
        let interactions = InteractionRecord::visited(page.url.as_str());
        Fetched {
            pages: vec![page],
            strategy: Strategy::Static,
            interactions,
        }
    }

    fn fallback(static_page: Option<PageSource>, url: &Url) -> Fetched {
        match static_page {
            Some(page) => Self::static_result(page),
            None => Fetched {
                pages: Vec::new(),
                strategy: Strategy::Static,
                interactions: InteractionRecord::visited(url.as_str()),
            },
        }
    }
}
