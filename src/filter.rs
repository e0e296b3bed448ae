use crate::error::ExtractError;
use crate::parsers::Document;
use crate::parsers::html::selector;
use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Selector};

/// Structural signatures of consent banners, dialogs and popups
pub const DEFAULT_NOISE_SELECTORS: &[&str] = &[
    r#"[role="dialog"]"#,
    r#"[role="alertdialog"]"#,
    r#"[aria-modal="true"]"#,
    "dialog",
    "#onetrust-banner-sdk",
    "#onetrust-consent-sdk",
    "#CybotCookiebotDialog",
    ".newsletter-popup",
    r#"[id*="cookie"]"#,
    r#"[class*="cookie"]"#,
    r#"[id*="consent"]"#,
    r#"[class*="consent"]"#,
    r#"[id*="modal"]"#,
    r#"[class*="modal"]"#,
    r#"[id*="popup"]"#,
    r#"[class*="popup"]"#,
];

/// Class/id naming conventions, matched case-insensitively.
/// Kept compatible with JavaScript regex syntax so the browser can reuse it.
pub const NOISE_NAMING_PATTERN: &str = r"(^|[\s_-])(gdpr|interstitial|newsletter[-_]?(signup|popup|modal|overlay)|(cookie|consent|promo)[-_]?(banner|bar|notice|wall)|subscribe[-_]?(popup|modal))([\s_-]|$)";

/// Elements that are never removed, whatever their attributes say
const PROTECTED_TAGS: &[&str] = &["html", "body", "main"];

/// Removes known non-content overlays from a document before extraction
#[derive(Debug)]
pub struct NoiseFilter {
    selectors: Vec<(String, Selector)>,
    naming: Regex,
    fixed_position: Regex,
    full_viewport: Regex,
}

impl NoiseFilter {
    /// Build the filter from the default rules plus extra CSS selectors
    pub fn new(extra_selectors: &[String]) -> Result<Self, ExtractError> {
        let mut selectors = Vec::with_capacity(DEFAULT_NOISE_SELECTORS.len() + extra_selectors.len());
        for css in DEFAULT_NOISE_SELECTORS
            .iter()
            .map(|s| s.to_string())
            .chain(extra_selectors.iter().cloned())
        {
            let compiled = selector(&css)?;
            selectors.push((css, compiled));
        }

        Ok(Self {
            selectors,
            naming: case_insensitive(NOISE_NAMING_PATTERN)?,
            fixed_position: case_insensitive(r"position\s*:\s*fixed")?,
            full_viewport: case_insensitive(
                r"inset\s*:\s*0|height\s*:\s*100(%|vh)|(^|;)\s*top\s*:\s*0[^;]*;.*bottom\s*:\s*0",
            )?,
        })
    }

    /// The CSS selectors this filter removes
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().map(|(css, _)| css.as_str())
    }

    /// The class/id naming pattern, for in-page removal
    pub fn naming_pattern(&self) -> &str {
        self.naming.as_str()
    }

    /// Whether a single element matches any noise rule
    pub fn is_noise(&self, element: ElementRef<'_>) -> bool {
        let value = element.value();
        if PROTECTED_TAGS.contains(&value.name()) {
            return false;
        }

        if self.selectors.iter().any(|(_, sel)| sel.matches(&element)) {
            return true;
        }

        let naming = format!(
            "{} {}",
            value.id().unwrap_or_default(),
            value.attr("class").unwrap_or_default()
        );
        if self.naming.is_match(naming.trim()) {
            return true;
        }

        value.attr("style").is_some_and(|style| {
            self.fixed_position.is_match(style) && self.full_viewport.is_match(style)
        })
    }

    /// Remove every matching subtree from the document's working tree.
    /// Returns the number of removed subtrees; an unmatched rule set is a no-op.
    pub fn apply(&self, doc: &mut Document) -> usize {
        let doomed: Vec<_> = doc
            .html()
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|e| self.is_noise(*e))
            .filter(|e| {
                !e.ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|ancestor| self.is_noise(ancestor))
            })
            .map(|e| e.id())
            .collect();

        let removed = doomed.len();
        let tree = &mut doc.html_mut().tree;
        for id in doomed {
            if let Some(mut node) = tree.get_mut(id) {
                node.detach();
            }
        }

        if removed > 0 {
            ::log::debug!("Noise filter removed {} subtrees from {}", removed, doc.url());
        }
        removed
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, ExtractError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ExtractError::Selector {
            selector: pattern.to_string(),
            reason: e.to_string(),
        })
}
