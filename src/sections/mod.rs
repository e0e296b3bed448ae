pub mod classify;

use crate::config::{ExtractionConfig, RAW_HTML_LIMIT};
use crate::error::{ErrorLog, ExtractError, Phase};
use crate::parsers::html::{self, visible_text};
use crate::parsers::{Document, text};
use crate::results::{Content, Image, Link, Section, SectionType};
use crate::utils::{capitalize, resolve_url, truncate_chars};
use classify::{CandidateView, Classifier, Landmark, Origin};
use scraper::ElementRef;
use std::collections::HashMap;
use url::Url;

pub use classify::Rule;

/// Never candidates, never descended into
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

/// Elements that group other content; anything else is loose content
const CONTAINER_TAGS: &[&str] = &[
    "div", "section", "article", "aside", "header", "footer", "nav", "main", "form", "figure",
    "details", "fieldset", "center",
];

/// An element chosen to become a section
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    element: ElementRef<'a>,
    origin: Origin,
}

/// Turns one document into classified, labelled sections
pub struct Extractor<'c> {
    config: &'c ExtractionConfig,
    classifier: &'c Classifier,
}

impl<'c> Extractor<'c> {
    pub fn new(config: &'c ExtractionConfig, classifier: &'c Classifier) -> Self {
        Self { config, classifier }
    }

    /// Sections of one page, in document order and without ids.
    /// A candidate that cannot be extracted is logged and skipped.
    pub fn extract(&self, doc: &Document, errors: &mut ErrorLog) -> Vec<Section> {
        self.extract_after(doc, &[], errors)
    }

    /// Like [`Extractor::extract`] for a page that continues earlier ones;
    /// `earlier` holds the types already assigned on those pages.
    pub fn extract_after(
        &self,
        doc: &Document,
        earlier: &[SectionType],
        errors: &mut ErrorLog,
    ) -> Vec<Section> {
        let candidates = self.candidates(doc);
        ::log::debug!("Found {} section candidates on {}", candidates.len(), doc.url());

        let mut sections = Vec::with_capacity(candidates.len());
        let mut kinds: Vec<SectionType> = earlier.to_vec();

        for (ordinal, candidate) in candidates.into_iter().enumerate() {
            let content = match extract_content(candidate.element, doc.url()) {
                Ok(content) => content,
                Err(e) => {
                    errors.push(
                        Phase::Parse,
                        format!("skipped candidate {} on {}: {}", ordinal, doc.url(), e),
                    );
                    continue;
                }
            };

            let view = CandidateView {
                element: candidate.element,
                origin: candidate.origin,
                ordinal,
                preceding: &kinds,
                content: &content,
            };
            let kind = self.classifier.classify(&view);
            let label = self.label(&content, kind);
            let (raw_html, truncated) = truncate_chars(&candidate.element.html(), RAW_HTML_LIMIT);

            kinds.push(kind);
            sections.push(Section {
                id: String::new(),
                kind,
                label,
                source_url: doc.url().to_string(),
                content,
                raw_html,
                truncated,
            });
        }

        sections
    }

    fn candidates<'a>(&self, doc: &'a Document) -> Vec<Candidate<'a>> {
        let Some(body) = doc.body() else {
            return Vec::new();
        };

        let mut found = Vec::new();
        self.collect_landmarks(body, 0, &mut found);
        if found.is_empty() {
            ::log::debug!("No landmarks on {}, grouping blocks instead", doc.url());
            self.collect_blocks(body, &mut found);
        }
        found
    }

    /// Landmarks no deeper than the configured depth; emitted landmarks are not
    /// descended into, except a `main` that wraps further landmarks.
    fn collect_landmarks<'a>(&self, parent: ElementRef<'a>, depth: usize, out: &mut Vec<Candidate<'a>>) {
        if depth > self.config.max_landmark_depth {
            return;
        }

        for child in parent.children().filter_map(ElementRef::wrap) {
            if SKIPPED_TAGS.contains(&child.value().name()) {
                continue;
            }
            match Landmark::of(child) {
                Some(Landmark::Main) if contains_landmark(child) => self.split_main(child, depth + 1, out),
                Some(landmark) => out.push(Candidate {
                    element: child,
                    origin: Origin::Landmark(landmark),
                }),
                None => self.collect_landmarks(child, depth + 1, out),
            }
        }
    }

    fn split_main<'a>(&self, main: ElementRef<'a>, depth: usize, out: &mut Vec<Candidate<'a>>) {
        for child in main.children().filter_map(ElementRef::wrap) {
            if SKIPPED_TAGS.contains(&child.value().name()) {
                continue;
            }
            if let Some(landmark) = Landmark::of(child) {
                out.push(Candidate {
                    element: child,
                    origin: Origin::Landmark(landmark),
                });
            } else if contains_landmark(child) {
                self.collect_landmarks(child, depth + 1, out);
            } else if self.is_significant(child) {
                out.push(Candidate {
                    element: child,
                    origin: Origin::Block,
                });
            }
        }
    }

    /// Descend through single wrappers until the content splits into several
    /// significant blocks, or until loose content makes the container itself the unit.
    fn collect_blocks<'a>(&self, body: ElementRef<'a>, out: &mut Vec<Candidate<'a>>) {
        let mut container = body;
        loop {
            let blocks: Vec<ElementRef<'a>> = container
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|e| CONTAINER_TAGS.contains(&e.value().name()) && self.is_significant(*e))
                .collect();

            match (blocks.len(), has_loose_content(container)) {
                (1, false) => container = blocks[0],
                (n, false) if n > 1 => {
                    out.extend(
                        blocks
                            .into_iter()
                            .take(self.config.max_fallback_blocks)
                            .map(|element| Candidate {
                                element,
                                origin: Origin::Block,
                            }),
                    );
                    return;
                }
                _ => {
                    if !is_blank(container) {
                        out.push(Candidate {
                            element: container,
                            origin: Origin::Document,
                        });
                    }
                    return;
                }
            }
        }
    }

    /// Carries a heading or enough text to stand on its own
    fn is_significant(&self, element: ElementRef<'_>) -> bool {
        element
            .descendants()
            .filter_map(ElementRef::wrap)
            .any(|e| is_heading(e.value().name()))
            || visible_text(element).chars().count() >= self.config.min_block_text
    }

    fn label(&self, content: &Content, kind: SectionType) -> String {
        if let Some(heading) = content.headings.first() {
            return heading.clone();
        }
        text::leading_words(&content.text, self.config.label_words())
            .unwrap_or_else(|| capitalize(kind.as_str()))
    }
}

/// Merge adjacent sections with identical text and number them by type.
///
/// Ids are `<type>-<n>`, counting per type across every page of one scrape.
pub fn finalize(sections: Vec<Section>) -> Vec<Section> {
    let mut merged: Vec<Section> = Vec::with_capacity(sections.len());
    for section in sections {
        if let Some(previous) = merged.last() {
            if !section.content.text.is_empty() && previous.content.text == section.content.text {
                ::log::debug!("Merging duplicate {} section '{}'", section.kind, section.label);
                continue;
            }
        }
        merged.push(section);
    }

    let mut ordinals: HashMap<SectionType, usize> = HashMap::new();
    for section in merged.iter_mut() {
        let ordinal = ordinals.entry(section.kind).or_insert(0);
        section.id = format!("{}-{}", section.kind, ordinal);
        *ordinal += 1;
    }
    merged
}

fn extract_content(element: ElementRef<'_>, base: &Url) -> Result<Content, ExtractError> {
    let headings = element
        .select(&html::selector("h1, h2, h3, h4, h5, h6")?)
        .map(visible_text)
        .filter(|h| !h.is_empty())
        .collect();

    let links = element
        .select(&html::selector("a[href]")?)
        .filter_map(|a| {
            let href = resolve_url(base, a.value().attr("href")?)?;
            Some(Link {
                text: visible_text(a),
                href: href.to_string(),
            })
        })
        .collect();

    let images = element
        .select(&html::selector("img")?)
        .filter_map(|img| {
            let value = img.value();
            let src = value
                .attr("src")
                .filter(|s| !s.trim().is_empty())
                .or_else(|| value.attr("data-src"))?;
            Some(Image {
                src: resolve_url(base, src)?.to_string(),
                alt: value.attr("alt").map(str::trim).unwrap_or_default().to_string(),
            })
        })
        .collect();

    let lists = element
        .select(&html::selector("ul, ol")?)
        .map(|list| {
            list.children()
                .filter_map(ElementRef::wrap)
                .filter(|item| item.value().name() == "li")
                .map(visible_text)
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|items| !items.is_empty())
        .collect();

    let row_selector = html::selector("tr")?;
    let tables = element
        .select(&html::selector("table")?)
        .map(|table| {
            table
                .select(&row_selector)
                .map(|row| {
                    row.children()
                        .filter_map(ElementRef::wrap)
                        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                        .map(visible_text)
                        .collect::<Vec<_>>()
                })
                .filter(|cells| !cells.is_empty())
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(Content {
        headings,
        text: visible_text(element),
        links,
        images,
        lists,
        tables,
    })
}

fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn contains_landmark(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|e| Landmark::of(e).is_some())
}

/// Text or non-container elements sitting directly in the container
fn has_loose_content(container: ElementRef<'_>) -> bool {
    container.children().any(|child| {
        if let Some(fragment) = child.value().as_text() {
            return !fragment.trim().is_empty();
        }
        match ElementRef::wrap(child) {
            Some(e) => {
                let name = e.value().name();
                !SKIPPED_TAGS.contains(&name)
                    && !CONTAINER_TAGS.contains(&name)
                    && (name == "img" || !visible_text(e).is_empty())
            }
            None => false,
        }
    })
}

fn is_blank(element: ElementRef<'_>) -> bool {
    visible_text(element).is_empty()
        && !element
            .descendants()
            .filter_map(ElementRef::wrap)
            .any(|e| e.value().name() == "img")
}
