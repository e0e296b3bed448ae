//! Ordered, data-driven section classification.
//!
//! A [`Classifier`] holds a table of [`Rule`]s evaluated first-match-wins.
//! Candidates no rule claims fall back to [`SectionType::Unknown`].

use crate::parsers::html::visible_text;
use crate::parsers::text;
use crate::results::{Content, SectionType};
use scraper::ElementRef;
use std::collections::HashMap;

/// Semantic landmark a candidate was found as, by tag or ARIA role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landmark {
    Header,
    Nav,
    Main,
    Section,
    Article,
    Aside,
    Footer,
}

impl Landmark {
    pub fn of(element: ElementRef<'_>) -> Option<Landmark> {
        let value = element.value();
        let by_tag = match value.name() {
            "header" => Some(Landmark::Header),
            "nav" => Some(Landmark::Nav),
            "main" => Some(Landmark::Main),
            "section" => Some(Landmark::Section),
            "article" => Some(Landmark::Article),
            "aside" => Some(Landmark::Aside),
            "footer" => Some(Landmark::Footer),
            _ => None,
        };
        by_tag.or_else(|| match value.attr("role")?.trim() {
            "banner" => Some(Landmark::Header),
            "navigation" => Some(Landmark::Nav),
            "main" => Some(Landmark::Main),
            "region" => Some(Landmark::Section),
            "complementary" => Some(Landmark::Aside),
            "contentinfo" => Some(Landmark::Footer),
            _ => None,
        })
    }
}

/// How a candidate was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Landmark(Landmark),
    /// A heading-bearing or text-heavy block without landmark semantics
    Block,
    /// The whole document body, used when nothing finer could be found
    Document,
}

/// Everything a rule may look at
#[derive(Debug, Clone, Copy)]
pub struct CandidateView<'a> {
    pub element: ElementRef<'a>,
    pub origin: Origin,
    /// Position among the candidates of its page
    pub ordinal: usize,
    /// Types already assigned to earlier candidates of the same page
    pub preceding: &'a [SectionType],
    pub content: &'a Content,
}

/// A single classification rule
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub kind: SectionType,
    pub matches: fn(&CandidateView<'_>) -> bool,
}

/// First-match-wins rule table
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(vec![
            Rule {
                name: "footer landmark",
                kind: SectionType::Footer,
                matches: is_footer,
            },
            Rule {
                name: "header or nav landmark",
                kind: SectionType::Nav,
                matches: is_navigation,
            },
            Rule {
                name: "prices with plan cards",
                kind: SectionType::Pricing,
                matches: looks_like_pricing,
            },
            Rule {
                name: "question and answer pattern",
                kind: SectionType::Faq,
                matches: looks_like_faq,
            },
            Rule {
                name: "leading primary heading",
                kind: SectionType::Hero,
                matches: looks_like_hero,
            },
            Rule {
                name: "content landmark",
                kind: SectionType::Section,
                matches: is_content_landmark,
            },
        ])
    }
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Evaluate `rule` before every existing rule
    pub fn prepend(mut self, rule: Rule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// Evaluate `rule` after every existing rule, before the fallback
    pub fn append(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn classify(&self, view: &CandidateView<'_>) -> SectionType {
        match self.rules.iter().find(|rule| (rule.matches)(view)) {
            Some(rule) => {
                ::log::trace!("Candidate {} matched rule '{}'", view.ordinal, rule.name);
                rule.kind
            }
            None => SectionType::Unknown,
        }
    }
}

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '₩', '₽'];

const PRICING_KEYWORDS: &[&str] = &[
    "pricing",
    "per month",
    "per year",
    "/mo",
    "/month",
    "/yr",
    "/year",
    "billed",
];

const FAQ_KEYWORDS: &[&str] = &["faq", "frequently asked", "common questions"];

/// Tags whose text commonly carries an FAQ question
const QUESTION_TAGS: &[&str] = &[
    "h2", "h3", "h4", "h5", "h6", "summary", "dt", "button", "strong",
];

fn is_footer(view: &CandidateView<'_>) -> bool {
    view.origin == Origin::Landmark(Landmark::Footer)
}

fn is_navigation(view: &CandidateView<'_>) -> bool {
    matches!(
        view.origin,
        Origin::Landmark(Landmark::Header) | Origin::Landmark(Landmark::Nav)
    )
}

fn is_content_landmark(view: &CandidateView<'_>) -> bool {
    matches!(
        view.origin,
        Origin::Landmark(Landmark::Main)
            | Origin::Landmark(Landmark::Section)
            | Origin::Landmark(Landmark::Article)
            | Origin::Landmark(Landmark::Aside)
    )
}

fn looks_like_pricing(view: &CandidateView<'_>) -> bool {
    let prices = count_prices(&view.content.text);
    if prices == 0 {
        return false;
    }
    (prices >= 2 && has_priced_cards(view.element))
        || text::contains_any(&view.content.text, PRICING_KEYWORDS)
}

fn looks_like_faq(view: &CandidateView<'_>) -> bool {
    let mut answered_details = 0;
    let mut questions = 0;
    let mut faq_heading = false;

    for element in view.element.descendants().filter_map(ElementRef::wrap) {
        let name = element.value().name();
        if name == "details"
            && element
                .children()
                .filter_map(ElementRef::wrap)
                .any(|c| c.value().name() == "summary")
        {
            answered_details += 1;
        }
        if QUESTION_TAGS.contains(&name) && text::is_question(&visible_text(element)) {
            questions += 1;
        }
        if is_heading(name) && text::contains_any(&visible_text(element), FAQ_KEYWORDS) {
            faq_heading = true;
        }
    }

    answered_details >= 2 || questions >= 2 || (faq_heading && questions >= 1)
}

fn looks_like_hero(view: &CandidateView<'_>) -> bool {
    view.origin != Origin::Document
        && view.preceding.iter().all(|kind| *kind == SectionType::Nav)
        && view
            .element
            .descendants()
            .filter_map(ElementRef::wrap)
            .any(|e| e.value().name() == "h1")
}

fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Currency symbols directly followed (optionally after a space) by a digit
fn count_prices(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|&(i, c)| {
            CURRENCY_SYMBOLS.contains(c)
                && match chars.get(i + 1) {
                    Some(next) if next.is_ascii_digit() => true,
                    Some(' ') => chars.get(i + 2).is_some_and(|d| d.is_ascii_digit()),
                    _ => false,
                }
        })
        .count()
}

/// Some element has at least two same-shaped children, each showing a price
fn has_priced_cards(root: ElementRef<'_>) -> bool {
    root.descendants().filter_map(ElementRef::wrap).any(|parent| {
        let mut shapes: HashMap<(&str, &str), (usize, usize)> = HashMap::new();
        for child in parent.children().filter_map(ElementRef::wrap) {
            let value = child.value();
            let shape = (value.name(), value.attr("class").unwrap_or_default());
            let priced = count_prices(&visible_text(child)) > 0;
            let entry = shapes.entry(shape).or_insert((0, 0));
            entry.0 += 1;
            if priced {
                entry.1 += 1;
            }
        }
        shapes
            .values()
            .any(|(members, priced)| *members >= 2 && priced == members)
    })
}
