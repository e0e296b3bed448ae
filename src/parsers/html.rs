use crate::error::ExtractError;
use crate::parsers::text;
use crate::results::Meta;
use crate::utils::resolve_url;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text is never visible
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

/// Elements whose boundaries separate words; everything else is inline
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "caption", "dd", "details", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Compile a CSS selector, keeping the error message instead of the borrowed error
pub fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Whitespace-normalised text of an element, with script and style content excluded
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut fragments = Vec::new();
    collect_text(element, &mut fragments);
    text::join_fragments(fragments)
}

fn collect_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(fragment) = child.value().as_text() {
            out.push(&**fragment);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if HIDDEN_TAGS.contains(&name) {
                continue;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push(" ");
            }
            collect_text(child_element, out);
            if block {
                out.push(" ");
            }
        }
    }
}

/// First element matching the selector, anywhere in the document
pub fn first<'a>(doc: &'a Html, css: &str) -> Result<Option<ElementRef<'a>>, ExtractError> {
    let sel = selector(css)?;
    Ok(doc.select(&sel).next())
}

/// Attribute value of the first matching element, trimmed, if non-empty
fn first_attr(doc: &Html, css: &str, attr: &str) -> Result<Option<String>, ExtractError> {
    Ok(first(doc, css)?
        .and_then(|e| e.value().attr(attr))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string))
}

/// Extracts title, description, language and canonical URL from the document head
pub fn extract_meta(doc: &Html, base: &Url) -> Result<Meta, ExtractError> {
    let title = match first(doc, "title")?
        .map(visible_text)
        .filter(|t| !t.is_empty())
    {
        Some(title) => Some(title),
        None => first_attr(doc, r#"meta[property="og:title"]"#, "content")?,
    };

    let description = match first_attr(doc, r#"meta[name="description"]"#, "content")? {
        Some(description) => Some(description),
        None => first_attr(doc, r#"meta[property="og:description"]"#, "content")?,
    };

    let language = first_attr(doc, "html", "lang")?;

    let canonical = first_attr(doc, r#"link[rel="canonical"]"#, "href")?
        .and_then(|href| resolve_url(base, &href))
        .map(|u| u.to_string());

    Ok(Meta {
        title,
        description,
        language,
        canonical,
    })
}
