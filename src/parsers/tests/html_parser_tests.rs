use crate::parsers::{Document, html};
use url::Url;

fn doc(source: &str) -> Document {
    Document::parse(source, Url::parse("https://example.org/blog/post").unwrap())
}

#[test]
fn test_visible_text_skips_scripts_and_styles() {
    let page = doc(
        "<html><body><p>Hello, world!</p><script>var x = 1;</script>\
         <style>p { color: red }</style><a href=\"https://example.com\">Link</a></body></html>",
    );
    assert_eq!(page.body_text(), "Hello, world! Link");
}

#[test]
fn test_missing_body_yields_empty_text() {
    let page = doc("");
    // html5ever always synthesises a body
    assert!(page.body().is_some());
    assert_eq!(page.body_text(), "");
}

#[test]
fn test_visible_text_keeps_inline_markup_inside_words() {
    let page = doc("<body><h2>Acme<sup>®</sup> Cloud</h2><p>Hel<b>lo</b>, <a href=\"/w\">world</a>.</p></body>");
    let heading = html::first(page.html(), "h2").unwrap().unwrap();
    assert_eq!(html::visible_text(heading), "Acme® Cloud");
    assert_eq!(page.body_text(), "Acme® Cloud Hello, world.");
}

#[test]
fn test_visible_text_separates_block_elements() {
    let page = doc("<body><ul><li>One</li><li>Two</li></ul><div>Three</div><p>Four<br>Five</p></body>");
    assert_eq!(page.body_text(), "One Two Three Four Five");
}

#[test]
fn test_invalid_selector_is_an_error() {
    assert!(html::selector("div[").is_err());
    assert!(html::selector("div > p").is_ok());
}

#[test]
fn test_extract_meta_full_head() {
    let page = doc(
        r#"<html lang="de"><head>
            <title> My   Page </title>
            <meta name="description" content="A page">
            <link rel="canonical" href="/blog/post?ref=1">
        </head><body></body></html>"#,
    );
    let meta = html::extract_meta(page.html(), page.url()).unwrap();
    assert_eq!(meta.title.as_deref(), Some("My Page"));
    assert_eq!(meta.description.as_deref(), Some("A page"));
    assert_eq!(meta.language.as_deref(), Some("de"));
    assert_eq!(
        meta.canonical.as_deref(),
        Some("https://example.org/blog/post?ref=1")
    );
}

#[test]
fn test_extract_meta_open_graph_fallbacks() {
    let page = doc(
        r#"<html><head>
            <meta property="og:title" content="OG Title">
            <meta property="og:description" content="OG description">
        </head><body></body></html>"#,
    );
    let meta = html::extract_meta(page.html(), page.url()).unwrap();
    assert_eq!(meta.title.as_deref(), Some("OG Title"));
    assert_eq!(meta.description.as_deref(), Some("OG description"));
    assert!(meta.language.is_none());
    assert!(meta.canonical.is_none());
}
