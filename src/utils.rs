use url::Url;

/// Resolve a possibly relative reference against a base URL.
///
/// Only http(s) results with a host are returned; `mailto:`, `javascript:`,
/// `data:` and similar references yield `None`.
pub fn resolve_url(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    let resolved = base.join(reference).ok()?;
    match resolved.scheme() {
        "http" | "https" if resolved.host().is_some() => Some(resolved),
        _ => None,
    }
}

/// Truncate to at most `limit` characters, reporting whether anything was cut
pub fn truncate_chars(text: &str, limit: usize) -> (String, bool) {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => (text[..byte_index].to_string(), true),
        None => (text.to_string(), false),
    }
}

/// Upper-case the first character
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
