/// Collapses every run of whitespace to a single space and trims the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Concatenates text fragments collected from separate DOM nodes.
/// Word breaks come only from whitespace inside the fragments.
pub fn join_fragments<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined: String = fragments.into_iter().collect();
    normalize_whitespace(&joined)
}

/// First `count` words of the text, suffixed with "..." when more words follow
pub fn leading_words(text: &str, count: usize) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || count == 0 {
        return None;
    }

    let mut label = words[..words.len().min(count)].join(" ");
    if words.len() > count {
        label.push_str("...");
    }
    Some(label)
}

/// Whether a short piece of text reads as a question
pub fn is_question(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() > 3 && trimmed.ends_with('?')
}

/// Case-insensitive check for any of the given lowercase needles
pub fn contains_any(text: &str, needles: &[&str]) -> bool {
    let lower = text.to_lowercase();
    needles.iter().any(|needle| lower.contains(needle))
}
