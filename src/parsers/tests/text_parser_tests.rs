use crate::parsers::text;

#[cfg(test)]
mod basic_tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert_eq!(text::normalize_whitespace(""), "");
    }

    #[test]
    fn test_whitespace_only() {
        assert_eq!(text::normalize_whitespace("   \n   \t   \r\n   "), "");
    }

    #[test]
    fn test_mixed_whitespace() {
        let input = "  Line 1  \n\n  Line 2  \t\r\n  Line 3  ";
        assert_eq!(text::normalize_whitespace(input), "Line 1 Line 2 Line 3");
    }

    #[test]
    fn test_join_fragments() {
        let fragments = vec!["Hello,", "\n world! ", "", "  Link"];
        assert_eq!(text::join_fragments(fragments), "Hello, world! Link");
    }
}

#[cfg(test)]
mod label_tests {
    use super::*;

    #[test]
    fn test_leading_words_short_text() {
        assert_eq!(
            text::leading_words("Just three words", 6).as_deref(),
            Some("Just three words")
        );
    }

    #[test]
    fn test_leading_words_truncates_with_ellipsis() {
        let input = "one two three four five six seven eight";
        assert_eq!(
            text::leading_words(input, 6).as_deref(),
            Some("one two three four five six...")
        );
    }

    #[test]
    fn test_leading_words_exact_count_has_no_ellipsis() {
        let input = "one two three four five six";
        assert_eq!(text::leading_words(input, 6).as_deref(), Some(input));
    }

    #[test]
    fn test_leading_words_empty() {
        assert!(text::leading_words("   ", 6).is_none());
    }

    #[test]
    fn test_is_question() {
        assert!(text::is_question("How do refunds work?"));
        assert!(text::is_question("  Can I cancel?  "));
        assert!(!text::is_question("?"));
        assert!(!text::is_question("Refund policy"));
    }

    #[test]
    fn test_contains_any_ignores_case() {
        assert!(text::contains_any("Frequently Asked Questions", &["frequently asked"]));
        assert!(!text::contains_any("About us", &["pricing", "faq"]));
    }
}
