//! Whitespace canonicalization for phrase search
//!
//! Page-text extraction introduces line breaks, doubled spaces and stray
//! carriage returns that the quoted passage does not have (or vice versa).
//! Normalizing both sides to single spaces lets a phrase search tolerate
//! that noise.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Replace line breaks with spaces, collapse whitespace runs, trim.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let unbroken = text.replace(['\n', '\r'], " ");
    WHITESPACE_RUN.replace_all(&unbroken, " ").trim().to_string()
}

/// Whitespace-delimited words of `text`
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_line_breaks_and_runs() {
        assert_eq!(normalize("a\n\n b   c"), "a b c");
    }

    #[test]
    fn test_carriage_returns_and_tabs() {
        assert_eq!(normalize("capital of\r\nQAR 7,500,000\tminimum"), "capital of QAR 7,500,000 minimum");
    }

    #[test]
    fn test_trims_edges() {
        assert_eq!(normalize("   padded text \n"), "padded text");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\r\t "), "");
    }

    #[test]
    fn test_words_split() {
        assert_eq!(words("  one two\nthree  "), vec!["one", "two", "three"]);
        assert!(words("").is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: normalizing twice is the same as normalizing once
        #[test]
        fn normalize_idempotent(text in "[a-z \\n\\r\\t]{0,80}") {
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once), once);
        }

        /// Property: output never holds line breaks, double spaces or edge whitespace
        #[test]
        fn normalize_canonical_form(text in "\\PC{0,80}") {
            let out = normalize(&text);
            prop_assert!(!out.contains('\n'));
            prop_assert!(!out.contains('\r'));
            prop_assert!(!out.contains("  "));
            prop_assert_eq!(out.trim(), out.as_str());
        }

        /// Property: word content survives normalization
        #[test]
        fn normalize_preserves_words(text in "[a-z \\n]{0,60}") {
            let out = normalize(&text);
            prop_assert_eq!(words(&out), words(&text));
        }
    }
}
