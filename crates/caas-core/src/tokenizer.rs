use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{CHARS_PER_TOKEN, MIN_QUERY_TERM_LEN, MIN_SIGNIFICANT_TERM_LEN};

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s']").unwrap());
static APOSTROPHE_TRIM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^'+|'+$").unwrap());

/// Words that never count as query tokens or topic terms.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "also", "an", "and", "any", "are", "as",
    "at", "be", "been", "before", "being", "both", "but", "by", "can", "could", "did", "do",
    "does", "each", "for", "from", "had", "has", "have", "how", "i", "if", "in", "into", "is",
    "it", "its", "may", "more", "most", "no", "nor", "not", "of", "on", "only", "or", "other",
    "our", "out", "over", "same", "shall", "should", "so", "some", "such", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "those", "through",
    "to", "under", "until", "up", "upon", "very", "was", "we", "were", "what", "when",
    "where", "which", "while", "who", "why", "will", "with", "would", "you", "your",
];

/// Tokenize text into lowercase words.
/// Preserves apostrophes within words (e.g., "don't").
/// No stemming, no stop-word removal.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned = NON_WORD.replace_all(text, " ");
    cleaned
        .to_lowercase()
        .split_whitespace()
        .map(|t| APOSTROPHE_TRIM.replace_all(t, "").to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Topic-bearing terms: tokens minus stop-words, at least
/// [`MIN_SIGNIFICANT_TERM_LEN`] characters. Ordered for deterministic iteration.
pub fn significant_terms(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() >= MIN_SIGNIFICANT_TERM_LEN && !is_stop_word(t))
        .collect()
}

/// Estimated token cost of `text`: `ceil(chars / CHARS_PER_TOKEN)`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Normalized query tokens used for the query boost.
///
/// Stop-words and tokens shorter than [`MIN_QUERY_TERM_LEN`] are dropped so
/// that a query like "the e-mail policy" does not boost every section
/// containing "the" or "e". Duplicates are removed, first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTerms {
    terms: Vec<String>,
}

impl QueryTerms {
    pub fn new(query: &str) -> Self {
        let mut terms: Vec<String> = Vec::new();
        for token in tokenize(query) {
            if token.chars().count() < MIN_QUERY_TERM_LEN {
                continue;
            }
            if !is_stop_word(&token) && !terms.contains(&token) {
                terms.push(token);
            }
        }
        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// First query token found as a case-insensitive substring of `text`.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.terms
            .iter()
            .find(|t| haystack.contains(t.as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokenize() {
        let tokens = tokenize("Hello, world!");
        assert_eq!(tokens, vec!["hello", "world"]);
    }

    #[test]
    fn test_apostrophe_preserved() {
        let tokens = tokenize("Don't stop!");
        assert_eq!(tokens, vec!["don't", "stop"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n  ").is_empty());
    }

    #[test]
    fn test_stop_words_sorted() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS, "binary_search needs a sorted list");
    }

    #[test]
    fn test_significant_terms_filter() {
        let terms = significant_terms("The API endpoint is deprecated and the endpoint moved");
        let terms: Vec<&str> = terms.iter().map(String::as_str).collect();
        assert_eq!(terms, vec!["deprecated", "endpoint", "moved"]);
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_estimate_tokens_counts_chars_not_bytes() {
        // 4 chars, 8 bytes
        assert_eq!(estimate_tokens("éééé"), 1);
    }

    #[test]
    fn test_query_terms_drop_stop_words_and_duplicates() {
        let q = QueryTerms::new("The termination of THE termination clause");
        assert_eq!(q.terms(), &["termination", "clause"]);
    }

    #[test]
    fn test_query_terms_case_insensitive_match() {
        let q = QueryTerms::new("Termination");
        assert_eq!(q.first_match("Early TERMINATION rights"), Some("termination"));
        assert_eq!(q.first_match("Payment schedule"), None);
    }

    #[test]
    fn test_query_terms_substring_match() {
        let q = QueryTerms::new("terminat");
        assert_eq!(q.first_match("terminated by notice"), Some("terminat"));
    }

    #[test]
    fn test_query_terms_drop_short_fragments() {
        let q = QueryTerms::new("e-mail retention");
        assert_eq!(q.terms(), &["mail", "retention"]);
        assert_eq!(q.first_match("Invoices are due within thirty days."), None);

        let q = QueryTerms::new("C++ templates");
        assert_eq!(q.terms(), &["templates"]);
        assert_eq!(q.first_match("Pasta with cheese."), None);
    }

    #[test]
    fn test_query_terms_keep_short_acronyms() {
        let q = QueryTerms::new("REST api");
        assert_eq!(q.terms(), &["rest", "api"]);
    }

    #[test]
    fn test_empty_query() {
        assert!(QueryTerms::new("").is_empty());
        assert!(QueryTerms::new("the of and").is_empty());
        assert!(QueryTerms::new("a b c").is_empty());
    }
}
