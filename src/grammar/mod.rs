//! Query grammar: normalization and tokenization
//!
//! Queries are normalized to Unicode NFC and trimmed before lexing. The lexer
//! recognizes three token shapes, each with an optional `-`/`~` modifier:
//!
//! - plain tags: `cat_ears`, `-rating:e`
//! - quoted metatags: `description:"two words"`
//! - balanced groups: `~( a b ( c ) )`
//!
//! # Examples
//!
//! ```
//! use tagq::grammar::{normalize_query, tokenize, TokenBody};
//!
//! let query = normalize_query("  aaa -( bbb ccc )  ");
//! let tokens = tokenize(&query);
//! assert_eq!(tokens.len(), 2);
//! assert!(matches!(tokens[1].body, TokenBody::Group(_)));
//! ```

pub mod lexer;
pub mod token;

pub use lexer::{Lexer, is_space, tokenize};
pub use token::{ClauseType, Group, Modifier, Token, TokenBody};

use unicode_normalization::UnicodeNormalization;

/// NFC-normalize a query and trim surrounding whitespace
#[must_use]
pub fn normalize_query(query: &str) -> String {
    let normalized: String = query.nfc().collect();
    normalized
        .trim_matches(|c: char| is_space(c) || c == '\0')
        .to_string()
}

/// Normalize a single tag name: NFC, lowercase, trimmed, interior whitespace as `_`
#[must_use]
pub fn normalize_tag_name(name: &str) -> String {
    let normalized: String = name.nfc().collect::<String>().to_lowercase();
    normalized
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Strip one pair of enclosing double quotes
#[must_use]
pub fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Whether the whole query is a single group with no contents (`( )`, `-( )`)
#[must_use]
pub fn is_empty_group(query: &str) -> bool {
    let body = query.strip_prefix(['-', '~']).unwrap_or(query);
    body.len() >= 3
        && body.starts_with('(')
        && body.ends_with(')')
        && body[1..body.len() - 1].chars().all(is_space)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query_nfc_and_trim() {
        // "e" + combining acute accent composes to a single code point
        assert_eq!(normalize_query("  cafe\u{301} \n"), "caf\u{e9}");
        assert_eq!(normalize_query("\0aaa\0"), "aaa");
    }

    #[test]
    fn test_normalize_tag_name() {
        assert_eq!(normalize_tag_name("  Cat  Ears "), "cat_ears");
        assert_eq!(normalize_tag_name("ABC"), "abc");
    }

    #[test]
    fn test_strip_quotes_requires_both() {
        assert_eq!(strip_quotes("\"two words\""), "two words");
        assert_eq!(strip_quotes("\"half"), "\"half");
        assert_eq!(strip_quotes("plain"), "plain");
        assert_eq!(strip_quotes("\"\""), "");
    }

    #[test]
    fn test_is_empty_group() {
        assert!(is_empty_group("( )"));
        assert!(is_empty_group("-(   )"));
        assert!(!is_empty_group("()"));
        assert!(!is_empty_group("( a )"));
    }
}
