//! Scanning queries into token lists
//!
//! Three scanners with different levels of group awareness:
//!
//! - [`scan`]: group-unaware. Keeps quoted metatags whole and splits the rest
//!   on whitespace.
//! - [`scan_recursive`]: expands groups level by level, with flattening,
//!   per-level deduplication and sorting, prefix stripping or distribution.
//! - [`scan_search`]: the hoisting pass used before building a query. Lifts
//!   global metatags such as `order:` out of groups.
//!
//! The metatag helpers in [`lookup`] search queries for specific metatags
//! without building a full query.

pub mod hoist;
pub mod lookup;
pub mod recursive;

pub use hoist::{scan_search, scan_search_with};
pub use lookup::{
    fetch_metatag, fetch_metatags, fetch_tags, has_metatag, has_tag, should_hide_deleted_posts,
};
pub use recursive::{ScanItem, ScanOptions, scan_recursive, scan_recursive_with};

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::grammar::{normalize_query, normalize_tag_name};
use crate::query::error::Result;
use crate::resolve::AliasResolver;

static QUOTED_METATAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[-~]?\w*?:".*?""#).unwrap_or_else(|_| unreachable!()));

/// Group-unaware scan
///
/// Quoted metatags are kept whole; everything else is split on whitespace.
/// Duplicates are removed, keeping the first occurrence. Parentheses are
/// ordinary characters here, so `( a )` scans to `["(", "a", ")"]`.
#[must_use]
pub fn scan(query: &str) -> Vec<String> {
    let query = normalize_query(query);
    let mut tokens = Vec::new();
    let mut rest = query.as_str();

    while let Some(m) = QUOTED_METATAG_RE.find(rest) {
        tokens.extend(rest[..m.start()].split_whitespace().map(str::to_string));
        tokens.push(m.as_str().to_string());
        rest = &rest[m.end()..];
    }
    tokens.extend(rest.split_whitespace().map(str::to_string));

    let mut seen = HashSet::new();
    tokens.retain(|t| seen.insert(t.clone()));
    tokens
}

/// Canonical single-string form of a query, ignoring groups
///
/// Each scanned token is normalized and alias-resolved, then the list is
/// sorted, deduplicated and joined with single spaces.
#[must_use]
pub fn normalize(query: &str, aliases: &dyn AliasResolver) -> String {
    let mut tags: Vec<String> = scan(query)
        .iter()
        .map(|t| aliases.resolve_alias(&normalize_tag_name(t)))
        .collect();
    tags.sort();
    tags.dedup();
    tags.join(" ")
}

/// Canonical form of a query that keeps its groups
///
/// Every level is deduplicated, sorted and alias-normalized; prefixes are
/// kept. With `flatten` the result is a single space-joined string,
/// otherwise the nested structure is returned.
///
/// # Errors
/// Returns `QueryError::DepthExceeded` only if the options request it, which
/// these do not; groups past the depth limit are rendered empty.
pub fn normalize_search(
    query: &str,
    flatten: bool,
    aliases: &dyn AliasResolver,
) -> Result<NormalizedSearch> {
    let options = ScanOptions {
        flatten,
        strip_duplicates_at_level: true,
        strip_prefixes: false,
        sort_at_level: true,
        normalize_at_level: true,
        ..ScanOptions::default()
    };
    let items = scan_recursive_with(query, &options, aliases)?;
    Ok(if flatten {
        NormalizedSearch::Joined(ScanItem::flatten_all(&items).join(" "))
    } else {
        NormalizedSearch::Nested(items)
    })
}

/// Output of [`normalize_search`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedSearch {
    Joined(String),
    Nested(Vec<ScanItem>),
}

impl std::fmt::Display for NormalizedSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Joined(s) => f.write_str(s),
            Self::Nested(items) => f.write_str(&ScanItem::flatten_all(items).join(" ")),
        }
    }
}
