//! Metatag and tag lookups over raw queries
//!
//! Names must match exactly, modifier included: `status` does not match
//! `-status` and vice versa. Values have one pair of enclosing quotes
//! removed, and blank values are skipped.

use std::collections::BTreeMap;

use crate::DEPTH_LIMIT;
use crate::grammar::{Token, TokenBody, normalize_query, strip_quotes, tokenize};
use crate::metatags::STATUS_VALUES;
use crate::scan::recursive::{ScanOptions, scan_recursive};

/// Names whose presence decides whether deleted posts stay visible
const DELETION_METATAGS: &[&str] = &[
    "status",
    "-status",
    "delreason",
    "-delreason",
    "~delreason",
    "deletedby",
    "-deletedby",
    "~deletedby",
];

/// Visit every non-group token in encounter order
///
/// With `recurse`, descends into groups up to [`DEPTH_LIMIT`] levels and
/// silently skips anything deeper.
fn visit_tokens(tokens: &[Token], recurse: bool, depth: usize, visit: &mut impl FnMut(&Token) -> bool) -> bool {
    for token in tokens {
        match &token.body {
            TokenBody::Group(group) => {
                if recurse && depth < DEPTH_LIMIT && !visit_tokens(&group.tokens(), recurse, depth + 1, visit) {
                    return false;
                }
            }
            _ => {
                if !visit(token) {
                    return false;
                }
            }
        }
    }
    true
}

/// Split a token into `(name, value)` when its name is one of `names`
fn matching_value<'t>(token: &'t Token, names: &[&str]) -> Option<(&'t str, &'t str)> {
    let (name, value) = token.text().split_once(':')?;
    if !names.contains(&name) {
        return None;
    }
    let value = strip_quotes(value);
    (!value.trim().is_empty()).then_some((name, value))
}

/// Every non-blank value of each requested metatag
///
/// Metatags that never appear are absent from the map.
#[must_use]
pub fn fetch_metatags(query: &str, names: &[&str], recurse: bool) -> BTreeMap<String, Vec<String>> {
    let query = normalize_query(query);
    let mut found: BTreeMap<String, Vec<String>> = BTreeMap::new();
    visit_tokens(&tokenize(&query), recurse, 0, &mut |token| {
        if let Some((name, value)) = matching_value(token, names) {
            found.entry(name.to_string()).or_default().push(value.to_string());
        }
        true
    });
    found
}

/// First non-blank value of any of the requested metatags
#[must_use]
pub fn fetch_metatag(query: &str, names: &[&str], recurse: bool) -> Option<String> {
    let query = normalize_query(query);
    let mut first = None;
    visit_tokens(&tokenize(&query), recurse, 0, &mut |token| {
        first = matching_value(token, names).map(|(_, value)| value.to_string());
        first.is_none()
    });
    first
}

#[must_use]
pub fn has_metatag(query: &str, names: &[&str], recurse: bool) -> bool {
    fetch_metatag(query, names, recurse).is_some()
}

/// Which of `wanted` appear in an already-scanned token list
///
/// With `recurse`, entries that are whole groups are expanded (prefixes
/// kept, markers dropped) and their contents searched as well.
#[must_use]
pub fn fetch_tags(tokens: &[String], wanted: &[&str], recurse: bool) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    if !recurse {
        for tag in wanted {
            if tokens.iter().any(|t| t.as_str() == *tag) {
                push_wanted(&mut found, wanted, tag);
            }
        }
        return found;
    }

    let options = ScanOptions {
        strip_duplicates_at_level: true,
        delimit_groups: false,
        ..ScanOptions::default()
    };
    for token in tokens {
        let trimmed = token.trim();
        let is_group = tokenize(trimmed)
            .first()
            .is_some_and(|t| t.is_group() && t.span().len() == trimmed.len());
        if is_group {
            // Scanning never raises with these options
            for item in scan_recursive(trimmed, &options).unwrap_or_default() {
                if let Some(tag) = item.as_tag() {
                    push_wanted(&mut found, wanted, tag);
                }
            }
        } else {
            push_wanted(&mut found, wanted, trimmed);
        }
    }
    found
}

fn push_wanted(found: &mut Vec<String>, wanted: &[&str], tag: &str) {
    if wanted.contains(&tag) && !found.iter().any(|f| f == tag) {
        found.push(tag.to_string());
    }
}

#[must_use]
pub fn has_tag(tokens: &[String], wanted: &[&str], recurse: bool) -> bool {
    !fetch_tags(tokens, wanted, recurse).is_empty()
}

/// Whether a search should hide deleted posts by default
///
/// False when `always_show_deleted`, when any `status`/`-status` metatag at
/// any depth carries a recognized status, or when a `delreason`/`deletedby`
/// metatag appears anywhere.
#[must_use]
pub fn should_hide_deleted_posts(query: &str, always_show_deleted: bool) -> bool {
    if always_show_deleted {
        return false;
    }
    let found = fetch_metatags(query, DELETION_METATAGS, true);
    !found.iter().any(|(name, values)| {
        !name.ends_with("status")
            || values
                .iter()
                .any(|v| STATUS_VALUES.contains(&v.to_lowercase().as_str()))
    })
}
