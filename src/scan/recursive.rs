//! Group-aware recursive scanner

use log::warn;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::DEPTH_LIMIT;
use crate::grammar::{Group, Modifier, Token, TokenBody, normalize_query, normalize_tag_name, tokenize};
use crate::query::error::{QueryError, Result};
use crate::resolve::{AliasResolver, NoAliases};

/// One element of a scan result
///
/// Flattened scans only ever contain [`ScanItem::Tag`]; nested scans keep one
/// [`ScanItem::Nested`] per group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum ScanItem {
    Tag(String),
    Nested(Vec<ScanItem>),
}

impl ScanItem {
    /// Build a nested item from anything convertible to items
    pub fn nested<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Self>,
    {
        Self::Nested(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn as_tag(&self) -> Option<&str> {
        match self {
            Self::Tag(tag) => Some(tag),
            Self::Nested(_) => None,
        }
    }

    fn flatten_into(&self, out: &mut Vec<String>) {
        match self {
            Self::Tag(tag) => out.push(tag.clone()),
            Self::Nested(items) => items.iter().for_each(|item| item.flatten_into(out)),
        }
    }

    /// Flatten a scan result into its leaf strings, in order
    #[must_use]
    pub fn flatten_all(items: &[Self]) -> Vec<String> {
        let mut out = Vec::new();
        for item in items {
            item.flatten_into(&mut out);
        }
        out
    }
}

impl From<&str> for ScanItem {
    fn from(tag: &str) -> Self {
        Self::Tag(tag.to_string())
    }
}

impl From<String> for ScanItem {
    fn from(tag: String) -> Self {
        Self::Tag(tag)
    }
}

/// Options for [`scan_recursive`]
///
/// All options are independent of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Collapse group results into one flat list instead of nested items
    pub flatten: bool,
    /// Drop `-`/`~` from tags and group markers
    pub strip_prefixes: bool,
    /// Push each group's modifier down onto its tags: `-` if any enclosing
    /// group (or the tag itself) is `-`, otherwise `~`
    pub distribute_prefixes: bool,
    /// Drop tags and groups already seen at the same level
    pub strip_duplicates_at_level: bool,
    /// Surround each group with `(`/`)` markers
    pub delimit_groups: bool,
    /// Sort each level: groups first (as blocks), then tags
    pub sort_at_level: bool,
    /// Normalize and alias-resolve plain tags
    pub normalize_at_level: bool,
    /// Raise on groups past the depth limit instead of rendering them empty
    pub error_on_depth_exceeded: bool,
    /// Never put a group's modifier on its markers
    pub discard_group_prefix: bool,
    /// Maximum group nesting, clamped to [`DEPTH_LIMIT`]
    pub depth_limit: usize,
    /// Group levels already entered by the caller
    pub base_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            flatten: true,
            strip_prefixes: false,
            distribute_prefixes: false,
            strip_duplicates_at_level: false,
            delimit_groups: true,
            sort_at_level: false,
            normalize_at_level: false,
            error_on_depth_exceeded: false,
            discard_group_prefix: false,
            depth_limit: DEPTH_LIMIT,
            base_depth: 0,
        }
    }
}

/// Scan a query, expanding groups recursively
///
/// A query that is exactly one group (optionally prefixed) is scanned as that
/// group rather than as a level containing it.
///
/// # Errors
/// Returns `QueryError::DepthExceeded` when a group is nested past the depth
/// limit and `error_on_depth_exceeded` is set.
pub fn scan_recursive(query: &str, options: &ScanOptions) -> Result<Vec<ScanItem>> {
    scan_recursive_with(query, options, &NoAliases)
}

/// [`scan_recursive`] with an alias resolver for `normalize_at_level`
///
/// # Errors
/// See [`scan_recursive`].
pub fn scan_recursive_with(
    query: &str,
    options: &ScanOptions,
    aliases: &dyn AliasResolver,
) -> Result<Vec<ScanItem>> {
    let query = normalize_query(query);
    let tokens = tokenize(&query);
    let mut scanner = Scanner {
        options,
        aliases,
        ancestors: Vec::new(),
    };

    if let [token] = tokens.as_slice()
        && let Some(group) = token.as_group()
    {
        return scanner.scan_group(token.prefix, group, 1);
    }
    scanner.scan_level(&tokens, 0)
}

/// Entry at one level, before sorting
enum Entry {
    Tag(String),
    Group { items: Vec<ScanItem>, key: Vec<String> },
}

impl Entry {
    fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Group { key: a, .. }, Self::Group { key: b, .. }) => a.cmp(b),
            (Self::Group { .. }, Self::Tag(_)) => Ordering::Less,
            (Self::Tag(_), Self::Group { .. }) => Ordering::Greater,
            (Self::Tag(a), Self::Tag(b)) => a.cmp(b),
        }
    }
}

struct Scanner<'a> {
    options: &'a ScanOptions,
    aliases: &'a dyn AliasResolver,
    ancestors: Vec<Modifier>,
}

impl Scanner<'_> {
    fn depth_limit(&self) -> usize {
        self.options.depth_limit.min(DEPTH_LIMIT)
    }

    /// Scan a group nested `nesting` levels below the caller's starting level
    fn scan_group(
        &mut self,
        prefix: Option<Modifier>,
        group: &Group,
        nesting: usize,
    ) -> Result<Vec<ScanItem>> {
        let limit = self.depth_limit();
        let depth = self.options.base_depth + nesting;
        let distributed = self.options.distribute_prefixes && prefix.is_some();
        if let Some(modifier) = prefix.filter(|_| distributed) {
            self.ancestors.push(modifier);
        }

        let inner = if depth > limit {
            if self.options.error_on_depth_exceeded {
                Err(QueryError::DepthExceeded { limit })
            } else {
                warn!("Group at depth {depth} exceeds the limit of {limit}; scanning it as empty");
                Ok(Vec::new())
            }
        } else {
            self.scan_level(&group.tokens(), nesting)
        };

        if distributed {
            self.ancestors.pop();
        }
        Ok(self.wrap_group(inner?, prefix))
    }

    fn scan_level(&mut self, tokens: &[Token], nesting: usize) -> Result<Vec<ScanItem>> {
        let dedup = self.options.strip_duplicates_at_level;
        let mut entries = Vec::new();
        let mut level_tags: Vec<String> = Vec::new();
        let mut level_groups: Vec<BTreeSet<String>> = Vec::new();

        for token in tokens {
            if let TokenBody::Group(group) = &token.body {
                let items = self.scan_group(token.prefix, group, nesting + 1)?;
                let key = ScanItem::flatten_all(&items);
                if dedup {
                    let contents: BTreeSet<String> = key.iter().cloned().collect();
                    if level_groups.contains(&contents) {
                        continue;
                    }
                    level_groups.push(contents);
                }
                entries.push(Entry::Group { items, key });
            } else {
                let value = format!("{}{}", self.tag_prefix(token.prefix), self.tag_body(token));
                if dedup {
                    if level_tags.contains(&value) {
                        continue;
                    }
                    level_tags.push(value.clone());
                }
                entries.push(Entry::Tag(value));
            }
        }

        if self.options.sort_at_level {
            entries.sort_by(Entry::sort_cmp);
        }

        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Entry::Tag(tag) => out.push(ScanItem::Tag(tag)),
                Entry::Group { items, .. } => out.extend(items),
            }
        }
        Ok(out)
    }

    fn tag_prefix(&self, own: Option<Modifier>) -> &'static str {
        if self.options.strip_prefixes {
            return "";
        }
        if !self.options.distribute_prefixes {
            return own.map_or("", Modifier::as_str);
        }
        let mut chain = self.ancestors.iter().copied().chain(own);
        let first = chain.next();
        match first {
            None => "",
            Some(m) if m == Modifier::MustNot => "-",
            Some(_) if chain.any(|m| m == Modifier::MustNot) => "-",
            Some(_) => "~",
        }
    }

    fn tag_body(&self, token: &Token) -> String {
        match &token.body {
            TokenBody::Tag(tag) if self.options.normalize_at_level => {
                self.aliases.resolve_alias(&normalize_tag_name(tag))
            }
            _ => token.body_text().to_string(),
        }
    }

    fn wrap_group(&self, mut items: Vec<ScanItem>, prefix: Option<Modifier>) -> Vec<ScanItem> {
        let opts = self.options;
        let marker_prefix = if opts.strip_prefixes || opts.distribute_prefixes || opts.discard_group_prefix {
            ""
        } else {
            prefix.map_or("", Modifier::as_str)
        };

        if opts.delimit_groups {
            items.insert(0, ScanItem::Tag(format!("{marker_prefix}(")));
            items.push(ScanItem::from(")"));
            if opts.flatten { items } else { vec![ScanItem::Nested(items)] }
        } else if !marker_prefix.is_empty() {
            if opts.flatten {
                items.insert(0, ScanItem::from(marker_prefix));
                items
            } else {
                vec![ScanItem::from(marker_prefix), ScanItem::Nested(items)]
            }
        } else if opts.flatten {
            items
        } else {
            vec![ScanItem::Nested(items)]
        }
    }
}
