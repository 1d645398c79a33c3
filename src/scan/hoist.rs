//! Hoisting pass
//!
//! Some metatags (`order`, `limit`, `randseed`) mean the same thing wherever
//! they appear, so grouping them is meaningless. This pass lifts them out of
//! any group to the top level, in the order they are encountered, and
//! re-renders the groups that contained them. Groups without hoisted
//! metatags are passed through untouched.

use log::{debug, warn};

use crate::DEPTH_LIMIT;
use crate::grammar::{Group, Modifier, Token, TokenBody, is_empty_group, normalize_query, tokenize};
use crate::metatags::GLOBAL_METATAGS;
use crate::query::error::{QueryError, Result};

/// Options for [`scan_search_with`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoistOptions {
    /// Metatag names to lift out of groups, matched case-insensitively
    pub hoisted_metatags: Vec<String>,
    /// Group levels available, clamped to [`DEPTH_LIMIT`]
    pub depth_limit: usize,
    /// Raise on groups past the limit instead of rendering them empty
    pub error_on_depth_exceeded: bool,
}

impl Default for HoistOptions {
    fn default() -> Self {
        Self {
            hoisted_metatags: GLOBAL_METATAGS.iter().map(ToString::to_string).collect(),
            depth_limit: DEPTH_LIMIT,
            error_on_depth_exceeded: false,
        }
    }
}

/// Hoist global metatags with the default options
///
/// ```
/// use tagq::scan::scan_search;
///
/// assert_eq!(scan_search("( aaa bbb )").unwrap(), vec!["aaa", "bbb"]);
/// assert_eq!(
///     scan_search("aaa ( bbb order:score )").unwrap(),
///     vec!["aaa", "order:score", "( bbb )"]
/// );
/// ```
///
/// # Errors
/// Never with the default options; see [`scan_search_with`].
pub fn scan_search(query: &str) -> Result<Vec<String>> {
    scan_search_with(query, &HoistOptions::default())
}

/// Hoist metatags out of groups and return the top-level token strings
///
/// # Errors
/// Returns `QueryError::DepthExceeded` when a group that must be rewritten is
/// nested past the limit and `error_on_depth_exceeded` is set.
pub fn scan_search_with(query: &str, options: &HoistOptions) -> Result<Vec<String>> {
    let (tokens, _) = hoist_tokens(query, options)?;
    Ok(tokens
        .iter()
        .map(|t| t.text().to_string())
        .collect())
}

/// Hoisting pass producing tokens, for the query builder
///
/// Also returns how many enclosing groups were unwrapped, which counts
/// against the depth budget of whatever is built from the tokens.
pub(crate) fn hoist_tokens(query: &str, options: &HoistOptions) -> Result<(Vec<Token>, usize)> {
    let limit = options.depth_limit.min(DEPTH_LIMIT);
    let mut remaining = limit;
    let mut query = normalize_query(query);

    loop {
        if query.is_empty() || is_empty_group(&query) {
            return Ok((Vec::new(), limit - remaining));
        }
        let tokens = tokenize(&query);
        match tokens.as_slice() {
            [token] if token.prefix.is_none() && token.is_group() => {
                if remaining == 0 {
                    if options.error_on_depth_exceeded {
                        return Err(QueryError::DepthExceeded { limit });
                    }
                    warn!("Query nested deeper than {limit} levels; hoisting nothing");
                    return Ok((Vec::new(), limit));
                }
                remaining -= 1;
                query = token.as_group().map(|g| g.source().to_string()).unwrap_or_default();
            }
            _ => {
                let mut hoister = Hoister {
                    options,
                    limit,
                    remaining,
                    out: Vec::with_capacity(tokens.len()),
                };
                hoister.run(tokens)?;
                return Ok((hoister.out, limit - remaining));
            }
        }
    }
}

struct Hoister<'a> {
    options: &'a HoistOptions,
    limit: usize,
    remaining: usize,
    out: Vec<Token>,
}

impl Hoister<'_> {
    fn run(&mut self, tokens: Vec<Token>) -> Result<()> {
        for token in tokens {
            match token.as_group() {
                Some(group) if self.contains_hoisted(group) => {
                    let rendered = self.rewrite(token.prefix, group, 1)?;
                    debug!("Rewrote group '{}' as '{rendered}'", token.text());
                    self.out.extend(tokenize(&rendered));
                }
                _ => self.out.push(token),
            }
        }
        Ok(())
    }

    fn is_hoisted(&self, token: &Token) -> bool {
        match &token.body {
            TokenBody::Metatag {
                name,
                value,
                quoted,
            } => {
                (*quoted || !value.is_empty())
                    && self
                        .options
                        .hoisted_metatags
                        .iter()
                        .any(|h| h.eq_ignore_ascii_case(name))
            }
            _ => false,
        }
    }

    /// Whether a hoisted metatag appears anywhere inside the group
    fn contains_hoisted(&self, group: &Group) -> bool {
        if self.options.hoisted_metatags.is_empty() {
            return false;
        }
        let mut pending = vec![group.tokens()];
        while let Some(tokens) = pending.pop() {
            for token in tokens {
                match &token.body {
                    TokenBody::Group(inner) => pending.push(inner.tokens()),
                    _ if self.is_hoisted(&token) => return true,
                    _ => {}
                }
            }
        }
        false
    }

    /// Render a group without its hoisted metatags, moving those to the output
    fn rewrite(&mut self, prefix: Option<Modifier>, group: &Group, nesting: usize) -> Result<String> {
        let prefix_str = prefix.map_or("", Modifier::as_str);
        if nesting > self.remaining {
            if self.options.error_on_depth_exceeded {
                return Err(QueryError::DepthExceeded { limit: self.limit });
            }
            warn!("Group nested past {} levels rendered empty while hoisting", self.limit);
            return Ok(Group::render(prefix_str, &[]));
        }

        let mut children = Vec::new();
        for child in group.tokens() {
            match child.as_group() {
                Some(inner) if self.contains_hoisted(inner) => {
                    children.push(self.rewrite(child.prefix, inner, nesting + 1)?);
                }
                _ if self.is_hoisted(&child) => {
                    debug!("Hoisting '{}'", child.text());
                    self.out.push(child);
                }
                _ => children.push(child.text().to_string()),
            }
        }
        Ok(Group::render(prefix_str, &children))
    }
}
