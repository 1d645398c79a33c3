//! Building structured queries
//!
//! [`QueryParser`] turns a query string into a [`Query`]:
//!
//! 1. Global metatags are hoisted out of groups (see [`crate::scan::hoist`]).
//! 2. Each top-level token is counted against the tag budget, unless it
//!    matches one of the configured unlimited patterns.
//! 3. Metatags with a non-blank value go to their handler; everything else
//!    is a plain tag, expanded if it contains `*`.
//! 4. Groups are either only counted and kept as text, or built into
//!    sub-queries when `process_groups` is set.
//! 5. Plain tags are alias-resolved at the end when `resolve_aliases` is set.
//!
//! # Examples
//!
//! ```
//! use tagq::config::QueryConfig;
//! use tagq::query::QueryParser;
//! use tagq::resolve::{NoAliases, NoRecords};
//!
//! let resolver = (NoAliases, NoRecords);
//! let parser = QueryParser::new(QueryConfig::default(), &resolver)?;
//! let query = parser.parse("cat -dog ~bird order:score")?;
//!
//! assert_eq!(query.tags.must, vec!["cat"]);
//! assert_eq!(query.tags.must_not, vec!["dog"]);
//! assert_eq!(query.tags.should, vec!["bird"]);
//! assert_eq!(query.get("order").and_then(|v| v.as_text()), Some("score"));
//! assert_eq!(query.tag_count, 4);
//! # Ok::<(), tagq::query::QueryError>(())
//! ```

pub(crate) mod builder;
pub mod context;
mod dispatch;
pub mod error;
pub mod types;

pub use crate::grammar::ClauseType;
pub use context::ParseContext;
pub use error::{QueryError, Result};
pub use types::{Clauses, FieldValue, GroupEntry, Presence, Query, RangeValue, Value};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use regex::RegexSet;

use crate::config::QueryConfig;
use crate::grammar::{Group, Token, TokenBody};
use crate::metatags::{Metatag, NOT_FOUND_TAG};
use crate::resolve::Resolver;
use crate::scan::hoist::{HoistOptions, hoist_tokens};
use crate::scan::{ScanOptions, scan_recursive};
use builder::QueryBuilder;

/// Compiles query strings with one configuration and resolver
pub struct QueryParser<'r> {
    config: QueryConfig,
    resolver: &'r dyn Resolver,
    unlimited: RegexSet,
    now: DateTime<Utc>,
}

impl<'r> QueryParser<'r> {
    /// # Errors
    /// Returns `QueryError::InvalidPattern` if an unlimited-tag pattern does
    /// not compile.
    pub fn new(config: QueryConfig, resolver: &'r dyn Resolver) -> Result<Self> {
        let unlimited = config.unlimited_matcher()?;
        Ok(Self {
            config,
            resolver,
            unlimited,
            now: Utc::now(),
        })
    }

    /// Fix the time that relative dates and ages are measured from
    #[must_use]
    pub const fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Build a query
    ///
    /// # Errors
    /// - `CountExceeded` when more tags are counted than the budget allows
    /// - `DepthExceeded` when groups nest too deep and the configuration
    ///   asks for an error instead of truncation
    /// - `InvalidMetatagValue` when a metatag value fails coercion
    /// - `PrivilegeDenied` when a set or favorites list is not viewable
    ///
    /// With `return_with_data`, count and depth errors carry the query built
    /// up to the failing token.
    pub fn parse(&self, query: &str) -> Result<Query> {
        self.parse_level(&ParseContext::root(&self.config), query)
    }

    /// Build a query from already split tokens
    ///
    /// # Errors
    /// Same as [`QueryParser::parse`].
    pub fn parse_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Query> {
        let joined = tokens.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
        self.parse(&joined)
    }

    fn aliases(&self, ctx: &ParseContext) -> Option<&dyn Resolver> {
        ctx.resolve_aliases.then_some(self.resolver)
    }

    fn parse_level(&self, ctx: &ParseContext, query: &str) -> Result<Query> {
        let mut builder = QueryBuilder::new();
        let hoist_options = HoistOptions {
            hoisted_metatags: self.config.hoisted_metatags.clone(),
            depth_limit: ctx.remaining_levels(),
            error_on_depth_exceeded: ctx.error_on_depth_exceeded,
        };
        let (tokens, unwrapped) =
            hoist_tokens(query, &hoist_options).map_err(|e| self.attach(ctx, e, &builder))?;
        let ctx = ctx.deeper(unwrapped);
        debug!("Building {} tokens at depth {}", tokens.len(), ctx.depth);

        for token in &tokens {
            let step = match token.as_group() {
                Some(group) => self.add_group(&ctx, &mut builder, token, group),
                None => {
                    if !self.unlimited.is_match(token.text()) {
                        builder.charge(1);
                    }
                    self.add_token(&mut builder, token)
                }
            };
            step.map_err(|e| self.attach(&ctx, e, &builder))?;
            self.check_count(&ctx, &builder)?;
        }

        let query = builder.finish(self.aliases(&ctx));
        debug!("Built query at depth {} with {} counted tags", ctx.depth, query.tag_count);
        Ok(query)
    }

    fn check_count(&self, ctx: &ParseContext, builder: &QueryBuilder) -> Result<()> {
        let max = self.config.max_tags;
        if builder.tag_count() <= max.saturating_sub(ctx.free_tags_count) {
            return Ok(());
        }
        debug!(
            "Tag count {} exceeds {max} with {} reserved",
            builder.tag_count(),
            ctx.free_tags_count
        );
        Err(if ctx.return_with_data {
            QueryError::CountExceededWithData {
                max,
                partial: Box::new(builder.snapshot(self.aliases(ctx))),
            }
        } else {
            QueryError::CountExceeded { max }
        })
    }

    /// Give a depth error this level's limit and, if requested, its partial query
    fn attach(&self, ctx: &ParseContext, err: QueryError, builder: &QueryBuilder) -> QueryError {
        match err {
            QueryError::DepthExceeded { .. } | QueryError::DepthExceededWithData { .. } => {
                if ctx.return_with_data {
                    QueryError::DepthExceededWithData {
                        limit: ctx.depth_limit,
                        partial: Box::new(builder.snapshot(self.aliases(ctx))),
                    }
                } else {
                    QueryError::DepthExceeded {
                        limit: ctx.depth_limit,
                    }
                }
            }
            other => other,
        }
    }

    fn add_group(
        &self,
        ctx: &ParseContext,
        builder: &mut QueryBuilder,
        token: &Token,
        group: &Group,
    ) -> Result<()> {
        let clause = token.clause();

        if !self.config.process_groups {
            let options = ScanOptions {
                flatten: true,
                delimit_groups: false,
                strip_prefixes: true,
                strip_duplicates_at_level: false,
                error_on_depth_exceeded: self.config.count_error_on_depth_exceeded,
                depth_limit: ctx.depth_limit,
                base_depth: ctx.depth - 1,
                ..ScanOptions::default()
            };
            let counted = scan_recursive(token.text(), &options)?.len();
            builder.charge(counted);
            builder.push_group(clause, GroupEntry::Unparsed(group.source().to_string()));
            return Ok(());
        }

        if ctx.group_exceeds_limit() {
            if ctx.error_on_depth_exceeded {
                return Err(QueryError::DepthExceeded {
                    limit: ctx.depth_limit,
                });
            }
            warn!(
                "Group nested past {} levels built as empty: '{}'",
                ctx.depth_limit,
                token.text()
            );
            builder.push_group(clause, GroupEntry::Parsed(Query::default()));
            return Ok(());
        }

        let child = ctx.child(builder.tag_count() + ctx.free_tags_count);
        let entry = match self.parse_level(&child, group.source()) {
            Ok(query) => {
                builder.charge(query.tag_count);
                GroupEntry::Parsed(query)
            }
            Err(err) if err.is_count_exceeded() => {
                let message = err.to_string();
                let query = err.into_partial().unwrap_or_default();
                builder.charge(query.tag_count);
                GroupEntry::Exceeded { message, query }
            }
            Err(err) => return Err(err),
        };
        builder.push_group(clause, entry);
        Ok(())
    }

    fn add_token(&self, builder: &mut QueryBuilder, token: &Token) -> Result<()> {
        let clause = token.clause();
        if let TokenBody::Metatag { name, value, .. } = &token.body
            && !value.trim().is_empty()
            && let Some(metatag) = Metatag::parse(name).filter(|m| m.accepts(clause))
        {
            return self.dispatch(builder, metatag, clause, value);
        }
        self.add_tag(builder, token.text());
        Ok(())
    }

    /// Store a plain tag under the clause its modifier selects
    ///
    /// Negated tags with `*` are expanded into must-not tags; un-negated
    /// ones into should tags. `~` tags are taken literally.
    fn add_tag(&self, builder: &mut QueryBuilder, text: &str) {
        let tag = text.to_lowercase();
        if let Some(negated) = tag.strip_prefix('-').filter(|t| !t.is_empty()) {
            if negated.contains('*') {
                builder.extend_tags(ClauseType::MustNot, self.expand_wildcard(negated));
            } else {
                builder.push_tag(ClauseType::MustNot, negated.to_string());
            }
        } else if let Some(optional) = tag.strip_prefix('~').filter(|t| !t.is_empty()) {
            builder.push_tag(ClauseType::Should, optional.to_string());
        } else if tag.contains('*') {
            builder.extend_tags(ClauseType::Should, self.expand_wildcard(&tag));
        } else {
            builder.push_tag(ClauseType::Must, tag);
        }
    }

    fn expand_wildcard(&self, pattern: &str) -> Vec<String> {
        let matches = self
            .resolver
            .wildcard_tag_matches(pattern, self.config.effective_wildcard_limit());
        if matches.is_empty() {
            debug!("Wildcard '{pattern}' matched no tags");
            vec![NOT_FOUND_TAG.to_string()]
        } else {
            matches
        }
    }
}
