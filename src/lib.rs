//! tagq - A search-query compiler for tag-based content indexes
//!
//! This library turns free-form search strings such as
//! `cat -dog ~( rating:s score:>10 ) order:score` into structured queries a
//! search backend can execute: plain tags split into must, must-not and
//! should clauses, typed metatag fields, sub-queries for groups, and a count
//! of how many tags the search costs.
//!
//! # Layout
//!
//! - [`grammar`]: normalization and tokenization
//! - [`scan`]: flat and recursive scanners, hoisting, metatag lookups
//! - [`metatags`]: the recognized metatags and their value coercions
//! - [`query`]: the query builder with count and depth guards
//! - [`resolve`]: aliases, record lookups and caching
//! - [`config`]: file-backed configuration
//!
//! # Examples
//!
//! ```
//! use tagq::{QueryConfig, QueryParser};
//! use tagq::resolve::{AliasTable, NoRecords};
//!
//! let mut aliases = AliasTable::new();
//! aliases.add_alias("kitty", "cat")?;
//! let resolver = (aliases, NoRecords);
//!
//! let parser = QueryParser::new(QueryConfig::default(), &resolver)?;
//! let query = parser.parse("kitty ( width:>100 -dog )")?;
//!
//! assert_eq!(query.tags.must, vec!["cat"]);
//! assert_eq!(query.tag_count, 3);
//! # Ok::<(), tagq::TagqError>(())
//! ```

use thiserror::Error;

pub mod cli;
pub mod config;
pub mod grammar;
pub mod metatags;
pub mod output;
pub mod query;
pub mod resolve;
pub mod scan;

#[cfg(test)]
pub mod testing;

pub use config::{QueryConfig, TagqConfig};
pub use query::{Query, QueryError, QueryParser};

/// Hard limit on group nesting; configured limits are clamped to it
pub const DEPTH_LIMIT: usize = 10;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum TagqError {
    /// Query compilation error
    #[error(transparent)]
    Query(#[from] QueryError),
    /// Alias table or reference data error
    #[error("Resolver error: {0}")]
    Resolve(#[from] resolve::ResolveError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for cleaner function signatures
pub type Result<T> = std::result::Result<T, TagqError>;
