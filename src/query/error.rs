//! Query compilation errors
//!
//! Count and depth violations each come in two flavours. The plain variants
//! are raised when the caller only needs to reject the search; the
//! `WithData` variants carry the partially built [`Query`] so a caller can
//! still show something useful (a truncated preview, the offending group).

use thiserror::Error;

use super::types::Query;
use crate::DEPTH_LIMIT;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Too many counted tags for the configured budget
    #[error("You cannot search for more than {max} tags at a time")]
    CountExceeded { max: usize },

    /// Too many counted tags, with the query built so far
    #[error("You cannot search for more than {max} tags at a time")]
    CountExceededWithData { max: usize, partial: Box<Query> },

    /// Groups nested deeper than the configured limit
    #[error("You cannot have more than {limit} levels of grouping at a time")]
    DepthExceeded { limit: usize },

    /// Groups nested too deep, with the query built so far
    #[error("You cannot have more than {limit} levels of grouping at a time")]
    DepthExceededWithData { limit: usize, partial: Box<Query> },

    /// A metatag value failed coercion
    #[error("Invalid value '{value}' for metatag '{metatag}': {reason}")]
    InvalidMetatagValue {
        metatag: String,
        value: String,
        reason: String,
    },

    /// The acting user cannot view a referenced resource
    #[error("Access denied: {resource}")]
    PrivilegeDenied { resource: String },

    /// An unlimited-tag pattern in the configuration failed to compile
    #[error("Invalid unlimited tag pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl QueryError {
    /// Build a [`QueryError::InvalidMetatagValue`]
    pub fn invalid(metatag: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMetatagValue {
            metatag: metatag.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Depth error at the default limit
    #[must_use]
    pub const fn depth_exceeded() -> Self {
        Self::DepthExceeded { limit: DEPTH_LIMIT }
    }

    /// Partial query carried by the `WithData` variants
    #[must_use]
    pub fn partial(&self) -> Option<&Query> {
        match self {
            Self::CountExceededWithData { partial, .. }
            | Self::DepthExceededWithData { partial, .. } => Some(partial),
            _ => None,
        }
    }

    /// Consume the error, returning its partial query if any
    #[must_use]
    pub fn into_partial(self) -> Option<Query> {
        match self {
            Self::CountExceededWithData { partial, .. }
            | Self::DepthExceededWithData { partial, .. } => Some(*partial),
            _ => None,
        }
    }

    /// Tag count reached before the error, when known
    #[must_use]
    pub fn tag_count(&self) -> Option<usize> {
        self.partial().map(|q| q.tag_count)
    }

    #[must_use]
    pub const fn is_count_exceeded(&self) -> bool {
        matches!(
            self,
            Self::CountExceeded { .. } | Self::CountExceededWithData { .. }
        )
    }

    #[must_use]
    pub const fn is_depth_exceeded(&self) -> bool {
        matches!(
            self,
            Self::DepthExceeded { .. } | Self::DepthExceededWithData { .. }
        )
    }
}

/// Type alias for cleaner function signatures
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
