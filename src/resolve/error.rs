use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// I/O error when reading/writing an alias or reference file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Circular alias reference detected
    #[error("Circular alias detected: {0}")]
    CircularAlias(String),

    /// Tag name that cannot be aliased (blank, or with a modifier or wildcard)
    #[error("Invalid tag format: {0}")]
    InvalidTag(String),

    /// Alias already exists
    #[error("Alias '{0}' already exists for '{1}'")]
    AliasExists(String, String),

    /// Alias not found in the table
    #[error("Alias '{0}' not found")]
    AliasNotFound(String),
}

/// Type alias for cleaner function signatures
pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
