//! Configuration module for tagq
//!
//! `QueryConfig` holds the knobs the query builder reads; `TagqConfig` wraps
//! it with the file locations the CLI needs. Configuration is stored in the
//! user's config directory as `tagq/config.toml` and can be overridden per
//! key from `TAGQ_`-prefixed environment variables, e.g.
//! `TAGQ_QUERY__MAX_TAGS=20`.

use config::{Config, ConfigError, Environment, File, FileFormat};
use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::DEPTH_LIMIT;
use crate::metatags::GLOBAL_METATAGS;

/// Query builder settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct QueryConfig {
    /// Tags that can be searched per query
    pub max_tags: usize,

    /// Budget the caller reserves for tags of its own
    pub free_tags_count: usize,

    /// Levels of grouping allowed, capped at the hard limit of 10
    pub depth_limit: usize,

    /// Build groups into sub-queries instead of only counting their tags
    pub process_groups: bool,

    /// Normalize tags through the alias table once the query is built
    pub resolve_aliases: bool,

    /// Attach the partial query to count and depth errors
    pub return_with_data: bool,

    /// Raise while hoisting when a group is nested too deep, instead of
    /// dropping its contents
    pub error_on_depth_exceeded: bool,

    /// Raise while counting the tags of a flat group that is nested too deep
    pub count_error_on_depth_exceeded: bool,

    /// Metatags lifted out of groups
    pub hoisted_metatags: Vec<String>,

    /// Patterns for tokens that never count against `max_tags`, matched
    /// case-insensitively against the whole token
    pub unlimited_tags: Vec<String>,

    /// Maximum tags a wildcard expands to; defaults to `max_tags`
    pub wildcard_limit: Option<usize>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_tags: 40,
            free_tags_count: 0,
            depth_limit: DEPTH_LIMIT,
            process_groups: false,
            resolve_aliases: true,
            return_with_data: false,
            error_on_depth_exceeded: false,
            count_error_on_depth_exceeded: true,
            hoisted_metatags: GLOBAL_METATAGS.iter().map(ToString::to_string).collect(),
            unlimited_tags: vec![
                r"^-?status:deleted$".to_string(),
                r"^rating:s.*$".to_string(),
                r"^limit:.+$".to_string(),
            ],
            wildcard_limit: None,
        }
    }
}

impl QueryConfig {
    /// Depth limit clamped to [`DEPTH_LIMIT`]
    #[must_use]
    pub fn effective_depth_limit(&self) -> usize {
        self.depth_limit.min(DEPTH_LIMIT)
    }

    #[must_use]
    pub fn effective_wildcard_limit(&self) -> usize {
        self.wildcard_limit.unwrap_or(self.max_tags)
    }

    /// Compile the unlimited-tag patterns
    ///
    /// # Errors
    ///
    /// Returns `regex::Error` if a pattern is not a valid regular expression.
    pub fn unlimited_matcher(&self) -> Result<RegexSet, regex::Error> {
        RegexSetBuilder::new(&self.unlimited_tags)
            .case_insensitive(true)
            .build()
    }
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TagqConfig {
    pub query: QueryConfig,

    /// Alias table; `aliases.toml` next to the config file when unset
    pub aliases_file: Option<PathBuf>,

    /// Record index for user, pool and set lookups
    pub reference_file: Option<PathBuf>,

    /// Never hide deleted posts by default
    pub always_show_deleted: bool,

    /// Lifetime of cached lookups, in seconds
    pub cache_ttl_secs: u64,
}

impl Default for TagqConfig {
    fn default() -> Self {
        Self {
            query: QueryConfig::default(),
            aliases_file: None,
            reference_file: None,
            always_show_deleted: false,
            cache_ttl_secs: 300,
        }
    }
}

impl TagqConfig {
    /// Get the tagq config directory
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("tagq"))
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))
    }

    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location, creating it if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, or created.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific file, with environment overrides
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, cannot be parsed, or
    /// holds values of the wrong type.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(
                Environment::with_prefix("TAGQ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Save configuration to the default location
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be determined or
    /// the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Alias table location
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no file is configured and the config
    /// directory cannot be determined.
    pub fn aliases_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.aliases_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("aliases.toml")),
        }
    }
}
