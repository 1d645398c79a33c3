//! Command-line interface definitions and parsing
//!
//! This module defines the CLI structure for tagq using the `clap` crate.
//! The binary is an inspector for the query compiler: it shows what a search
//! string compiles to at each stage.
//!
//! # Commands
//!
//! - **parse**: build the structured query and print it as JSON
//! - **scan**: run the flat or recursive scanner
//! - **hoist**: show the top-level tokens after hoisting global metatags
//! - **normalize**: canonical form of a query
//! - **hide-deleted**: whether the search hides deleted posts
//! - **alias**: manage the alias table (add, remove, list)
//!
//! Query arguments are joined with spaces, so both `tagq parse "a -b"` and
//! `tagq parse a -b` work.
//!
//! # Examples
//!
//! ```
//! use clap::Parser;
//! use tagq::cli::{Cli, Commands};
//!
//! let cli = Cli::parse_from(["tagq", "--max-tags", "6", "parse", "cat", "-dog"]);
//! assert_eq!(cli.max_tags, Some(6));
//! assert_eq!(cli.command.query_text(), Some("cat -dog".to_string()));
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::QueryConfig;
use crate::scan::ScanOptions;

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "tagq")]
#[command(about = "Inspect how search queries compile", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the user config directory)
    #[arg(short = 'c', long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Suppress informational output (only print results)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Override the tag budget
    #[arg(long = "max-tags", value_name = "N", global = true)]
    pub max_tags: Option<usize>,

    /// Build groups into sub-queries
    #[arg(long = "process-groups", global = true)]
    pub process_groups: bool,
}

/// Query text given as one or more arguments
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Search query; multiple arguments are joined with spaces
    #[arg(
        value_name = "QUERY",
        required = true,
        num_args = 1..,
        allow_hyphen_values = true,
        trailing_var_arg = true
    )]
    pub query: Vec<String>,
}

impl QueryArgs {
    #[must_use]
    pub fn text(&self) -> String {
        self.query.join(" ")
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build a query and print it as JSON
    #[command(visible_alias = "p")]
    Parse {
        /// Print a readable summary instead of JSON
        #[arg(short = 's', long = "summary")]
        summary: bool,

        /// Pretty-print the JSON
        #[arg(long = "pretty")]
        pretty: bool,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Scan a query into tokens
    Scan {
        #[command(flatten)]
        options: ScanArgs,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Lift global metatags out of groups and print the top-level tokens
    Hoist {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Print the canonical form of a query
    #[command(visible_alias = "n")]
    Normalize {
        /// Keep groups instead of treating parentheses as tags
        #[arg(short = 'g', long = "grouped")]
        grouped: bool,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Print whether the search hides deleted posts
    #[command(name = "hide-deleted")]
    HideDeleted {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Manage tag aliases
    Alias {
        #[command(subcommand)]
        command: AliasCommands,
    },
}

impl Commands {
    /// Query text of commands that take one
    #[must_use]
    pub fn query_text(&self) -> Option<String> {
        match self {
            Self::Parse { query, .. }
            | Self::Scan { query, .. }
            | Self::Hoist { query }
            | Self::Normalize { query, .. }
            | Self::HideDeleted { query } => Some(query.text()),
            Self::Alias { .. } => None,
        }
    }
}

/// Scanner flags for the `scan` command
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ScanArgs {
    /// Expand groups instead of scanning flat
    #[arg(short = 'r', long = "recursive")]
    pub recursive: bool,

    /// Keep nested groups instead of flattening them
    #[arg(long = "nested", requires = "recursive")]
    pub nested: bool,

    /// Drop `-`/`~` modifiers
    #[arg(long = "strip-prefixes", requires = "recursive")]
    pub strip_prefixes: bool,

    /// Push group modifiers down onto their tags
    #[arg(long = "distribute-prefixes", requires = "recursive")]
    pub distribute_prefixes: bool,

    /// Drop repeated tags and groups within a level
    #[arg(long = "dedup", requires = "recursive")]
    pub dedup: bool,

    /// Leave out the `(`/`)` markers around groups
    #[arg(long = "no-delimit", requires = "recursive")]
    pub no_delimit: bool,

    /// Sort each level
    #[arg(long = "sort", requires = "recursive")]
    pub sort: bool,

    /// Normalize and alias-resolve tags
    #[arg(long = "normalize", requires = "recursive")]
    pub normalize: bool,

    /// Fail on groups nested too deep instead of scanning them as empty
    #[arg(long = "strict", requires = "recursive")]
    pub strict: bool,
}

impl ScanArgs {
    #[must_use]
    pub fn scan_options(&self, depth_limit: usize) -> ScanOptions {
        ScanOptions {
            flatten: !self.nested,
            strip_prefixes: self.strip_prefixes,
            distribute_prefixes: self.distribute_prefixes,
            strip_duplicates_at_level: self.dedup,
            delimit_groups: !self.no_delimit,
            sort_at_level: self.sort,
            normalize_at_level: self.normalize,
            error_on_depth_exceeded: self.strict,
            depth_limit,
            ..ScanOptions::default()
        }
    }
}

/// Alias management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AliasCommands {
    /// Add an alias for a canonical tag
    Add {
        /// Alias name (e.g. kitty)
        alias: String,

        /// Canonical tag (e.g. cat)
        canonical: String,
    },

    /// Remove an alias
    #[command(visible_alias = "rm")]
    Remove {
        /// Alias to remove
        alias: String,
    },

    /// List all aliases
    #[command(visible_alias = "ls")]
    List,
}

impl Cli {
    /// Parse command-line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Apply command-line overrides to the query settings
    pub fn apply_overrides(&self, config: &mut QueryConfig) {
        if let Some(max_tags) = self.max_tags {
            config.max_tags = max_tags;
        }
        if self.process_groups {
            config.process_groups = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_arguments_joined() {
        let cli = Cli::parse_from(["tagq", "parse", "cat", "-dog", "~( a b )"]);
        assert_eq!(cli.command.query_text(), Some("cat -dog ~( a b )".to_string()));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["tagq", "hoist", "--verbose", "( a order:id )"]);
        assert!(cli.verbose);
        assert_eq!(cli.command.query_text(), Some("( a order:id )".to_string()));
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from(["tagq", "--max-tags", "5", "--process-groups", "parse", "a"]);
        let mut config = QueryConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.max_tags, 5);
        assert!(config.process_groups);

        let cli = Cli::parse_from(["tagq", "parse", "a"]);
        let mut config = QueryConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.max_tags, 40);
        assert!(!config.process_groups);
    }

    #[test]
    fn test_scan_options() {
        let cli = Cli::parse_from(["tagq", "scan", "-r", "--nested", "--dedup", "--no-delimit", "a"]);
        let Commands::Scan { options, .. } = cli.command else {
            panic!("expected scan");
        };
        let scan = options.scan_options(4);
        assert!(!scan.flatten);
        assert!(scan.strip_duplicates_at_level);
        assert!(!scan.delimit_groups);
        assert_eq!(scan.depth_limit, 4);
    }

    #[test]
    fn test_scan_flags_require_recursive() {
        assert!(Cli::try_parse_from(["tagq", "scan", "--sort", "a"]).is_err());
    }

    #[test]
    fn test_alias_commands() {
        let cli = Cli::parse_from(["tagq", "alias", "add", "kitty", "cat"]);
        assert!(matches!(
            cli.command,
            Commands::Alias { command: AliasCommands::Add { ref alias, ref canonical } }
                if alias == "kitty" && canonical == "cat"
        ));
        assert!(cli.command.query_text().is_none());

        let cli = Cli::parse_from(["tagq", "alias", "rm", "kitty"]);
        assert!(matches!(cli.command, Commands::Alias { command: AliasCommands::Remove { .. } }));
    }
}
