use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::AliasResolver;
use super::error::{ResolveError, Result};
use crate::grammar::normalize_tag_name;

/// Tag alias table (e.g. "kitty" → "cat")
///
/// Names are normalized (lowercase, underscores for whitespace) on the way
/// in. Chains resolve to their end: with `a → b` and `b → c`, `a` resolves
/// to `c`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AliasTable {
    /// Maps alias → canonical tag
    #[serde(default)]
    pub aliases: HashMap<String, String>,

    /// Maps canonical tag → set of aliases
    #[serde(skip)]
    reverse_aliases: HashMap<String, HashSet<String>>,

    /// Path to the alias file for persistence
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl AliasTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load aliases from a TOML file, or start empty if it doesn't exist
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed, or if
    /// it contains an alias cycle.
    pub fn load(path: &Path) -> Result<Self> {
        let mut table = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let raw: Self = toml::from_str(&content)?;
            let mut table = Self::new();
            for (alias, canonical) in raw.aliases {
                table.add_alias(&alias, &canonical)?;
            }
            debug!("Loaded {} aliases from {}", table.aliases.len(), path.display());
            table
        } else {
            Self::new()
        };
        table.path = Some(path.to_path_buf());
        Ok(table)
    }

    /// Save aliases to the path they were loaded from
    ///
    /// # Errors
    /// Returns error if the path is not set or the file cannot be written
    pub fn save(&self) -> Result<()> {
        let path = self.path.as_ref().ok_or_else(|| {
            ResolveError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Alias file path not set",
            ))
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Add an alias mapping
    ///
    /// # Errors
    /// Returns error if:
    /// - Either name is blank or starts with a modifier, or contains a wildcard
    /// - The alias already exists with a different canonical tag
    /// - Adding the alias would create a cycle
    pub fn add_alias(&mut self, alias: &str, canonical: &str) -> Result<()> {
        let alias = normalize_tag_name(alias);
        let canonical = normalize_tag_name(canonical);
        for name in [&alias, &canonical] {
            if name.is_empty() || name.starts_with(['-', '~']) || name.contains('*') {
                return Err(ResolveError::InvalidTag(name.clone()));
            }
        }

        if let Some(existing) = self.aliases.get(&alias) {
            if *existing != canonical {
                return Err(ResolveError::AliasExists(alias, existing.clone()));
            }
            return Ok(());
        }

        if alias == canonical || self.would_create_cycle(&alias, &canonical) {
            return Err(ResolveError::CircularAlias(format!(
                "Adding alias '{alias}' → '{canonical}' would create circular reference"
            )));
        }

        self.reverse_aliases
            .entry(canonical.clone())
            .or_default()
            .insert(alias.clone());
        self.aliases.insert(alias, canonical);
        Ok(())
    }

    /// Remove an alias
    ///
    /// # Errors
    /// Returns error if the alias doesn't exist
    pub fn remove_alias(&mut self, alias: &str) -> Result<()> {
        let alias = normalize_tag_name(alias);
        let canonical = self
            .aliases
            .remove(&alias)
            .ok_or_else(|| ResolveError::AliasNotFound(alias.clone()))?;

        if let Some(aliases) = self.reverse_aliases.get_mut(&canonical) {
            aliases.remove(&alias);
            if aliases.is_empty() {
                self.reverse_aliases.remove(&canonical);
            }
        }
        Ok(())
    }

    /// Resolve a tag to its canonical form, or itself if it has no alias
    #[must_use]
    pub fn canonicalize(&self, tag: &str) -> String {
        let mut current = tag;
        // Cycles are rejected on insert; the bound only guards a corrupt table
        for _ in 0..=self.aliases.len() {
            match self.aliases.get(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        current.to_string()
    }

    /// Direct aliases of a canonical tag
    #[must_use]
    pub fn get_aliases(&self, canonical: &str) -> Vec<String> {
        let mut aliases: Vec<String> = self
            .reverse_aliases
            .get(canonical)
            .map_or_else(Vec::new, |set| set.iter().cloned().collect());
        aliases.sort();
        aliases
    }

    /// All aliases as sorted `(alias, canonical)` pairs
    #[must_use]
    pub fn list_aliases(&self) -> Vec<(String, String)> {
        let mut aliases: Vec<_> = self
            .aliases
            .iter()
            .map(|(alias, canonical)| (alias.clone(), canonical.clone()))
            .collect();
        aliases.sort();
        aliases
    }

    /// Whether `canonical` already resolves back to `alias`
    fn would_create_cycle(&self, alias: &str, canonical: &str) -> bool {
        let mut visited = HashSet::new();
        let mut current = canonical;

        while let Some(next) = self.aliases.get(current) {
            if next == alias || !visited.insert(current.to_string()) {
                return true;
            }
            current = next;
        }
        false
    }
}

impl AliasResolver for AliasTable {
    fn resolve_alias(&self, tag: &str) -> String {
        self.canonicalize(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_add_alias() {
        let mut table = AliasTable::new();
        table.add_alias("kitty", "cat").unwrap();

        assert_eq!(table.canonicalize("kitty"), "cat");
        assert_eq!(table.canonicalize("cat"), "cat");
        assert_eq!(table.resolve_alias("dog"), "dog");
    }

    #[test]
    fn test_names_normalized() {
        let mut table = AliasTable::new();
        table.add_alias("Big Cat", "Lion").unwrap();
        assert_eq!(table.canonicalize("big_cat"), "lion");
    }

    #[test]
    fn test_chains_resolve_to_end() {
        let mut table = AliasTable::new();
        table.add_alias("a", "b").unwrap();
        table.add_alias("b", "c").unwrap();
        assert_eq!(table.canonicalize("a"), "c");
    }

    #[test]
    fn test_duplicate_alias() {
        let mut table = AliasTable::new();
        table.add_alias("kitty", "cat").unwrap();
        table.add_alias("kitty", "cat").unwrap();

        let result = table.add_alias("kitty", "feline");
        assert!(matches!(result, Err(ResolveError::AliasExists(_, _))));
    }

    #[test]
    fn test_circular_alias() {
        let mut table = AliasTable::new();
        table.add_alias("a", "b").unwrap();
        table.add_alias("b", "c").unwrap();

        assert!(matches!(table.add_alias("c", "a"), Err(ResolveError::CircularAlias(_))));
        assert!(matches!(table.add_alias("d", "d"), Err(ResolveError::CircularAlias(_))));
    }

    #[test]
    fn test_invalid_names() {
        let mut table = AliasTable::new();
        for (alias, canonical) in [("-cat", "dog"), ("cat", "~dog"), ("c*t", "cat"), ("  ", "cat")] {
            assert!(
                matches!(table.add_alias(alias, canonical), Err(ResolveError::InvalidTag(_))),
                "'{alias}' → '{canonical}' should be rejected"
            );
        }
    }

    #[test]
    fn test_remove_alias() {
        let mut table = AliasTable::new();
        table.add_alias("kitty", "cat").unwrap();
        table.add_alias("neko", "cat").unwrap();

        table.remove_alias("kitty").unwrap();
        assert_eq!(table.canonicalize("kitty"), "kitty");
        assert_eq!(table.get_aliases("cat"), vec!["neko"]);
        assert!(matches!(table.remove_alias("kitty"), Err(ResolveError::AliasNotFound(_))));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("aliases.toml");

        let mut table = AliasTable::load(&path).unwrap();
        assert!(table.list_aliases().is_empty());
        table.add_alias("kitty", "cat").unwrap();
        table.add_alias("pup", "dog").unwrap();
        table.save().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[aliases]"));
        assert!(content.contains("kitty = \"cat\""));

        let loaded = AliasTable::load(&path).unwrap();
        assert_eq!(
            loaded.list_aliases(),
            vec![
                ("kitty".to_string(), "cat".to_string()),
                ("pup".to_string(), "dog".to_string())
            ]
        );
    }

    #[test]
    fn test_load_rejects_cycles() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("aliases.toml");
        fs::write(&path, "[aliases]\na = \"b\"\nb = \"a\"\n").unwrap();

        assert!(matches!(AliasTable::load(&path), Err(ResolveError::CircularAlias(_))));
    }
}
