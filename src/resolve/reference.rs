//! File-backed record index
//!
//! A TOML file standing in for the site database: the acting user, known
//! users, pools and sets, and tag post counts for wildcard expansion.
//!
//! ```toml
//! [actor]
//! id = 1
//! is_moderator = false
//!
//! [users]
//! alice = { id = 1 }
//! bob = { id = 2, private_favorites = true }
//!
//! [pools]
//! "ichigo_100%" = 7
//!
//! [sets]
//! my_set = { id = 3, owner = 1, public = false }
//!
//! [tags]
//! cat = 1200
//! cat_ears = 300
//! ```

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::error::Result;
use super::{Actor, RecordLookup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    #[serde(default)]
    pub private_favorites: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRecord {
    pub id: i64,
    #[serde(default)]
    pub owner: Option<i64>,
    #[serde(default = "default_public")]
    pub public: bool,
}

const fn default_public() -> bool {
    true
}

/// Records keyed by lowercase name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceIndex {
    #[serde(default)]
    pub actor: Actor,
    #[serde(default)]
    pub users: BTreeMap<String, UserRecord>,
    #[serde(default)]
    pub pools: BTreeMap<String, i64>,
    #[serde(default)]
    pub sets: BTreeMap<String, SetRecord>,
    /// Tag name → post count
    #[serde(default)]
    pub tags: BTreeMap<String, u64>,
}

/// Lowercase, with whitespace as underscores, the way names are stored
fn record_key(name: &str) -> String {
    name.trim().to_lowercase().replace(char::is_whitespace, "_")
}

impl ReferenceIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an index from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let index = Self::from_toml(&content)?;
        debug!(
            "Loaded reference index from {}: {} users, {} pools, {} sets, {} tags",
            path.display(),
            index.users.len(),
            index.pools.len(),
            index.sets.len(),
            index.tags.len()
        );
        Ok(index)
    }

    /// Parse an index from TOML text, normalizing record names
    ///
    /// # Errors
    /// Returns error if the text is not a valid index
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: Self = toml::from_str(content)?;
        Ok(Self {
            actor: raw.actor,
            users: raw.users.into_iter().map(|(k, v)| (record_key(&k), v)).collect(),
            pools: raw.pools.into_iter().map(|(k, v)| (record_key(&k), v)).collect(),
            sets: raw.sets.into_iter().map(|(k, v)| (record_key(&k), v)).collect(),
            tags: raw.tags.into_iter().map(|(k, v)| (record_key(&k), v)).collect(),
        })
    }

    #[must_use]
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = actor;
        self
    }

    fn can_view(&self, set: &SetRecord) -> bool {
        set.public || self.actor.is_moderator || (set.owner.is_some() && set.owner == self.actor.id)
    }
}

impl RecordLookup for ReferenceIndex {
    fn lookup_user_id(&self, name: &str) -> Option<i64> {
        self.users.get(&record_key(name)).map(|u| u.id)
    }

    fn lookup_pool_id(&self, name: &str) -> Option<i64> {
        name.trim()
            .parse()
            .ok()
            .or_else(|| self.pools.get(&record_key(name)).copied())
    }

    fn lookup_set_id(&self, name: &str) -> Option<(i64, bool)> {
        let set = match name.trim().parse::<i64>() {
            Ok(id) => self.sets.values().find(|s| s.id == id),
            Err(_) => self.sets.get(&record_key(name)),
        }?;
        Some((set.id, self.can_view(set)))
    }

    fn wildcard_tag_matches(&self, pattern: &str, limit: usize) -> Vec<String> {
        let source = format!(
            "^{}$",
            pattern
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*")
        );
        let Ok(re) = Regex::new(&source) else {
            return Vec::new();
        };
        let mut matches: Vec<(&String, u64)> = self
            .tags
            .iter()
            .filter(|(name, count)| **count > 0 && re.is_match(name))
            .map(|(name, count)| (name, *count))
            .collect();
        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        matches
            .into_iter()
            .take(limit)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn favorites_hidden(&self, user_id: i64) -> bool {
        let private = self
            .users
            .values()
            .any(|u| u.id == user_id && u.private_favorites);
        private && !self.actor.is_moderator && self.actor.id != Some(user_id)
    }

    fn actor(&self) -> Actor {
        self.actor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INDEX: &str = r#"
[actor]
id = 1

[users]
Alice = { id = 1 }
bob = { id = 2, private_favorites = true }

[pools]
"Ichigo 100%" = 7

[sets]
mine = { id = 3, owner = 1, public = false }
theirs = { id = 4, owner = 2, public = false }
open = { id = 5 }

[tags]
cat = 1200
cat_ears = 300
catgirl = 300
caterpillar = 0
dog = 50
"#;

    fn index() -> ReferenceIndex {
        ReferenceIndex::from_toml(INDEX).unwrap()
    }

    #[test]
    fn test_user_lookup_case_insensitive() {
        assert_eq!(index().lookup_user_id("alice"), Some(1));
        assert_eq!(index().lookup_user_id("BOB"), Some(2));
        assert_eq!(index().lookup_user_id("carol"), None);
    }

    #[test]
    fn test_pool_lookup_by_name_or_id() {
        assert_eq!(index().lookup_pool_id("ichigo_100%"), Some(7));
        assert_eq!(index().lookup_pool_id("42"), Some(42));
        assert_eq!(index().lookup_pool_id("nothing"), None);
    }

    #[test]
    fn test_set_visibility() {
        let idx = index();
        assert_eq!(idx.lookup_set_id("mine"), Some((3, true)));
        assert_eq!(idx.lookup_set_id("theirs"), Some((4, false)));
        assert_eq!(idx.lookup_set_id("5"), Some((5, true)));
        assert_eq!(idx.lookup_set_id("missing"), None);

        let moderator = index().with_actor(Actor::moderator(9));
        assert_eq!(moderator.lookup_set_id("theirs"), Some((4, true)));
    }

    #[test]
    fn test_wildcard_ordering_and_limit() {
        let idx = index();
        assert_eq!(idx.wildcard_tag_matches("cat*", 10), vec!["cat", "cat_ears", "catgirl"]);
        assert_eq!(idx.wildcard_tag_matches("cat*", 2), vec!["cat", "cat_ears"]);
        assert_eq!(idx.wildcard_tag_matches("*g*", 10), vec!["catgirl", "dog"]);
        assert!(idx.wildcard_tag_matches("zebra*", 10).is_empty());
    }

    #[test]
    fn test_wildcard_escapes_regex_characters() {
        let idx = ReferenceIndex::from_toml("[tags]\n\"a.b\" = 1\naxb = 1\n").unwrap();
        assert_eq!(idx.wildcard_tag_matches("a.*", 10), vec!["a.b"]);
    }

    #[test]
    fn test_favorites_hidden() {
        let idx = index();
        assert!(idx.favorites_hidden(2));
        assert!(!idx.favorites_hidden(1));
        assert!(!index().with_actor(Actor::member(2)).favorites_hidden(2));
        assert!(!index().with_actor(Actor::moderator(9)).favorites_hidden(2));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reference.toml");
        std::fs::write(&path, INDEX).unwrap();

        let idx = ReferenceIndex::load(&path).unwrap();
        assert_eq!(idx.actor(), Actor::member(1));
        assert_eq!(idx.tags.len(), 5);
    }
}
