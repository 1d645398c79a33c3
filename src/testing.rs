//! Testing utilities for tagq
//!
//! [`FixtureResolver`] is a small, fully in-memory resolver with a known set
//! of aliases, users, pools, sets and tag counts. Tests across the crate
//! build queries against it so expectations can name concrete ids.
//!
//! Only available when compiled with `cfg(test)`.

use chrono::{DateTime, TimeZone, Utc};

use crate::resolve::{Actor, AliasResolver, AliasTable, RecordLookup, ReferenceIndex};

/// Records behind [`FixtureResolver`]
///
/// - users: `alice` (1), `bob` (2, private favorites), `carol` (3)
/// - pools: `summer_pool` (7)
/// - sets: `public_set` (3), `bobs_private_set` (4, owned by bob),
///   `alices_private_set` (5, owned by alice)
/// - tags: `cat` and friends for wildcard expansion, most used first
const FIXTURE_RECORDS: &str = r#"
[actor]
id = 1

[users]
alice = { id = 1 }
bob = { id = 2, private_favorites = true }
carol = { id = 3 }

[pools]
summer_pool = 7

[sets]
public_set = { id = 3, owner = 2 }
bobs_private_set = { id = 4, owner = 2, public = false }
alices_private_set = { id = 5, owner = 1, public = false }

[tags]
cat = 1200
cat_ears = 300
catgirl = 50
cathedral = 10
dog = 900
unused_cat = 0
"#;

/// In-memory resolver over [`FIXTURE_RECORDS`]
///
/// Aliases: `kitty` → `cat`, `doggo` → `dog`. Searches run as alice (a
/// regular member) unless another actor is set.
///
/// # Examples
/// ```ignore
/// let resolver = FixtureResolver::new();
/// assert_eq!(resolver.resolve_alias("kitty"), "cat");
/// assert_eq!(resolver.lookup_user_id("bob"), Some(2));
/// ```
pub struct FixtureResolver {
    aliases: AliasTable,
    records: ReferenceIndex,
}

impl FixtureResolver {
    /// # Panics
    /// Panics if the fixture data is invalid.
    #[must_use]
    pub fn new() -> Self {
        let mut aliases = AliasTable::new();
        aliases.add_alias("kitty", "cat").expect("Failed to add fixture alias");
        aliases.add_alias("doggo", "dog").expect("Failed to add fixture alias");
        let records = ReferenceIndex::from_toml(FIXTURE_RECORDS).expect("Invalid fixture records");
        Self { aliases, records }
    }

    /// Run searches as a different user
    #[must_use]
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.records = self.records.with_actor(actor);
        self
    }
}

impl Default for FixtureResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AliasResolver for FixtureResolver {
    fn resolve_alias(&self, tag: &str) -> String {
        self.aliases.resolve_alias(tag)
    }
}

impl RecordLookup for FixtureResolver {
    fn lookup_user_id(&self, name: &str) -> Option<i64> {
        self.records.lookup_user_id(name)
    }

    fn lookup_pool_id(&self, name: &str) -> Option<i64> {
        self.records.lookup_pool_id(name)
    }

    fn lookup_set_id(&self, name: &str) -> Option<(i64, bool)> {
        self.records.lookup_set_id(name)
    }

    fn wildcard_tag_matches(&self, pattern: &str, limit: usize) -> Vec<String> {
        self.records.wildcard_tag_matches(pattern, limit)
    }

    fn favorites_hidden(&self, user_id: i64) -> bool {
        self.records.favorites_hidden(user_id)
    }

    fn actor(&self) -> Actor {
        self.records.actor()
    }
}

/// Fixed "now" for date and age tests: 2024-06-15 12:00:00 UTC
///
/// # Panics
/// Never; the timestamp is valid.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
        .single()
        .expect("Invalid fixture timestamp")
}
