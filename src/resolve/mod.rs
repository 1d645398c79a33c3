//! Lookups the query builder needs from the outside world
//!
//! The builder never touches storage directly. It asks an [`AliasResolver`]
//! for canonical tag names and a [`RecordLookup`] for user, pool and set ids,
//! wildcard matches and the acting user. Anything implementing both is a
//! [`Resolver`]; a pair `(aliases, lookup)` is one too.
//!
//! Implementations provided here:
//!
//! - [`AliasTable`]: aliases from a TOML file
//! - [`ReferenceIndex`]: records from a TOML file
//! - [`CachedLookup`]: a TTL cache in front of any lookup
//! - [`NoAliases`] and [`NoRecords`]: resolve nothing
//!
//! # Examples
//!
//! ```
//! use tagq::resolve::{AliasResolver, AliasTable, NoRecords, RecordLookup, Resolver};
//!
//! let mut aliases = AliasTable::new();
//! aliases.add_alias("kitty", "cat")?;
//! let resolver = (aliases, NoRecords);
//!
//! assert_eq!(resolver.resolve_alias("kitty"), "cat");
//! assert_eq!(resolver.lookup_user_id("alice"), None);
//! # Ok::<(), tagq::resolve::ResolveError>(())
//! ```

pub mod aliases;
pub mod cache;
pub mod error;
pub mod reference;

pub use aliases::AliasTable;
pub use cache::CachedLookup;
pub use error::{ResolveError, Result};
pub use reference::ReferenceIndex;

use serde::{Deserialize, Serialize};

/// Maps tag names to their canonical form
pub trait AliasResolver {
    /// Canonical name for `tag`, or `tag` itself
    fn resolve_alias(&self, tag: &str) -> String;
}

/// Identity resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAliases;

impl AliasResolver for NoAliases {
    fn resolve_alias(&self, tag: &str) -> String {
        tag.to_string()
    }
}

/// The user a search runs as
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// `None` for anonymous searches
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub is_moderator: bool,
}

impl Actor {
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            id: None,
            is_moderator: false,
        }
    }

    #[must_use]
    pub const fn member(id: i64) -> Self {
        Self {
            id: Some(id),
            is_moderator: false,
        }
    }

    #[must_use]
    pub const fn moderator(id: i64) -> Self {
        Self {
            id: Some(id),
            is_moderator: true,
        }
    }
}

/// Record lookups used by the metatag handlers
pub trait RecordLookup {
    /// User id by name
    fn lookup_user_id(&self, name: &str) -> Option<i64>;

    /// Pool id by name or numeric id
    fn lookup_pool_id(&self, name: &str) -> Option<i64>;

    /// Set id by short name or numeric id, with whether the actor may view it
    fn lookup_set_id(&self, name: &str) -> Option<(i64, bool)>;

    /// Up to `limit` existing tags matching a `*` pattern, most used first
    fn wildcard_tag_matches(&self, pattern: &str, limit: usize) -> Vec<String>;

    /// Whether the user's favorites are hidden from the actor
    fn favorites_hidden(&self, _user_id: i64) -> bool {
        false
    }

    fn actor(&self) -> Actor {
        Actor::anonymous()
    }
}

/// Lookup that finds nothing, for searches without a backing index
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRecords;

impl RecordLookup for NoRecords {
    fn lookup_user_id(&self, _name: &str) -> Option<i64> {
        None
    }

    fn lookup_pool_id(&self, name: &str) -> Option<i64> {
        name.parse().ok()
    }

    fn lookup_set_id(&self, name: &str) -> Option<(i64, bool)> {
        name.parse().ok().map(|id| (id, true))
    }

    fn wildcard_tag_matches(&self, _pattern: &str, _limit: usize) -> Vec<String> {
        Vec::new()
    }
}

/// Everything the query builder needs
pub trait Resolver: AliasResolver + RecordLookup {}

impl<T: AliasResolver + RecordLookup + ?Sized> Resolver for T {}

impl<A: AliasResolver, L> AliasResolver for (A, L) {
    fn resolve_alias(&self, tag: &str) -> String {
        self.0.resolve_alias(tag)
    }
}

impl<A, L: RecordLookup> RecordLookup for (A, L) {
    fn lookup_user_id(&self, name: &str) -> Option<i64> {
        self.1.lookup_user_id(name)
    }

    fn lookup_pool_id(&self, name: &str) -> Option<i64> {
        self.1.lookup_pool_id(name)
    }

    fn lookup_set_id(&self, name: &str) -> Option<(i64, bool)> {
        self.1.lookup_set_id(name)
    }

    fn wildcard_tag_matches(&self, pattern: &str, limit: usize) -> Vec<String> {
        self.1.wildcard_tag_matches(pattern, limit)
    }

    fn favorites_hidden(&self, user_id: i64) -> bool {
        self.1.favorites_hidden(user_id)
    }

    fn actor(&self) -> Actor {
        self.1.actor()
    }
}
