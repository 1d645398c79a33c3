use log::trace;

use super::types::{FieldValue, GroupEntry, Presence, Query, Value};
use crate::grammar::ClauseType;
use crate::resolve::Resolver;

/// Accumulates one level of a query
#[derive(Debug, Default)]
pub(crate) struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) const fn tag_count(&self) -> usize {
        self.query.tag_count
    }

    pub(crate) fn charge(&mut self, tags: usize) {
        self.query.tag_count += tags;
    }

    pub(crate) fn push_tag(&mut self, clause: ClauseType, tag: String) {
        trace!("{clause:?} tag '{tag}'");
        self.query.tags.push_unique(clause, tag);
    }

    pub(crate) fn extend_tags(&mut self, clause: ClauseType, tags: Vec<String>) {
        for tag in tags {
            self.push_tag(clause, tag);
        }
    }

    pub(crate) fn push_group(&mut self, clause: ClauseType, entry: GroupEntry) {
        self.query.groups.get_mut(clause).push(entry);
    }

    /// Append to the accumulated values of `field` under `clause`
    pub(crate) fn push_value(&mut self, clause: ClauseType, field: &str, value: Value) {
        let key = clause.key(field);
        trace!("{key} += {value:?}");
        let entry = self
            .query
            .metatags
            .entry(key)
            .or_insert_with(|| FieldValue::Values(Vec::new()));
        match entry {
            FieldValue::Values(values) => values.push(value),
            other => *other = FieldValue::Values(vec![value]),
        }
    }

    /// Record an `any`/`none` shortcut
    ///
    /// Negation flips the presence instead of using a `_must_not` key.
    pub(crate) fn set_presence(&mut self, clause: ClauseType, field: &str, presence: Presence) {
        let (key, presence) = match clause {
            ClauseType::Must => (field.to_string(), presence),
            ClauseType::MustNot => (field.to_string(), presence.invert()),
            ClauseType::Should => (clause.key(field), presence),
        };
        trace!("{key} = {presence:?}");
        self.query.metatags.insert(key, FieldValue::Presence(presence));
    }

    /// Overwrite a single-valued field
    pub(crate) fn set(&mut self, key: &str, value: Value) {
        trace!("{key} = {value:?}");
        self.query.metatags.insert(key.to_string(), FieldValue::Single(value));
    }

    /// Set a single-valued field unless it is already present
    pub(crate) fn set_default(&mut self, key: &str, value: Value) {
        self.query
            .metatags
            .entry(key.to_string())
            .or_insert(FieldValue::Single(value));
    }

    /// Copy of the query so far, aliases resolved if requested
    pub(crate) fn snapshot(&self, aliases: Option<&dyn Resolver>) -> Query {
        let mut query = self.query.clone();
        if let Some(aliases) = aliases {
            resolve_tag_aliases(&mut query, aliases);
        }
        query
    }

    pub(crate) fn finish(mut self, aliases: Option<&dyn Resolver>) -> Query {
        if let Some(aliases) = aliases {
            resolve_tag_aliases(&mut self.query, aliases);
        }
        self.query
    }
}

/// Replace every plain tag with its canonical name, dropping duplicates
fn resolve_tag_aliases(query: &mut Query, aliases: &dyn Resolver) {
    for clause in ClauseType::ALL {
        let tags = std::mem::take(query.tags.get_mut(clause));
        for tag in tags {
            query.tags.push_unique(clause, aliases.resolve_alias(&tag));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixtureResolver;

    #[test]
    fn test_push_value_accumulates_per_clause() {
        let mut builder = QueryBuilder::new();
        builder.push_value(ClauseType::Must, "width", Value::Int(1));
        builder.push_value(ClauseType::Must, "width", Value::Int(2));
        builder.push_value(ClauseType::MustNot, "width", Value::Int(3));
        let query = builder.finish(None);
        assert_eq!(query.get("width").unwrap().values().len(), 2);
        assert_eq!(query.get("width_must_not").unwrap().values(), &[Value::Int(3)]);
    }

    #[test]
    fn test_presence_negation_flips() {
        let mut builder = QueryBuilder::new();
        builder.set_presence(ClauseType::MustNot, "pool", Presence::Any);
        builder.set_presence(ClauseType::Should, "source", Presence::None);
        let query = builder.finish(None);
        assert_eq!(query.get("pool").unwrap().presence(), Some(Presence::None));
        assert_eq!(query.get("source_should").unwrap().presence(), Some(Presence::None));
    }

    #[test]
    fn test_set_default_keeps_existing() {
        let mut builder = QueryBuilder::new();
        builder.set("status", Value::Text("pending".into()));
        builder.set_default("status", Value::Text("any".into()));
        let query = builder.finish(None);
        assert_eq!(query.get("status").unwrap().as_text(), Some("pending"));
    }

    #[test]
    fn test_alias_resolution_dedups() {
        let mut builder = QueryBuilder::new();
        builder.push_tag(ClauseType::Must, "kitty".into());
        builder.push_tag(ClauseType::Must, "cat".into());
        builder.push_tag(ClauseType::Must, "cat".into());

        let resolver = FixtureResolver::new();
        let snapshot = builder.snapshot(Some(&resolver));
        assert_eq!(snapshot.tags.must, vec!["cat"]);

        let raw = builder.finish(None);
        assert_eq!(raw.tags.must, vec!["kitty", "cat"]);
    }
}
