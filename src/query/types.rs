//! The structured search a query compiles to
//!
//! A [`Query`] holds plain tags and groups in three clauses (must, must
//! not, should) and a map of typed metatag fields. Field keys follow the
//! clause: a `width:` metatag lands under `width`, `-width:` under
//! `width_must_not` and `~width:` under `width_should`.
//!
//! # Examples
//!
//! ```
//! use tagq::query::{ClauseType, Query};
//!
//! let mut query = Query::default();
//! query.tags.push_unique(ClauseType::Must, "aaa".to_string());
//! query.tags.push_unique(ClauseType::Must, "aaa".to_string());
//! assert_eq!(query.tags.must, vec!["aaa"]);
//! assert!(query.get("width").is_none());
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::grammar::ClauseType;
use crate::metatags::{LockKind, STATUS_VALUES};
use crate::scan::should_hide_deleted_posts;

/// Comparison parsed from a numeric, date or size metatag value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeValue<T> {
    Eq(T),
    Gt(T),
    Gte(T),
    Lt(T),
    Lte(T),
    /// Inclusive on both ends
    Between(T, T),
    In(Vec<T>),
}

impl<T> RangeValue<T> {
    /// Apply `f` to every bound
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> RangeValue<U> {
        match self {
            Self::Eq(v) => RangeValue::Eq(f(v)),
            Self::Gt(v) => RangeValue::Gt(f(v)),
            Self::Gte(v) => RangeValue::Gte(f(v)),
            Self::Lt(v) => RangeValue::Lt(f(v)),
            Self::Lte(v) => RangeValue::Lte(f(v)),
            Self::Between(lo, hi) => {
                let lo = f(lo);
                RangeValue::Between(lo, f(hi))
            }
            Self::In(values) => RangeValue::In(values.into_iter().map(f).collect()),
        }
    }

    /// Apply a fallible `f` to every bound, stopping at the first `None`
    pub fn try_map<U>(self, mut f: impl FnMut(T) -> Option<U>) -> Option<RangeValue<U>> {
        Some(match self {
            Self::Eq(v) => RangeValue::Eq(f(v)?),
            Self::Gt(v) => RangeValue::Gt(f(v)?),
            Self::Gte(v) => RangeValue::Gte(f(v)?),
            Self::Lt(v) => RangeValue::Lt(f(v)?),
            Self::Lte(v) => RangeValue::Lte(f(v)?),
            Self::Between(lo, hi) => {
                let lo = f(lo)?;
                RangeValue::Between(lo, f(hi)?)
            }
            Self::In(values) => RangeValue::In(values.into_iter().map(f).collect::<Option<_>>()?),
        })
    }

    /// Flip the direction of every comparison
    ///
    /// For values mapped through a decreasing function, like an age turned
    /// into a timestamp.
    #[must_use]
    pub fn invert(self) -> Self {
        match self {
            Self::Gt(v) => Self::Lt(v),
            Self::Gte(v) => Self::Lte(v),
            Self::Lt(v) => Self::Gt(v),
            Self::Lte(v) => Self::Gte(v),
            Self::Between(lo, hi) => Self::Between(hi, lo),
            other => other,
        }
    }
}

/// A single coerced metatag value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Text(String),
    TextList(Vec<String>),
    Lock(LockKind),
    IntRange(RangeValue<i64>),
    FloatRange(RangeValue<f64>),
    TimeRange(RangeValue<DateTime<Utc>>),
}

impl Value {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// `any`/`none` shortcut for presence checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Any,
    None,
}

impl Presence {
    /// Recognize `any` or `none`, case-insensitively
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("any") {
            Some(Self::Any)
        } else if value.eq_ignore_ascii_case("none") {
            Some(Self::None)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn invert(self) -> Self {
        match self {
            Self::Any => Self::None,
            Self::None => Self::Any,
        }
    }
}

/// What a metatag field key holds
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Accumulated values, one per occurrence
    Values(Vec<Value>),
    /// Overwritten on each occurrence
    Single(Value),
    Presence(Presence),
}

impl FieldValue {
    /// Accumulated values, empty for the other shapes
    #[must_use]
    pub fn values(&self) -> &[Value] {
        match self {
            Self::Values(values) => values,
            _ => &[],
        }
    }

    #[must_use]
    pub const fn single(&self) -> Option<&Value> {
        match self {
            Self::Single(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn presence(&self) -> Option<Presence> {
        match self {
            Self::Presence(p) => Some(*p),
            _ => None,
        }
    }

    /// Text of a single-valued field
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.single().and_then(Value::as_text)
    }
}

/// Items split by clause
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clauses<T> {
    pub must: Vec<T>,
    pub must_not: Vec<T>,
    pub should: Vec<T>,
}

impl<T> Default for Clauses<T> {
    fn default() -> Self {
        Self {
            must: Vec::new(),
            must_not: Vec::new(),
            should: Vec::new(),
        }
    }
}

impl<T> Clauses<T> {
    #[must_use]
    pub fn get(&self, clause: ClauseType) -> &[T] {
        match clause {
            ClauseType::Must => &self.must,
            ClauseType::MustNot => &self.must_not,
            ClauseType::Should => &self.should,
        }
    }

    pub fn get_mut(&mut self, clause: ClauseType) -> &mut Vec<T> {
        match clause {
            ClauseType::Must => &mut self.must,
            ClauseType::MustNot => &mut self.must_not,
            ClauseType::Should => &mut self.should,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.must.len() + self.must_not.len() + self.should.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every item with its clause, must first
    pub fn iter(&self) -> impl Iterator<Item = (ClauseType, &T)> {
        ClauseType::ALL
            .into_iter()
            .flat_map(move |clause| self.get(clause).iter().map(move |item| (clause, item)))
    }
}

impl<T: PartialEq> Clauses<T> {
    /// Push unless an equal item is already in that clause
    pub fn push_unique(&mut self, clause: ClauseType, item: T) {
        let items = self.get_mut(clause);
        if !items.contains(&item) {
            items.push(item);
        }
    }
}

/// A group as stored in its parent query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupEntry {
    /// Interior text of a group that was only counted
    Unparsed(String),
    /// Fully built sub-query
    Parsed(Query),
    /// Sub-query that ran over the tag budget, truncated where it stopped
    Exceeded { message: String, query: Query },
}

impl GroupEntry {
    /// Built sub-query, if the group was processed
    #[must_use]
    pub const fn query(&self) -> Option<&Query> {
        match self {
            Self::Parsed(query) | Self::Exceeded { query, .. } => Some(query),
            Self::Unparsed(_) => None,
        }
    }
}

/// A compiled search
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    pub tags: Clauses<String>,
    pub groups: Clauses<GroupEntry>,
    pub metatags: BTreeMap<String, FieldValue>,
    /// Tags counted against the budget, including those inside groups
    pub tag_count: usize,
}

impl Query {
    /// Metatag field by key, such as `width` or `status_must_not`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.metatags.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.metatags.contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.groups.is_empty() && self.metatags.is_empty()
    }

    /// Whether the search should hide deleted posts
    ///
    /// False when `always_show_deleted`, or when this query or any group
    /// below it has a recognized `status` or a negated status.
    #[must_use]
    pub fn hides_deleted(&self, always_show_deleted: bool) -> bool {
        if always_show_deleted {
            return false;
        }
        let has_status = self
            .get("status")
            .and_then(FieldValue::as_text)
            .is_some_and(|s| STATUS_VALUES.contains(&s));
        if has_status || self.contains_key("status_must_not") {
            return false;
        }
        self.groups.iter().all(|(_, entry)| match entry {
            GroupEntry::Unparsed(text) => should_hide_deleted_posts(text, false),
            GroupEntry::Parsed(query) | GroupEntry::Exceeded { query, .. } => query.hides_deleted(false),
        })
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
