//! Per-metatag handlers
//!
//! Each recognized metatag coerces its value and stores it under its field.
//! Most accumulate one value per occurrence under the clause-specific key;
//! a few (`md5`, `order`, `status`, ...) are single-valued and overwrite.

use log::{trace, warn};

use super::QueryParser;
use super::builder::QueryBuilder;
use super::error::{QueryError, Result};
use super::types::{Presence, Value};
use crate::grammar::ClauseType;
use crate::metatags::value::{
    collapse_wildcards, parse_age_range, parse_boolean, parse_date_range, parse_filesize_range,
    parse_float_range, parse_fudged_float_range, parse_int, parse_int_range, parse_ratio_range,
};
use crate::metatags::{INVALID_ID, LockKind, MAX_LIST_ITEMS, Metatag, STATUS_VALUES};

impl QueryParser<'_> {
    /// Store one metatag occurrence
    ///
    /// `value` is non-blank with enclosing quotes already removed.
    pub(super) fn dispatch(
        &self,
        builder: &mut QueryBuilder,
        metatag: Metatag,
        clause: ClauseType,
        value: &str,
    ) -> Result<()> {
        let name = metatag.name();
        let field = metatag.field();

        if let Some((any_none, presence)) = metatag.any_none_field().zip(Presence::parse(value)) {
            builder.set_presence(clause, any_none, presence);
            return Ok(());
        }

        let value = match metatag {
            Metatag::User
            | Metatag::Approver
            | Metatag::Commenter
            | Metatag::Noter
            | Metatag::NoteUpdater => Value::Int(self.user_id_or_invalid(value)),
            Metatag::UserId | Metatag::Parent => Value::Int(parse_int(&name, value)?),
            Metatag::Pool => Value::Int(self.resolver.lookup_pool_id(value).unwrap_or(INVALID_ID)),
            Metatag::Set => Value::Int(self.set_id(value)?),
            Metatag::Fav => Value::Int(self.favorites_user_id(value)?),
            Metatag::Md5 => {
                let hashes = value
                    .to_lowercase()
                    .split(',')
                    .filter(|h| !h.is_empty())
                    .take(MAX_LIST_ITEMS)
                    .map(str::to_string)
                    .collect();
                builder.set(&field, Value::TextList(hashes));
                return Ok(());
            }
            Metatag::Rating => Value::Text(
                value
                    .chars()
                    .next()
                    .map_or_else(|| "miss".to_string(), |c| c.to_lowercase().to_string()),
            ),
            Metatag::Locked => Value::Lock(
                LockKind::try_from(value).map_err(|reason| QueryError::invalid(&name, value, reason))?,
            ),
            Metatag::RatingLocked | Metatag::NoteLocked | Metatag::StatusLocked => {
                let kind = match metatag {
                    Metatag::RatingLocked => LockKind::Rating,
                    Metatag::NoteLocked => LockKind::Note,
                    _ => LockKind::Status,
                };
                let clause = if parse_boolean(value) {
                    ClauseType::Must
                } else {
                    ClauseType::MustNot
                };
                builder.push_value(clause, &field, Value::Lock(kind));
                return Ok(());
            }
            Metatag::Id
            | Metatag::Width
            | Metatag::Height
            | Metatag::Score
            | Metatag::FavCount
            | Metatag::Change
            | Metatag::TagCount
            | Metatag::CategoryTags(_) => Value::IntRange(parse_int_range(&name, value)?),
            Metatag::Mpixels => Value::FloatRange(parse_fudged_float_range(&name, value)?),
            Metatag::Ratio => Value::FloatRange(parse_ratio_range(&name, value)?),
            Metatag::Duration => Value::FloatRange(parse_float_range(&name, value)?),
            Metatag::Filesize => Value::IntRange(parse_filesize_range(&name, value)?),
            Metatag::Source => Value::Text(collapse_wildcards(&format!("{value}*"))),
            Metatag::Date => Value::TimeRange(parse_date_range(&name, value, self.now)?),
            Metatag::Age => Value::TimeRange(parse_age_range(&name, value, self.now)?),
            Metatag::Child => {
                builder.set(&field, Value::Text(value.to_lowercase()));
                return Ok(());
            }
            Metatag::RandSeed => {
                builder.set(&field, Value::Int(parse_int(&name, value)?));
                return Ok(());
            }
            Metatag::Order => {
                builder.set(&field, Value::Text(value.to_lowercase()));
                return Ok(());
            }
            Metatag::Limit => {
                trace!("Ignoring limit:{value}");
                return Ok(());
            }
            Metatag::Status => {
                let status = value.to_lowercase();
                if STATUS_VALUES.contains(&status.as_str()) {
                    builder.set(&clause.key(&field), Value::Text(status));
                } else {
                    trace!("Ignoring unknown status '{value}'");
                }
                return Ok(());
            }
            Metatag::Filetype => Value::Text(value.to_lowercase()),
            Metatag::Description | Metatag::Note => Value::Text(value.to_string()),
            Metatag::DelReason => {
                builder.set_default("status", Value::Text("any".to_string()));
                Value::Text(collapse_wildcards(value))
            }
            Metatag::DeletedBy => {
                builder.set_default("status", Value::Text("any".to_string()));
                Value::Int(self.user_id_or_invalid(value))
            }
            Metatag::Upvote | Metatag::Downvote | Metatag::Voted => Value::Int(self.voter_id(value)),
            Metatag::CommentCount => {
                builder.set(&field, Value::IntRange(parse_int_range(&name, value)?));
                return Ok(());
            }
            Metatag::Boolean(_) => {
                builder.set(&field, Value::Bool(parse_boolean(value)));
                return Ok(());
            }
        };

        builder.push_value(clause, &field, value);
        Ok(())
    }

    /// User id by name, or by `!id`
    fn user_id(&self, value: &str) -> Option<i64> {
        match value.strip_prefix('!') {
            Some(id) => id.parse().ok(),
            None => self.resolver.lookup_user_id(value),
        }
    }

    fn user_id_or_invalid(&self, value: &str) -> i64 {
        self.user_id(value).unwrap_or(INVALID_ID)
    }

    fn set_id(&self, value: &str) -> Result<i64> {
        match self.resolver.lookup_set_id(value) {
            None => Ok(INVALID_ID),
            Some((_, false)) => {
                warn!("Set '{value}' is not viewable by the current user");
                Err(QueryError::PrivilegeDenied {
                    resource: format!("set '{value}'"),
                })
            }
            Some((id, true)) => Ok(id),
        }
    }

    fn favorites_user_id(&self, value: &str) -> Result<i64> {
        match self.user_id(value) {
            None => Ok(INVALID_ID),
            Some(id) if self.resolver.favorites_hidden(id) => {
                warn!("Favorites of '{value}' are hidden from the current user");
                Err(QueryError::PrivilegeDenied {
                    resource: format!("favorites of '{value}'"),
                })
            }
            Some(id) => Ok(id),
        }
    }

    /// Moderators may search anyone's votes; members only their own
    fn voter_id(&self, value: &str) -> i64 {
        let actor = self.resolver.actor();
        let id = if actor.is_moderator {
            self.user_id(value)
        } else {
            actor.id
        };
        id.unwrap_or(INVALID_ID)
    }
}
