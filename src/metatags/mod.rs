//! The closed set of recognized metatags
//!
//! Every `name:value` token whose name (case-insensitive, aliases included)
//! appears here is dispatched to a typed field of the query; anything else is
//! searched as a plain tag. Whether a metatag accepts a `-`/`~` modifier is
//! part of its definition: a modifier on a metatag that does not accept it
//! turns the whole token into a plain tag.

pub mod value;

use serde::Serialize;
use std::borrow::Cow;

use crate::grammar::ClauseType;

/// Metatags that mean the same thing at any depth and are hoisted out of groups
pub const GLOBAL_METATAGS: &[&str] = &["order", "limit", "randseed"];

/// Recognized values of the `status` metatag
///
/// `any` and `all` are equivalent; `modqueue` is pending or flagged, `active`
/// is neither pending, flagged nor deleted.
pub const STATUS_VALUES: &[&str] = &["all", "any", "pending", "flagged", "modqueue", "deleted", "active"];

/// Sentinel id for lookups that are blank or resolve to nothing
pub const INVALID_ID: i64 = -1;

/// Sentinel tag standing in for a wildcard that matched nothing
pub const NOT_FOUND_TAG: &str = "~~not_found~~";

/// Maximum entries accepted in a comma-separated list value
pub const MAX_LIST_ITEMS: usize = 100;

/// Tag categories that have a `{short}tags` count metatag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagCategory {
    General,
    Artist,
    Contributor,
    Copyright,
    Character,
    Species,
    Invalid,
    Meta,
    Lore,
}

impl TagCategory {
    pub const ALL: [Self; 9] = [
        Self::General,
        Self::Artist,
        Self::Contributor,
        Self::Copyright,
        Self::Character,
        Self::Species,
        Self::Invalid,
        Self::Meta,
        Self::Lore,
    ];

    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::General => "gen",
            Self::Artist => "art",
            Self::Contributor => "contrib",
            Self::Copyright => "copy",
            Self::Character => "char",
            Self::Species => "spec",
            Self::Invalid => "inv",
            Self::Meta => "meta",
            Self::Lore => "lore",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Artist => "artist",
            Self::Contributor => "contributor",
            Self::Copyright => "copyright",
            Self::Character => "character",
            Self::Species => "species",
            Self::Invalid => "invalid",
            Self::Meta => "meta",
            Self::Lore => "lore",
        }
    }

    #[must_use]
    pub fn from_short_name(short: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.short_name() == short)
    }
}

/// Single-valued boolean metatags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanMetatag {
    HasSource,
    HasDescription,
    IsParent,
    IsChild,
    InPool,
    PendingReplacements,
    ArtVerified,
}

impl BooleanMetatag {
    pub const ALL: [Self; 7] = [
        Self::HasSource,
        Self::HasDescription,
        Self::IsParent,
        Self::IsChild,
        Self::InPool,
        Self::PendingReplacements,
        Self::ArtVerified,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HasSource => "hassource",
            Self::HasDescription => "hasdescription",
            Self::IsParent => "isparent",
            Self::IsChild => "ischild",
            Self::InPool => "inpool",
            Self::PendingReplacements => "pending_replacements",
            Self::ArtVerified => "artverified",
        }
    }
}

/// Lockable post attributes for `locked:` and the `*locked` metatags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
    Rating,
    Note,
    Status,
}

impl TryFrom<&str> for LockKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "rating" => Ok(Self::Rating),
            "note" | "notes" => Ok(Self::Note),
            "status" => Ok(Self::Status),
            other => Err(format!("unknown lock '{other}', expected rating, note or status")),
        }
    }
}

/// A recognized metatag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metatag {
    User,
    UserId,
    Approver,
    Commenter,
    Noter,
    NoteUpdater,
    Pool,
    Set,
    Fav,
    Md5,
    Rating,
    Locked,
    RatingLocked,
    NoteLocked,
    StatusLocked,
    Id,
    Width,
    Height,
    Mpixels,
    Ratio,
    Duration,
    Score,
    FavCount,
    Filesize,
    Change,
    Source,
    Date,
    Age,
    TagCount,
    CategoryTags(TagCategory),
    Parent,
    Child,
    RandSeed,
    Order,
    Limit,
    Status,
    Filetype,
    Description,
    Note,
    DelReason,
    DeletedBy,
    Upvote,
    Downvote,
    Voted,
    CommentCount,
    Boolean(BooleanMetatag),
}

impl Metatag {
    /// Look up a metatag by name, case-insensitively, without its modifier
    ///
    /// ```
    /// use tagq::metatags::Metatag;
    ///
    /// assert_eq!(Metatag::parse("ID"), Some(Metatag::Id));
    /// assert_eq!(Metatag::parse("comm"), Some(Metatag::Commenter));
    /// assert_eq!(Metatag::parse("-id"), None);
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        let metatag = match name.as_str() {
            "user" => Self::User,
            "user_id" => Self::UserId,
            "approver" => Self::Approver,
            "commenter" | "comm" => Self::Commenter,
            "noter" => Self::Noter,
            "noteupdater" => Self::NoteUpdater,
            "pool" => Self::Pool,
            "set" => Self::Set,
            "fav" | "favoritedby" => Self::Fav,
            "md5" => Self::Md5,
            "rating" => Self::Rating,
            "locked" => Self::Locked,
            "ratinglocked" => Self::RatingLocked,
            "notelocked" => Self::NoteLocked,
            "statuslocked" => Self::StatusLocked,
            "id" => Self::Id,
            "width" => Self::Width,
            "height" => Self::Height,
            "mpixels" => Self::Mpixels,
            "ratio" => Self::Ratio,
            "duration" => Self::Duration,
            "score" => Self::Score,
            "favcount" => Self::FavCount,
            "filesize" => Self::Filesize,
            "change" => Self::Change,
            "source" => Self::Source,
            "date" => Self::Date,
            "age" => Self::Age,
            "tagcount" => Self::TagCount,
            "parent" => Self::Parent,
            "child" => Self::Child,
            "randseed" => Self::RandSeed,
            "order" => Self::Order,
            "limit" => Self::Limit,
            "status" => Self::Status,
            "filetype" | "type" => Self::Filetype,
            "description" => Self::Description,
            "note" => Self::Note,
            "delreason" => Self::DelReason,
            "deletedby" => Self::DeletedBy,
            "upvote" | "votedup" => Self::Upvote,
            "downvote" | "voteddown" => Self::Downvote,
            "voted" => Self::Voted,
            "comment_count" => Self::CommentCount,
            other => {
                if let Some(category) = other
                    .strip_suffix("tags")
                    .and_then(TagCategory::from_short_name)
                {
                    Self::CategoryTags(category)
                } else {
                    return BooleanMetatag::ALL
                        .into_iter()
                        .find(|b| b.name() == other)
                        .map(Self::Boolean);
                }
            }
        };
        Some(metatag)
    }

    /// Canonical name, as used in error messages
    #[must_use]
    pub fn name(self) -> Cow<'static, str> {
        let name = match self {
            Self::User => "user",
            Self::UserId => "user_id",
            Self::Approver => "approver",
            Self::Commenter => "commenter",
            Self::Noter => "noter",
            Self::NoteUpdater => "noteupdater",
            Self::Pool => "pool",
            Self::Set => "set",
            Self::Fav => "fav",
            Self::Md5 => "md5",
            Self::Rating => "rating",
            Self::Locked => "locked",
            Self::RatingLocked => "ratinglocked",
            Self::NoteLocked => "notelocked",
            Self::StatusLocked => "statuslocked",
            Self::Id => "id",
            Self::Width => "width",
            Self::Height => "height",
            Self::Mpixels => "mpixels",
            Self::Ratio => "ratio",
            Self::Duration => "duration",
            Self::Score => "score",
            Self::FavCount => "favcount",
            Self::Filesize => "filesize",
            Self::Change => "change",
            Self::Source => "source",
            Self::Date => "date",
            Self::Age => "age",
            Self::TagCount => "tagcount",
            Self::CategoryTags(category) => return Cow::Owned(format!("{}tags", category.short_name())),
            Self::Parent => "parent",
            Self::Child => "child",
            Self::RandSeed => "randseed",
            Self::Order => "order",
            Self::Limit => "limit",
            Self::Status => "status",
            Self::Filetype => "filetype",
            Self::Description => "description",
            Self::Note => "note",
            Self::DelReason => "delreason",
            Self::DeletedBy => "deletedby",
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
            Self::Voted => "voted",
            Self::CommentCount => "comment_count",
            Self::Boolean(boolean) => boolean.name(),
        };
        Cow::Borrowed(name)
    }

    /// Query field the metatag's values are stored under
    #[must_use]
    pub fn field(self) -> Cow<'static, str> {
        let field = match self {
            Self::User | Self::UserId => "uploader_ids",
            Self::Approver => "approver_ids",
            Self::Commenter => "commenter_ids",
            Self::Noter => "noter_ids",
            Self::NoteUpdater => "note_updater_ids",
            Self::Pool => "pool_ids",
            Self::Set => "set_ids",
            Self::Fav => "fav_ids",
            Self::Locked | Self::RatingLocked | Self::NoteLocked | Self::StatusLocked => "locked",
            Self::Id => "post_id",
            Self::FavCount => "fav_count",
            Self::Change => "change_seq",
            Self::Source => "sources",
            Self::TagCount => "post_tag_count",
            Self::CategoryTags(category) => {
                return Cow::Owned(format!("{}_tag_count", category.name()));
            }
            Self::Parent => "parent_ids",
            Self::RandSeed => "random_seed",
            Self::DeletedBy => "deleter",
            _ => return self.name(),
        };
        Cow::Borrowed(field)
    }

    /// Field holding the `any`/`none` shortcut, for metatags that have one
    #[must_use]
    pub const fn any_none_field(self) -> Option<&'static str> {
        match self {
            Self::Approver => Some("approver"),
            Self::Commenter => Some("commenter"),
            Self::Noter => Some("noter"),
            Self::Pool => Some("pool"),
            Self::Source => Some("source"),
            Self::Parent => Some("parent"),
            _ => None,
        }
    }

    /// Whether the metatag takes `-`/`~` modifiers
    #[must_use]
    pub const fn is_negatable(self) -> bool {
        !matches!(
            self,
            Self::Md5
                | Self::Order
                | Self::Limit
                | Self::Child
                | Self::RandSeed
                | Self::RatingLocked
                | Self::NoteLocked
                | Self::StatusLocked
                | Self::CommentCount
                | Self::Boolean(_)
        )
    }

    /// Whether the metatag can be dispatched under the given clause
    #[must_use]
    pub const fn accepts(self, clause: ClauseType) -> bool {
        match (self, clause) {
            (Self::Status, ClauseType::Should) => false,
            (_, ClauseType::Must) => true,
            _ => self.is_negatable(),
        }
    }
}
