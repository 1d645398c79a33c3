use serde::Serialize;
use std::fmt;
use std::ops::Range;

use super::lexer::tokenize;

/// Leading modifier attached to a tag, metatag or group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    /// `-`: the token must not match
    MustNot,
    /// `~`: the token should match (OR semantics)
    Should,
}

impl Modifier {
    /// Parse a modifier character
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::MustNot),
            '~' => Some(Self::Should),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::MustNot => '-',
            Self::Should => '~',
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MustNot => "-",
            Self::Should => "~",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clause of the boolean query a token contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseType {
    Must,
    MustNot,
    Should,
}

impl ClauseType {
    pub const ALL: [Self; 3] = [Self::Must, Self::MustNot, Self::Should];

    /// Map a token prefix to its clause (`-` → must-not, `~` → should, none → must)
    #[must_use]
    pub const fn from_prefix(prefix: Option<Modifier>) -> Self {
        match prefix {
            None => Self::Must,
            Some(Modifier::MustNot) => Self::MustNot,
            Some(Modifier::Should) => Self::Should,
        }
    }

    /// Suffix appended to a field key for this clause
    #[must_use]
    pub const fn key_suffix(self) -> &'static str {
        match self {
            Self::Must => "",
            Self::MustNot => "_must_not",
            Self::Should => "_should",
        }
    }

    /// Build the full field key for this clause (`post_id` → `post_id_must_not`)
    #[must_use]
    pub fn key(self, field: &str) -> String {
        format!("{field}{}", self.key_suffix())
    }
}

impl From<Option<Modifier>> for ClauseType {
    fn from(prefix: Option<Modifier>) -> Self {
        Self::from_prefix(prefix)
    }
}

/// A single lexed token
///
/// Groups are lexed one level at a time: a group token records its interior
/// source, and [`Group::tokens`] lexes the next level on demand. This keeps
/// lexing cost proportional to how deep a caller is willing to descend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub prefix: Option<Modifier>,
    pub body: TokenBody,
    text: String,
    span: Range<usize>,
}

/// Body of a token, after the optional modifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenBody {
    /// A bare non-whitespace run
    Tag(String),
    /// A `name:value` run, or `name:"quoted value"`
    Metatag {
        name: String,
        value: String,
        quoted: bool,
    },
    /// A balanced `( ... )` group
    Group(Group),
}

/// Interior of a balanced group, whitespace-trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    source: String,
}

impl Token {
    pub(crate) fn new(prefix: Option<Modifier>, body: TokenBody, text: &str, span: Range<usize>) -> Self {
        Self {
            prefix,
            body,
            text: text.to_string(),
            span,
        }
    }

    /// Full source text of the token, including its modifier
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source text without the modifier
    #[must_use]
    pub fn body_text(&self) -> &str {
        if self.prefix.is_some() {
            &self.text[1..]
        } else {
            &self.text
        }
    }

    /// Byte range of the token within the lexed input
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    #[must_use]
    pub const fn clause(&self) -> ClauseType {
        ClauseType::from_prefix(self.prefix)
    }

    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self.body, TokenBody::Group(_))
    }

    #[must_use]
    pub const fn as_group(&self) -> Option<&Group> {
        match &self.body {
            TokenBody::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Prefix as a string slice, empty when absent
    #[must_use]
    pub fn prefix_str(&self) -> &'static str {
        self.prefix.map_or("", Modifier::as_str)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Group {
    pub(crate) fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
        }
    }

    /// Interior text between the delimiting parentheses
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Lex the group's interior into its child tokens
    #[must_use]
    pub fn tokens(&self) -> Vec<Token> {
        tokenize(&self.source)
    }

    /// Render the group with an optional prefix, as `-( a b )`
    #[must_use]
    pub fn render(prefix: &str, children: &[String]) -> String {
        let inner = children
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if inner.is_empty() {
            format!("{prefix}( )")
        } else {
            format!("{prefix}( {inner} )")
        }
    }
}
