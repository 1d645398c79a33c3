//! Hand-written lexer for the query grammar
//!
//! ```text
//! query   → ws* (token ws*)*
//! token   → modifier? body
//! body    → metatag | group | run
//! metatag → word* ':' ( '"' [^"]* '"' | nonspace* )
//! group   → '(' ws+ ( token ws* )* ')'     the ')' must follow whitespace
//! run     → nonspace+
//! ```
//!
//! A `(` only opens a group when whitespace follows it, and a `)` only closes
//! one when whitespace precedes it, so `(foo)` and `bar_(baz)` are plain
//! tags. When no matching close exists the `(` is lexed as a plain run.

use super::token::{Group, Modifier, Token, TokenBody};

/// Whitespace that separates tokens
#[must_use]
pub const fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

const fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Lex one nesting level of a normalized query
///
/// Nested groups are not expanded; see [`Group::tokens`].
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

/// Cursor over a query string
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    fn preceded_by_space(&self) -> bool {
        self.input[..self.pos].chars().next_back().is_some_and(is_space)
    }

    fn skip_space(&mut self) {
        let trimmed = self.rest().trim_start_matches(is_space);
        self.pos = self.input.len() - trimmed.len();
    }

    fn skip_run(&mut self) {
        let len = self.rest().find(is_space).unwrap_or(self.rest().len());
        self.pos += len;
    }

    /// Consume a modifier when a token body follows it
    fn lex_modifier(&mut self) -> Option<Modifier> {
        let modifier = self.peek().and_then(Modifier::from_char)?;
        if self.peek_second().is_some_and(|c| !is_space(c)) {
            self.pos += 1;
            Some(modifier)
        } else {
            None
        }
    }

    fn at_group_open(&self) -> bool {
        self.peek() == Some('(') && self.peek_second().is_some_and(is_space)
    }

    /// `word* ':' ( '"' [^"]* '"' | nonspace* )`
    fn lex_metatag(&mut self) -> Option<TokenBody> {
        let start = self.pos;
        let rest = self.rest();
        let name_len = rest.find(|c: char| !is_word(c)).unwrap_or(rest.len());
        if !rest[name_len..].starts_with(':') {
            return None;
        }
        let name = rest[..name_len].to_string();
        self.pos += name_len + 1;

        let after_colon = self.rest();
        if let Some(quoted) = after_colon.strip_prefix('"')
            && let Some(close) = quoted.find('"')
        {
            self.pos += close + 2;
            return Some(TokenBody::Metatag {
                name,
                value: quoted[..close].to_string(),
                quoted: true,
            });
        }

        self.skip_run();
        let value_start = start + name_len + 1;
        Some(TokenBody::Metatag {
            name,
            value: self.input[value_start..self.pos].to_string(),
            quoted: false,
        })
    }

    /// Find the byte offset just past the `)` closing the group opened at `self.pos`
    ///
    /// Iterative so that nesting depth never grows the call stack. A nested
    /// group that never closes means no enclosing group can close either, so
    /// no backtracking is needed.
    fn find_group_end(&self) -> Option<usize> {
        let mut cursor = Lexer {
            input: self.input,
            pos: self.pos,
        };
        let mut depth = 0usize;
        loop {
            let c = cursor.peek()?;
            if c == ')' && depth > 0 && cursor.preceded_by_space() {
                cursor.pos += 1;
                depth -= 1;
                if depth == 0 {
                    return Some(cursor.pos);
                }
            } else {
                let token_start = cursor.pos;
                cursor.lex_modifier();
                if cursor.at_group_open() {
                    cursor.pos += 1;
                    depth += 1;
                } else if cursor.lex_metatag().is_none() {
                    cursor.pos = token_start;
                    cursor.skip_run();
                }
            }
            cursor.skip_space();
        }
    }

    fn lex_group(&mut self) -> Option<TokenBody> {
        if !self.at_group_open() {
            return None;
        }
        let end = self.find_group_end()?;
        let interior = self.input[self.pos + 1..end - 1].trim_matches(is_space);
        self.pos = end;
        Some(TokenBody::Group(Group::new(interior)))
    }

    fn lex_run(&mut self) -> TokenBody {
        let start = self.pos;
        self.skip_run();
        TokenBody::Tag(self.input[start..self.pos].to_string())
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_space();
        let start = self.pos;
        self.peek()?;

        let prefix = self.lex_modifier();
        let body_start = self.pos;
        let body = match self.lex_metatag() {
            Some(body) => body,
            None => {
                self.pos = body_start;
                match self.lex_group() {
                    Some(body) => body,
                    None => self.lex_run(),
                }
            }
        };
        Some(Token::new(prefix, body, &self.input[start..self.pos], start..self.pos))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        tokenize(input).iter().map(|t| t.text().to_string()).collect()
    }

    #[test]
    fn test_plain_tags() {
        assert_eq!(texts("aaa  bbb\tccc"), vec!["aaa", "bbb", "ccc"]);
    }

    #[test]
    fn test_modifiers() {
        let tokens = tokenize("-aaa ~bbb ccc");
        assert_eq!(tokens[0].prefix, Some(Modifier::MustNot));
        assert_eq!(tokens[0].body_text(), "aaa");
        assert_eq!(tokens[1].prefix, Some(Modifier::Should));
        assert_eq!(tokens[2].prefix, None);
    }

    #[test]
    fn test_lone_modifier_is_a_tag() {
        let tokens = tokenize("- ~");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].prefix, None);
        assert_eq!(tokens[0].body, TokenBody::Tag("-".to_string()));
    }

    #[test]
    fn test_double_modifier_keeps_second_in_body() {
        let tokens = tokenize("--aaa");
        assert_eq!(tokens[0].prefix, Some(Modifier::MustNot));
        assert_eq!(tokens[0].body_text(), "-aaa");
    }

    #[test]
    fn test_quoted_metatag_spans_whitespace() {
        assert_eq!(
            texts(r#"aaa test:"with spaces" def"#),
            vec!["aaa", r#"test:"with spaces""#, "def"]
        );
        let tokens = tokenize(r#"test:"with spaces""#);
        assert_eq!(
            tokens[0].body,
            TokenBody::Metatag {
                name: "test".to_string(),
                value: "with spaces".to_string(),
                quoted: true,
            }
        );
    }

    #[test]
    fn test_empty_quoted_value() {
        let tokens = tokenize(r#"description:"""#);
        assert_eq!(tokens.len(), 1);
        assert!(matches!(&tokens[0].body, TokenBody::Metatag { value, quoted: true, .. } if value.is_empty()));
    }

    #[test]
    fn test_unterminated_quote_falls_back_to_run() {
        let tokens = tokenize(r#"desc:"abc def"#);
        assert_eq!(tokens.len(), 2);
        assert!(matches!(&tokens[0].body, TokenBody::Metatag { value, quoted: false, .. } if value == "\"abc"));
    }

    #[test]
    fn test_group_requires_interior_whitespace() {
        assert_eq!(texts("(foo)"), vec!["(foo)"]);
        assert!(!tokenize("(foo)")[0].is_group());

        let tokens = tokenize("( foo )");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].as_group().map(Group::source), Some("foo"));
    }

    #[test]
    fn test_paren_inside_tag() {
        assert_eq!(texts("( bar_(baz) qux )"), vec!["( bar_(baz) qux )"]);
        let tokens = tokenize("( bar_(baz) qux )");
        let children: Vec<_> = tokens[0].as_group().unwrap().tokens();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].text(), "bar_(baz)");
    }

    #[test]
    fn test_prefixed_group() {
        let tokens = tokenize("~( AAa -BBB* ) -bbb*");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text(), "~( AAa -BBB* )");
        assert_eq!(tokens[0].prefix, Some(Modifier::Should));
        assert_eq!(tokens[1].text(), "-bbb*");
    }

    #[test]
    fn test_nested_groups_lex_one_level() {
        let tokens = tokenize("a ( b ( c d ) ) e");
        assert_eq!(texts("a ( b ( c d ) ) e"), vec!["a", "( b ( c d ) )", "e"]);
        let inner = tokens[1].as_group().unwrap().tokens();
        assert_eq!(inner.len(), 2);
        assert_eq!(inner[1].as_group().map(Group::source), Some("c d"));
    }

    #[test]
    fn test_empty_group() {
        let tokens = tokenize("( )");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].as_group().unwrap().is_empty());
    }

    #[test]
    fn test_quoted_paren_does_not_close_group() {
        let tokens = tokenize(r#"( desc:"a ) b" c ) d"#);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].as_group().map(Group::source), Some(r#"desc:"a ) b" c"#));
    }

    #[test]
    fn test_unclosed_group_is_plain_run() {
        assert_eq!(texts("( a b"), vec!["(", "a", "b"]);
        assert_eq!(texts("( ( a )"), vec!["(", "( a )"]);
    }

    #[test]
    fn test_close_paren_without_whitespace_does_not_close() {
        assert_eq!(texts("( a) b"), vec!["(", "a)", "b"]);
    }

    #[test]
    fn test_spans_cover_token_text() {
        let input = "aaa -( b ) c:d";
        for token in tokenize(input) {
            assert_eq!(&input[token.span()], token.text());
        }
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let depth = 5_000;
        let input = format!("{}a{}", "( ".repeat(depth), " )".repeat(depth));
        let tokens = tokenize(&input);
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_group());
    }
}
