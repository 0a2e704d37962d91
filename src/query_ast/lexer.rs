//! Tokenization on top of `sqlparser`'s tokenizer.
//!
//! Only the words this grammar reserves are treated as keywords; every
//! other word (including ones sqlparser knows, like `name` or `year`) is
//! an identifier. Quoted words are never keywords.

use sqlparser::dialect::Dialect;
use sqlparser::tokenizer::{Token, Tokenizer, Word};

use super::errors::{ParseError, Position};

/// Accepts `"quoted"`, `` `quoted` `` and `[quoted]` identifiers so every
/// quote style the emitter produces reads back.
#[derive(Debug, Default)]
struct QueryDialect;

impl Dialect for QueryDialect {
    fn is_identifier_start(&self, ch: char) -> bool {
        ch.is_alphabetic() || ch == '_'
    }

    fn is_identifier_part(&self, ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_'
    }

    fn is_delimited_identifier_start(&self, ch: char) -> bool {
        matches!(ch, '"' | '`' | '[')
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Lexeme {
    pub token: Token,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Select,
    From,
    Where,
    Group,
    By,
    Order,
    Asc,
    Desc,
    Limit,
    As,
    And,
    Or,
    Not,
    True,
    False,
    Null,
    // Recognized only to be rejected as unsupported clauses.
    Having,
    Offset,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Cross,
    Union,
    Intersect,
    Except,
    Window,
    Qualify,
    Fetch,
}

impl Keyword {
    pub fn from_word(word: &Word) -> Option<Keyword> {
        if word.quote_style.is_some() {
            return None;
        }
        let kw = match word.value.to_ascii_uppercase().as_str() {
            "SELECT" => Keyword::Select,
            "FROM" => Keyword::From,
            "WHERE" => Keyword::Where,
            "GROUP" => Keyword::Group,
            "BY" => Keyword::By,
            "ORDER" => Keyword::Order,
            "ASC" => Keyword::Asc,
            "DESC" => Keyword::Desc,
            "LIMIT" => Keyword::Limit,
            "AS" => Keyword::As,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "NOT" => Keyword::Not,
            "TRUE" => Keyword::True,
            "FALSE" => Keyword::False,
            "NULL" => Keyword::Null,
            "HAVING" => Keyword::Having,
            "OFFSET" => Keyword::Offset,
            "JOIN" => Keyword::Join,
            "INNER" => Keyword::Inner,
            "LEFT" => Keyword::Left,
            "RIGHT" => Keyword::Right,
            "FULL" => Keyword::Full,
            "CROSS" => Keyword::Cross,
            "UNION" => Keyword::Union,
            "INTERSECT" => Keyword::Intersect,
            "EXCEPT" => Keyword::Except,
            "WINDOW" => Keyword::Window,
            "QUALIFY" => Keyword::Qualify,
            "FETCH" => Keyword::Fetch,
            _ => return None,
        };
        Some(kw)
    }

    /// Keywords that open a clause, supported or not.
    pub fn is_clause(self) -> bool {
        !matches!(
            self,
            Keyword::By
                | Keyword::Asc
                | Keyword::Desc
                | Keyword::As
                | Keyword::And
                | Keyword::Or
                | Keyword::Not
                | Keyword::True
                | Keyword::False
                | Keyword::Null
        )
    }
}

impl Lexeme {
    pub fn keyword(&self) -> Option<Keyword> {
        match &self.token {
            Token::Word(w) => Keyword::from_word(w),
            _ => None,
        }
    }

    /// Non-keyword word, quoted or not.
    pub fn identifier(&self) -> Option<&str> {
        match &self.token {
            Token::Word(w) if Keyword::from_word(w).is_none() => Some(&w.value),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        format!("'{}'", self.token)
    }
}

/// Tokens with positions, whitespace and comments removed.
pub(crate) fn tokenize(sql: &str) -> Result<Vec<Lexeme>, ParseError> {
    let dialect = QueryDialect;
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize_with_location()
        .map_err(|e| ParseError::Tokenize { message: e.message, position: e.location.into() })?;
    Ok(tokens
        .into_iter()
        .filter(|t| !matches!(t.token, Token::Whitespace(_) | Token::EOF))
        .map(|t| Lexeme { token: t.token, position: t.location.into() })
        .collect())
}

/// Position just past the last character, used for "end of input" diagnostics.
pub(crate) fn end_position(sql: &str) -> Position {
    let line = sql.matches('\n').count() as u64 + 1;
    let last_line = sql.rsplit('\n').next().unwrap_or("");
    Position::new(line, last_line.chars().count() as u64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_are_one_based() {
        let lexemes = tokenize("SELECT FROM mtcars").unwrap();
        assert_eq!(lexemes.len(), 3);
        assert_eq!(lexemes[0].position, Position::new(1, 1));
        assert_eq!(lexemes[1].position, Position::new(1, 8));
        assert_eq!(lexemes[1].keyword(), Some(Keyword::From));
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let lexemes = tokenize("select Group bY").unwrap();
        let kws: Vec<_> = lexemes.iter().map(|l| l.keyword()).collect();
        assert_eq!(kws, vec![Some(Keyword::Select), Some(Keyword::Group), Some(Keyword::By)]);
    }

    #[test]
    fn test_quoted_words_are_identifiers() {
        let lexemes = tokenize("\"order\" `group` name").unwrap();
        assert_eq!(lexemes[0].identifier(), Some("order"));
        assert_eq!(lexemes[1].identifier(), Some("group"));
        assert_eq!(lexemes[2].identifier(), Some("name"));
    }

    #[test]
    fn test_comments_and_whitespace_are_dropped() {
        let lexemes = tokenize("SELECT -- pick one\n  hp").unwrap();
        assert_eq!(lexemes.len(), 2);
        assert_eq!(lexemes[1].position, Position::new(2, 3));
    }

    #[test]
    fn test_unterminated_string_fails() {
        let err = tokenize("SELECT 'abc").unwrap_err();
        assert!(matches!(err, ParseError::Tokenize { .. }));
    }

    #[test]
    fn test_end_position() {
        assert_eq!(end_position("SELECT"), Position::new(1, 7));
        assert_eq!(end_position("SELECT\nhp"), Position::new(2, 3));
    }
}
