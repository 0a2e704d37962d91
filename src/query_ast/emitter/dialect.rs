//! Identifier quoting styles.
//!
//! Quoting is a generation-time choice, not part of the IR, so one query
//! can be emitted for several SQL dialects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::enums::DatabaseType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStyle {
    /// `"name"` (ANSI, PostgreSQL, SQLite)
    #[default]
    DoubleQuote,
    /// `` `name` `` (MySQL)
    Backtick,
    /// `[name]` (SQL Server)
    Bracket,
}

impl QuoteStyle {
    pub fn for_database(db_type: &DatabaseType) -> Self {
        match db_type {
            DatabaseType::SQLite | DatabaseType::PostgreSQL => QuoteStyle::DoubleQuote,
            DatabaseType::MySQL => QuoteStyle::Backtick,
            DatabaseType::MsSQL => QuoteStyle::Bracket,
        }
    }

    /// Quote an identifier, doubling any embedded closing quote.
    pub fn quote_ident(self, ident: &str) -> String {
        match self {
            QuoteStyle::DoubleQuote => format!("\"{}\"", ident.replace('"', "\"\"")),
            QuoteStyle::Backtick => format!("`{}`", ident.replace('`', "``")),
            QuoteStyle::Bracket => format!("[{}]", ident.replace(']', "]]")),
        }
    }
}

impl FromStr for QuoteStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "double" | "double_quote" | "ansi" | "\"" => Ok(QuoteStyle::DoubleQuote),
            "backtick" | "`" => Ok(QuoteStyle::Backtick),
            "bracket" | "[" => Ok(QuoteStyle::Bracket),
            other => Err(format!("unknown quote style '{other}' (expected double, backtick or bracket)")),
        }
    }
}

impl fmt::Display for QuoteStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QuoteStyle::DoubleQuote => "double",
            QuoteStyle::Backtick => "backtick",
            QuoteStyle::Bracket => "bracket",
        })
    }
}

/// Quote a string literal
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_styles() {
        assert_eq!(QuoteStyle::DoubleQuote.quote_ident("mpg"), "\"mpg\"");
        assert_eq!(QuoteStyle::Backtick.quote_ident("mpg"), "`mpg`");
        assert_eq!(QuoteStyle::Bracket.quote_ident("mpg"), "[mpg]");
    }

    #[test]
    fn test_embedded_quotes_are_doubled() {
        assert_eq!(QuoteStyle::DoubleQuote.quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(QuoteStyle::Backtick.quote_ident("a`b"), "`a``b`");
        assert_eq!(QuoteStyle::Bracket.quote_ident("a]b"), "[a]]b]");
        assert_eq!(quote_string("it's"), "'it''s'");
    }

    #[test]
    fn test_database_defaults() {
        assert_eq!(QuoteStyle::for_database(&DatabaseType::MySQL), QuoteStyle::Backtick);
        assert_eq!(QuoteStyle::for_database(&DatabaseType::MsSQL), QuoteStyle::Bracket);
        assert_eq!(QuoteStyle::for_database(&DatabaseType::PostgreSQL), QuoteStyle::DoubleQuote);
    }

    #[test]
    fn test_parse_from_str() {
        assert_eq!("BACKTICK".parse::<QuoteStyle>(), Ok(QuoteStyle::Backtick));
        assert_eq!("ansi".parse::<QuoteStyle>(), Ok(QuoteStyle::DoubleQuote));
        assert!("single".parse::<QuoteStyle>().is_err());
    }
}
