use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// 1-based line/column of a token in the SQL source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u64,
    pub column: u64,
}

impl Position {
    pub fn new(line: u64, column: u64) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

impl From<sqlparser::tokenizer::Location> for Position {
    fn from(loc: sqlparser::tokenizer::Location) -> Self {
        Self { line: loc.line, column: loc.column }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected clause {found} at {position}")]
    UnexpectedClause { found: String, position: Position },
    #[error("expected {expected}, found {found} at {position}")]
    UnexpectedToken { expected: String, found: String, position: Position },
    #[error("unknown function {name} at {position}")]
    UnknownFunction { name: String, position: Position },
    #[error("ORDER BY key {name} at {position} is neither an output column nor a group key")]
    UnboundAlias { name: String, position: Position },
    #[error("trailing input {found} at {position}")]
    TrailingInput { found: String, position: Position },
    #[error("projection {item} at {position} is neither a group key nor an aggregate")]
    ProjectionNotAggregated { item: String, position: Position },
    #[error("nested aggregate in {item} at {position}")]
    NestedAggregate { item: String, position: Position },
    #[error("{message} at {position}")]
    Tokenize { message: String, position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::UnexpectedClause { position, .. }
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::UnknownFunction { position, .. }
            | ParseError::UnboundAlias { position, .. }
            | ParseError::TrailingInput { position, .. }
            | ParseError::ProjectionNotAggregated { position, .. }
            | ParseError::NestedAggregate { position, .. }
            | ParseError::Tokenize { position, .. } => *position,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("filter {expr} is not boolean-valued")]
    NonBooleanFilter { expr: String },
    #[error("invalid limit {value}: must be non-negative")]
    InvalidLimit { value: i64 },
    #[error("projection #{index} ({item}) is neither a group key nor an aggregate")]
    ProjectionNotAggregated { index: usize, item: String },
    #[error("nested aggregate in {item}")]
    NestedAggregate { item: String },
    #[error("sort key {name} is neither an output column nor a group key")]
    UnboundSortKey { name: String },
    #[error("'*' in {item}: only allowed as a whole select item or inside COUNT")]
    MisplacedWildcard { item: String },
    #[error("non-finite number in {item}")]
    NonFiniteLiteral { item: String },
}

/// Failures reported by an execution collaborator. Surfaced verbatim, never retried.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("execution timed out after {0:?}")]
    Timeout(Duration),
    #[error("execution failed: {0}")]
    Other(String),
}

#[derive(thiserror::Error, Debug)]
pub enum QueryAstError {
    #[error("parse error: {0}")] Parse(#[from] ParseError),
    #[error("build error: {0}")] Build(#[from] BuildError),
    #[error("execution error: {0}")] Execution(#[from] ExecutionError),
    #[error("config error: {0}")] Config(String),
    #[error("invalid frame: {0}")] InvalidFrame(String),
    #[error("io error: {0}")] Io(#[from] std::io::Error),
    #[error("csv error: {0}")] Csv(#[from] csv::Error),
    #[error("json error: {0}")] Json(#[from] serde_json::Error),
}
