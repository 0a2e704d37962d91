//! Bidirectional SQL ↔ query-builder translation.
//!
//! SQL text → [`parser`] → [`QueryIr`] → [`emitter`] → SQL text, and
//! [`builder`] calls → [`QueryIr`] → [`emitter`] → SQL text.
//! Execution is delegated to a [`executor::FrameExecutor`]; nothing here
//! holds process-wide state.

pub mod ast;
pub mod builder;
pub mod emitter;
pub mod errors;
pub mod executor;
pub mod executors;
pub mod frame;
mod lexer;
pub mod logical;
pub mod parser;
pub mod rewrite;
mod validate;

pub use builder::{QueryBuilder, from};
pub use emitter::GenerateOptions;
pub use emitter::dialect::QuoteStyle;
pub use errors::*;
pub use logical::*;

use log::debug;

/// Parse a single SELECT statement.
pub fn parse(sql: &str) -> Result<QueryIr, ParseError> {
    parser::parse_query(sql)
}

/// Canonical SQL with the default (double-quote) identifier style.
pub fn generate(ir: &QueryIr) -> String {
    emitter::emit_sql(ir, &GenerateOptions::default())
}

/// Parse `raw` and regenerate it in canonical form.
pub fn translate_sql(raw: &str, options: &GenerateOptions) -> Result<String, QueryAstError> {
    let ir = parse(raw)?;
    let sql = emitter::emit_sql(&ir, options);
    debug!("translated query over {} ({} quoting)", ir.source().name(), options.quote_style);
    Ok(sql)
}
