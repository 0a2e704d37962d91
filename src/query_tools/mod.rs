use sqlformat::{FormatOptions, Indent, QueryParams};

// Centralized sqlformat options for human-facing output
pub fn default_sqlformat_options() -> FormatOptions<'static> {
    FormatOptions {
        indent: Indent::Spaces(4),
        uppercase: Some(true),
        lines_between_queries: 1,
        inline: false,
        max_inline_block: 50,       // characters allowed to keep a parenthesized block inline
        max_inline_arguments: Some(40),
        max_inline_top_level: Some(40),
        ..Default::default()
    }
}

/// Multi-line rendering of generated SQL. Purely cosmetic: the canonical
/// single-line form is what round-trips.
pub fn pretty_print(sql: &str) -> String {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    sqlformat::format(trimmed, &QueryParams::None, &default_sqlformat_options())
}
