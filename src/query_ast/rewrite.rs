use log::debug;

use super::logical::QueryIr;

/// Cap the number of rows a query may return, for previews.
/// An existing limit is only ever tightened.
pub fn cap_rows(ir: &QueryIr, cap: u64) -> QueryIr {
    let limit = match ir.limit() {
        Some(existing) => existing.min(cap),
        None => cap,
    };
    if ir.limit() != Some(limit) {
        debug!("capping rows of query over {} at {}", ir.source().name(), limit);
    }
    ir.with_limit(Some(limit))
}
