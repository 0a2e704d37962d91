//! Execution collaborator interface.
//!
//! The translator never connects to anything itself. Callers hand an
//! implementation of [`FrameExecutor`] the generated SQL plus the frames it
//! reads, and get rows back or an [`ExecutionError`] that is surfaced as-is.

use std::time::Duration;

use log::{debug, warn};

use super::emitter::{GenerateOptions, emit_sql};
use super::errors::ExecutionError;
use super::frame::{DataFrame, ResultSet};
use super::logical::QueryIr;

#[async_trait::async_trait]
pub trait FrameExecutor: Send + Sync {
    /// Run `sql` against `frames`, each addressable by its name.
    async fn execute_sql(&self, sql: &str, frames: &[DataFrame]) -> Result<ResultSet, ExecutionError>;
}

/// Generate SQL for `ir` and run it, failing with `Timeout` if the executor
/// does not answer within `timeout`. No retries.
pub async fn execute_query(
    executor: &dyn FrameExecutor,
    ir: &QueryIr,
    options: &GenerateOptions,
    frames: &[DataFrame],
    timeout: Duration,
) -> Result<ResultSet, ExecutionError> {
    let sql = emit_sql(ir, options);
    debug!("executing: {}", sql);
    match tokio::time::timeout(timeout, executor.execute_sql(&sql, frames)).await {
        Ok(result) => result,
        Err(_) => {
            warn!("query over {} timed out after {:?}", ir.source().name(), timeout);
            Err(ExecutionError::Timeout(timeout))
        }
    }
}
