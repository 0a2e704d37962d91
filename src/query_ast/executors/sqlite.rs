//! SQLite-backed frame executor.
//!
//! Every request gets its own private `sqlite::memory:` database: the frames
//! are loaded into tables named after them, the query runs, and the
//! connection is closed. Nothing is shared between requests.

use async_trait::async_trait;
use log::{debug, warn};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Executor, Row, Statement};

use crate::query_ast::emitter::dialect::QuoteStyle;
use crate::query_ast::errors::ExecutionError;
use crate::query_ast::executor::FrameExecutor;
use crate::query_ast::frame::{DataFrame, ResultSet, Scalar};

const MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug, Default, Clone)]
pub struct SqliteFrameExecutor;

impl SqliteFrameExecutor {
    pub fn new() -> Self {
        Self
    }

    async fn load_frame(conn: &mut SqliteConnection, frame: &DataFrame) -> Result<(), ExecutionError> {
        let quote = QuoteStyle::DoubleQuote;
        let table = quote.quote_ident(&frame.name);
        let columns = frame.columns.iter().map(|c| quote.quote_ident(c)).collect::<Vec<_>>();

        let create = format!("CREATE TABLE {} ({})", table, columns.join(", "));
        (&mut *conn).execute(create.as_str()).await.map_err(map_error)?;

        let placeholders = vec!["?"; columns.len()].join(", ");
        let insert = format!("INSERT INTO {} ({}) VALUES ({})", table, columns.join(", "), placeholders);
        let mut tx = conn.begin().await.map_err(map_error)?;
        for row in &frame.rows {
            let mut query = sqlx::query(&insert);
            for cell in row {
                query = match cell {
                    Scalar::Null => query.bind(None::<i64>),
                    Scalar::Integer(n) => query.bind(*n),
                    Scalar::Float(f) => query.bind(*f),
                    Scalar::Text(s) => query.bind(s.clone()),
                    Scalar::Boolean(b) => query.bind(*b),
                };
            }
            query.execute(&mut *tx).await.map_err(map_error)?;
        }
        tx.commit().await.map_err(map_error)?;
        debug!("SqliteFrameExecutor: loaded {} rows into {}", frame.rows.len(), table);
        Ok(())
    }

    async fn run(conn: &mut SqliteConnection, sql: &str, frames: &[DataFrame]) -> Result<ResultSet, ExecutionError> {
        for frame in frames {
            Self::load_frame(conn, frame).await?;
        }

        let columns: Vec<String> = {
            let stmt = (&mut *conn).prepare(sql).await.map_err(map_error)?;
            stmt.columns().iter().map(|c| c.name().to_string()).collect()
        };
        let rows = sqlx::query(sql).fetch_all(&mut *conn).await.map_err(map_error)?;
        let rows = rows.iter().map(|row| decode_row(row, columns.len())).collect();
        Ok(ResultSet { columns, rows })
    }
}

#[async_trait]
impl FrameExecutor for SqliteFrameExecutor {
    async fn execute_sql(&self, sql: &str, frames: &[DataFrame]) -> Result<ResultSet, ExecutionError> {
        debug!("SqliteFrameExecutor: executing over {} frame(s)", frames.len());
        debug!("SQL: {}", sql);

        let mut conn = SqliteConnection::connect(MEMORY_URL).await.map_err(map_error)?;
        let result = Self::run(&mut conn, sql, frames).await;
        if let Err(e) = conn.close().await {
            warn!("SqliteFrameExecutor: failed to close connection: {}", e);
        }

        if let Ok(rs) = &result {
            debug!("SqliteFrameExecutor: query returned {} rows, {} columns", rs.rows.len(), rs.columns.len());
        }
        result
    }
}

fn decode_row(row: &SqliteRow, width: usize) -> Vec<Scalar> {
    (0..width)
        .map(|i| {
            if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
                v.map(Scalar::Integer).unwrap_or(Scalar::Null)
            } else if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
                v.map(Scalar::Float).unwrap_or(Scalar::Null)
            } else if let Ok(v) = row.try_get::<Option<String>, _>(i) {
                v.map(Scalar::Text).unwrap_or(Scalar::Null)
            } else {
                Scalar::Null
            }
        })
        .collect()
}

/// Classify SQLite's error text into the collaborator error kinds.
fn map_error(e: sqlx::Error) -> ExecutionError {
    let message = match &e {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    };
    classify(message)
}

fn classify(message: String) -> ExecutionError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("no such column") {
        ExecutionError::UnknownColumn(message)
    } else if lower.contains("datatype mismatch") || lower.contains("type mismatch") {
        ExecutionError::TypeMismatch(message)
    } else {
        ExecutionError::Other(message)
    }
}
