//! Command-line front end: translate, explain and run single SELECT statements.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{debug, info};

use crate::config::AppConfig;
use crate::models::enums::DatabaseType;
use crate::query_ast::executor::execute_query;
use crate::query_ast::executors::SqliteFrameExecutor;
use crate::query_ast::frame::DataFrame;
use crate::query_ast::rewrite::cap_rows;
use crate::query_ast::{QueryAstError, QuoteStyle, emitter, parse};
use crate::query_tools::pretty_print;

#[derive(Parser, Debug)]
#[clap(name = "sqlchain", version, about = "Translate between SQL and fluent query chains")]
pub struct Arguments {
    /// Identifier quoting for generated SQL (double, backtick, bracket).
    #[clap(long, global = true)]
    pub quote: Option<QuoteStyle>,
    /// Derive quoting from a target database (sqlite, postgres, mysql, mssql).
    #[clap(long, global = true)]
    pub database: Option<DatabaseType>,
    /// Pretty-print generated SQL over several lines.
    #[clap(long, global = true)]
    pub pretty: bool,
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a query and print its canonical regeneration.
    Translate {
        /// SQL text, or `-` to read from stdin.
        sql: String,
    },
    /// Parse a query and print its IR as JSON.
    Explain {
        /// SQL text, or `-` to read from stdin.
        sql: String,
    },
    /// Run a query against CSV files and print the result as CSV.
    Run {
        /// SQL text, or `-` to read from stdin.
        sql: String,
        /// `name=path.csv`; repeatable. Defaults to `<source>.csv` in the current directory.
        #[clap(long = "frame", value_parser = parse_frame_arg)]
        frames: Vec<(String, PathBuf)>,
        #[clap(long)]
        timeout_ms: Option<u64>,
        /// Cap the number of returned rows; 0 disables the cap.
        #[clap(long)]
        max_rows: Option<u64>,
    },
}

impl Arguments {
    /// Command-line flags win over file and environment settings.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(quote) = self.quote {
            config.quote_style = quote;
            config.database = None;
        }
        if let Some(db) = self.database {
            config.database = Some(db);
        }
        if self.pretty {
            config.pretty = true;
        }
        if let Commands::Run { timeout_ms, max_rows, .. } = &self.command {
            if let Some(ms) = timeout_ms {
                config.execution_timeout_ms = *ms;
            }
            if let Some(n) = max_rows {
                config.max_rows = (*n > 0).then_some(*n);
            }
        }
    }
}

fn parse_frame_arg(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok((name.to_string(), PathBuf::from(path))),
        _ => Err(format!("expected name=path.csv, got '{s}'")),
    }
}

fn read_sql(arg: &str) -> Result<String, QueryAstError> {
    if arg == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(arg.to_string())
    }
}

pub async fn execute(args: Arguments, config: &AppConfig) -> Result<(), QueryAstError> {
    let options = config.generate_options();
    match args.command {
        Commands::Translate { sql } => {
            let ir = parse(&read_sql(&sql)?)?;
            let out = emitter::emit_sql(&ir, &options);
            println!("{}", if config.pretty { pretty_print(&out) } else { out });
        }
        Commands::Explain { sql } => {
            let ir = parse(&read_sql(&sql)?)?;
            println!("{}", serde_json::to_string_pretty(&ir)?);
        }
        Commands::Run { sql, frames, .. } => {
            let mut ir = parse(&read_sql(&sql)?)?;
            if let Some(cap) = config.max_rows {
                ir = cap_rows(&ir, cap);
            }
            let frames = if frames.is_empty() {
                let name = ir.source().name().to_string();
                vec![(name.clone(), PathBuf::from(format!("{name}.csv")))]
            } else {
                frames
            };
            let frames = frames
                .into_iter()
                .map(|(name, path)| {
                    debug!("loading frame {} from {}", name, path.display());
                    DataFrame::from_csv_path(name, path)
                })
                .collect::<Result<Vec<_>, _>>()?;

            let timeout: Duration = config.timeout();
            let executor = SqliteFrameExecutor::new();
            let result = execute_query(&executor, &ir, &options, &frames, timeout).await?;
            info!("query returned {} row(s)", result.len());

            let stdout = io::stdout();
            let mut handle = stdout.lock();
            result.write_csv(&mut handle)?;
            handle.flush()?;
        }
    }
    Ok(())
}
