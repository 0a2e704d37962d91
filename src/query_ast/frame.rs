//! Named in-memory tables handed to an execution collaborator, and the
//! tabular results it returns.

use std::fmt;
use std::io;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::errors::QueryAstError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl Scalar {
    /// Type inference for a raw CSV cell.
    pub fn infer(raw: &str) -> Scalar {
        let s = raw.trim();
        if s.is_empty() || s == "NA" {
            return Scalar::Null;
        }
        if let Ok(n) = s.parse::<i64>() {
            return Scalar::Integer(n);
        }
        if let Ok(f) = s.parse::<f64>()
            && f.is_finite()
        {
            return Scalar::Float(f);
        }
        match s {
            "TRUE" | "true" => Scalar::Boolean(true),
            "FALSE" | "false" => Scalar::Boolean(false),
            _ => Scalar::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(n) => Some(*n as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Integer(n) => write!(f, "{n}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Scalar>>,
}

impl DataFrame {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Scalar>>) -> Result<Self, QueryAstError> {
        let name = name.into();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(QueryAstError::InvalidFrame(format!(
                "frame {name}: row {} has {} cells, expected {}",
                i + 1,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { name, columns, rows })
    }

    /// Load a frame from CSV with a header row. Ragged rows are rejected.
    pub fn from_csv_reader<R: io::Read>(name: impl Into<String>, reader: R) -> Result<Self, QueryAstError> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::Headers).from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(Scalar::infer).collect());
        }
        let frame = Self::new(name, columns, rows)?;
        debug!("loaded frame {} ({} columns, {} rows)", frame.name, frame.columns.len(), frame.rows.len());
        Ok(frame)
    }

    pub fn from_csv_path(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, QueryAstError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(name, file)
    }
}

/// Rows returned by an executor, in result order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Scalar>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell by row index and output column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Scalar> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx)
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), QueryAstError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|c| c.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }
}
