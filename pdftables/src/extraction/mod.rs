//! Table extraction abstraction layer
//!
//! This module defines the [`TableExtractor`] trait which abstracts the external capability
//! that finds tables in a PDF. The service never detects tables itself: it stages the upload
//! on disk and hands the path to whichever extractor the configuration selects.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;

use crate::config::ExtractionConfig;

pub mod tabula;

/// Create a table extractor from configuration
///
/// This is the single point where we convert config into extractor instances.
pub fn create_extractor(config: &ExtractionConfig) -> Arc<dyn TableExtractor> {
    Arc::new(tabula::TabulaExtractor::from(config.clone()))
}

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Errors that can occur while extracting tables
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("extractor exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("extractor produced unreadable output: {0}")]
    InvalidOutput(String),
}

/// Which pages of the document to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pages {
    All,
}

impl Pages {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pages::All => "all",
        }
    }
}

/// Table detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// Detect tables from whitespace between text runs rather than ruling lines
    Stream,
}

impl Flavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Stream => "stream",
        }
    }
}

/// Single request to a [`TableExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub pdf_path: PathBuf,
    pub pages: Pages,
    pub flavor: Flavor,
    /// Locate table regions on each page before extracting. Without it the whole page is read
    /// as a single table.
    pub guess: bool,
}

impl ExtractionRequest {
    /// Detect tables on every page of `pdf_path` in stream mode. Uploads are always extracted
    /// this way.
    pub fn all_pages_stream(pdf_path: impl Into<PathBuf>) -> Self {
        Self {
            pdf_path: pdf_path.into(),
            pages: Pages::All,
            flavor: Flavor::Stream,
            guess: true,
        }
    }
}

/// A row of an extracted table, keyed by column label in column order.
pub type Record = Map<String, Value>;

/// A single table found in a PDF.
///
/// Cells are optional: `None` marks a position the extractor left empty-handed (a short row,
/// for instance) and is serialized as JSON `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl ExtractedTable {
    /// Creates a table with explicit column labels. Cells beyond the last label are dropped.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Creates a table labelled by position (`"0"`, `"1"`, ...), as wide as its widest row.
    pub fn from_grid(rows: Vec<Vec<Option<String>>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let columns = (0..width).map(|i| i.to_string()).collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Converts the grid into one record per row, filling missing cells with `null`.
    pub fn into_records(self) -> Vec<Record> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| {
                let mut cells = row.into_iter();
                columns
                    .iter()
                    .map(|label| {
                        let value = cells.next().flatten().map(Value::String).unwrap_or(Value::Null);
                        (label.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

/// Abstract table extraction interface
///
/// Implementors wrap a concrete extraction library or tool. The returned tables are fully
/// materialized and in document order.
#[async_trait]
pub trait TableExtractor: Send + Sync {
    /// Extract every table the request selects from the PDF at `request.pdf_path`.
    ///
    /// # Errors
    /// Returns an error if the document cannot be read or the backend fails. There is no
    /// retry: the caller decides what a failure means.
    async fn extract_tables(&self, request: ExtractionRequest) -> Result<Vec<ExtractedTable>>;

    /// Short backend name used in logs
    fn name(&self) -> &'static str;
}
