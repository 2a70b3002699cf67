//! Test utilities: a recording fake extractor and test server constructors.

use crate::config::{Config, UploadsConfig};
use crate::extraction::{ExtractedTable, ExtractionError, ExtractionRequest, Result, TableExtractor};
use async_trait::async_trait;
use axum_test::TestServer;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Record of a call made to the [`MockExtractor`].
#[derive(Debug, Clone)]
pub struct MockCall {
    pub request: ExtractionRequest,
    /// Contents of the PDF path at the time of the call, `None` if it could not be read
    pub staged_bytes: Option<Vec<u8>>,
}

/// Fake extractor returning a fixed outcome and recording every call.
///
/// A failing mock reports its message as [`ExtractionError::InvalidOutput`].
#[derive(Clone)]
pub struct MockExtractor {
    outcome: std::result::Result<Vec<ExtractedTable>, String>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockExtractor {
    pub fn returning(tables: Vec<ExtractedTable>) -> Self {
        Self {
            outcome: Ok(tables),
            calls: Arc::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TableExtractor for MockExtractor {
    async fn extract_tables(&self, request: ExtractionRequest) -> Result<Vec<ExtractedTable>> {
        let staged_bytes = tokio::fs::read(&request.pdf_path).await.ok();
        self.calls.lock().unwrap().push(MockCall { request, staged_bytes });

        self.outcome
            .clone()
            .map_err(ExtractionError::InvalidOutput)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Builds a table with explicit column labels from string cells.
pub fn table(columns: &[&str], rows: &[&[&str]]) -> ExtractedTable {
    ExtractedTable::new(
        columns.iter().map(|c| c.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|cell| Some(cell.to_string())).collect())
            .collect(),
    )
}

/// Config staging uploads in `temp_dir`, so tests can check it is left empty.
pub fn create_test_config(temp_dir: &Path) -> Config {
    Config {
        uploads: UploadsConfig {
            temp_dir: Some(temp_dir.to_path_buf()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn create_test_server(config: Config, extractor: MockExtractor) -> TestServer {
    crate::Application::with_extractor(config, Arc::new(extractor)).into_test_server()
}

/// Test server backed by `extractor`, staging into a fresh temp dir that lives as long as the
/// returned [`TempDir`].
pub fn create_test_app(extractor: MockExtractor) -> (TestServer, MockExtractor, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create staging dir");
    let server = create_test_server(create_test_config(dir.path()), extractor.clone());
    (server, extractor, dir)
}
