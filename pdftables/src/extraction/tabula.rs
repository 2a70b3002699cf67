//! Extractor backed by the tabula-java command line tool.
//!
//! Each request runs `java -jar tabula.jar --pages all --stream --guess --format JSON <pdf>`
//! and reads the table set tabula prints on stdout. `--guess` makes tabula locate the table
//! regions on each page; without it every page with text comes back as one table.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;

use crate::config::ExtractionConfig;
use crate::extraction::{ExtractedTable, ExtractionError, ExtractionRequest, Flavor, Result, TableExtractor};

/// Table extractor that shells out to tabula-java.
#[derive(Debug, Clone)]
pub struct TabulaExtractor {
    java: PathBuf,
    jar: PathBuf,
    jvm_args: Vec<String>,
}

impl TabulaExtractor {
    pub fn new(java: impl Into<PathBuf>, jar: impl Into<PathBuf>, jvm_args: Vec<String>) -> Self {
        Self {
            java: java.into(),
            jar: jar.into(),
            jvm_args,
        }
    }

    fn command(&self, request: &ExtractionRequest) -> Command {
        let mut command = Command::new(&self.java);
        command
            .args(&self.jvm_args)
            .arg("-jar")
            .arg(&self.jar)
            .arg("--pages")
            .arg(request.pages.as_str())
            .arg(flavor_flag(request.flavor));
        if request.guess {
            command.arg("--guess");
        }
        command
            .arg("--format")
            .arg("JSON")
            .arg(&request.pdf_path)
            .kill_on_drop(true);
        command
    }
}

impl From<ExtractionConfig> for TabulaExtractor {
    fn from(config: ExtractionConfig) -> Self {
        Self::new(config.java, config.jar, config.jvm_args)
    }
}

fn flavor_flag(flavor: Flavor) -> &'static str {
    match flavor {
        Flavor::Stream => "--stream",
    }
}

#[async_trait]
impl TableExtractor for TabulaExtractor {
    #[tracing::instrument(skip(self, request), fields(pdf = %request.pdf_path.display()))]
    async fn extract_tables(&self, request: ExtractionRequest) -> Result<Vec<ExtractedTable>> {
        tracing::debug!(
            java = %self.java.display(),
            jar = %self.jar.display(),
            pages = request.pages.as_str(),
            flavor = request.flavor.as_str(),
            guess = request.guess,
            "Running tabula"
        );

        let output = self
            .command(&request)
            .output()
            .await
            .map_err(|source| ExtractionError::Launch {
                program: self.java.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(status = %output.status, "tabula exited unsuccessfully");
            return Err(ExtractionError::Failed {
                status: output.status,
                stderr,
            });
        }

        let tables = parse_table_set(&output.stdout)?;
        tracing::debug!(tables = tables.len(), "tabula finished");
        Ok(tables)
    }

    fn name(&self) -> &'static str {
        "tabula"
    }
}

/// Tables as printed by tabula's JSON writer.
#[derive(Deserialize, Debug)]
#[serde(transparent)]
struct JsonTableSet(Vec<JsonTable>);

/// A single table. Position and extraction metadata fields are ignored.
#[derive(Deserialize, Debug)]
struct JsonTable {
    data: Vec<JsonRow>,
}

#[derive(Deserialize, Debug)]
#[serde(transparent)]
struct JsonRow(Vec<JsonCell>);

#[derive(Deserialize, Debug)]
struct JsonCell {
    text: Option<String>,
}

fn parse_table_set(stdout: &[u8]) -> Result<Vec<ExtractedTable>> {
    // tabula prints nothing at all for a document without any text
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let set: JsonTableSet = serde_json::from_slice(stdout).map_err(|e| ExtractionError::InvalidOutput(e.to_string()))?;

    Ok(set
        .0
        .into_iter()
        .map(|table| {
            ExtractedTable::from_grid(
                table
                    .data
                    .into_iter()
                    .map(|row| row.0.into_iter().map(|cell| cell.text).collect())
                    .collect(),
            )
        })
        .collect())
}
