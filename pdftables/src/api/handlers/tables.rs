use crate::AppState;
use crate::api::models::tables::ParseTablesResponse;
use crate::errors::{Error, ErrorResponse, Result};
use crate::extraction::{ExtractedTable, ExtractionRequest};
use crate::upload::{StagedUpload, secure_filename};
use anyhow::Context;
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};

/// Multipart field carrying the PDF
pub const PDF_FIELD: &str = "pdf_file";

#[utoipa::path(
    post,
    path = "/parse-pdf-tables",
    tag = "tables",
    summary = "Extract tables from a PDF",
    description = "Upload a PDF in the `pdf_file` form field. Every page is scanned in stream mode and each table found is returned as a list of rows keyed by column label.",
    request_body(
        content_type = "multipart/form-data",
        description = "PDF upload in the `pdf_file` field"
    ),
    responses(
        (status = 200, description = "Tables extracted", body = ParseTablesResponse),
        (status = 400, description = "No file provided, or empty filename", body = ErrorResponse),
        (status = 413, description = "Payload too large", body = ErrorResponse),
        (status = 500, description = "The PDF could not be processed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn parse_pdf_tables(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ParseTablesResponse>> {
    // A body that isn't multipart form data can't contain the file
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "Request body is not multipart form data");
        Error::MissingFile
    })?;

    let staged = stage_pdf_upload(&state, &mut multipart).await?;

    let request = ExtractionRequest::all_pages_stream(staged.path());
    let tables = state.extractor.extract_tables(request).await?;

    // Remove the staged file before building the response
    drop(staged);

    tracing::info!(
        extractor = state.extractor.name(),
        tables = tables.len(),
        "Extracted tables from PDF"
    );

    let data = tables.into_iter().map(ExtractedTable::into_records).collect();
    Ok(Json(ParseTablesResponse::new(data)))
}

/// Finds the `pdf_file` part and streams it into a temporary file.
///
/// Other fields are skipped. A `pdf_file` part without a filename is an ordinary form value
/// rather than a file, so it is skipped as well.
async fn stage_pdf_upload(state: &AppState, multipart: &mut Multipart) -> Result<StagedUpload> {
    let max_file_size = state.config.uploads.max_file_size;

    let read_error = |err| multipart_error(err, max_file_size);

    while let Some(mut field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some(PDF_FIELD) {
            continue;
        }
        let Some(original) = field.file_name().map(str::to_string) else {
            continue;
        };
        if original.is_empty() {
            return Err(Error::EmptyFilename);
        }

        let filename = secure_filename(&original);
        tracing::info!(original = %original, filename = %filename, "Staging PDF upload");

        let mut staged = StagedUpload::create(state.config.uploads.temp_dir.as_deref(), &filename)
            .context("creating temporary file for upload")?;

        while let Some(chunk) = field.chunk().await.map_err(read_error)? {
            // Check size limit incrementally to fail fast
            if staged.size() + chunk.len() as u64 > max_file_size {
                tracing::warn!(
                    staged = staged.size(),
                    max_file_size = max_file_size,
                    "File size limit exceeded, aborting upload"
                );
                return Err(too_large(max_file_size));
            }
            staged
                .write_chunk(&chunk)
                .await
                .context("writing upload to temporary file")?;
        }
        staged.finish().await.context("writing upload to temporary file")?;

        tracing::debug!(
            path = %staged.path().display(),
            size = staged.size(),
            "Upload staged"
        );
        return Ok(staged);
    }

    Err(Error::MissingFile)
}

/// Maps a multipart read failure. Hitting the request body limit reports the upload limit, even
/// when it was other form fields that used up the allowance.
fn multipart_error(err: MultipartError, max_file_size: u64) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(max_file_size = max_file_size, "Request body limit exceeded");
        too_large(max_file_size)
    } else {
        Error::BadRequest {
            message: format!("Failed to parse multipart data: {}", err.body_text()),
        }
    }
}

fn too_large(max_file_size: u64) -> Error {
    Error::PayloadTooLarge {
        message: format!("File size exceeds maximum allowed size of {max_file_size} bytes"),
    }
}
