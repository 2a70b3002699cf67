//! OpenAPI documentation for the HTTP API.

use utoipa::OpenApi;

use crate::api;
use crate::errors::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "pdftables",
        description = "Extract tables from uploaded PDF files"
    ),
    paths(api::handlers::tables::parse_pdf_tables),
    components(schemas(api::models::tables::ParseTablesResponse, ErrorResponse)),
    tags((name = "tables", description = "PDF table extraction"))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_describes_upload_endpoint() {
        let doc = ApiDoc::openapi();

        let path = doc.paths.paths.get("/parse-pdf-tables").expect("path documented");
        let post = path.post.as_ref().expect("POST documented");
        for status in ["200", "400", "413", "500"] {
            assert!(post.responses.responses.contains_key(status), "missing {status} response");
        }

        let schemas = &doc.components.as_ref().expect("components").schemas;
        assert!(schemas.contains_key("ParseTablesResponse"));
        assert!(schemas.contains_key("ErrorResponse"));
    }
}
