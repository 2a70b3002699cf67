//! # pdftables: table extraction over HTTP
//!
//! `pdftables` accepts a PDF upload on `POST /parse-pdf-tables` and answers with every table
//! found in the document as JSON. Finding the tables is delegated to an external extractor
//! (tabula-java in production); this crate handles the upload, stages it in a temporary file
//! for the extractor, shapes the response and translates failures into HTTP errors.
//!
//! ## Request Flow
//!
//! 1. The handler ([`api::handlers::tables`]) reads the multipart body and validates that a
//!    `pdf_file` part with a non-empty filename is present.
//! 2. The upload is streamed into a uniquely named temporary file ([`upload::StagedUpload`])
//!    carrying the sanitized extension of the uploaded filename.
//! 3. The configured [`extraction::TableExtractor`] scans every page in stream mode.
//! 4. Each table becomes a list of row records, `null` marking missing cells, and the response
//!    is `{"data": [...], "message": "Extracted N tables."}`.
//! 5. The temporary file is removed before the response leaves the handler, whether extraction
//!    succeeded or not.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use pdftables::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = pdftables::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     pdftables::telemetry::init_telemetry(config.debug, config.enable_otel_export)?;
//!
//!     Application::new(config)
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod errors;
pub mod extraction;
mod openapi;
pub mod telemetry;
pub mod upload;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use extraction::TableExtractor;
use openapi::ApiDoc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Room for multipart boundaries and part headers on top of the file size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .extractor(extractor)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub extractor: Arc<dyn TableExtractor>,
}

/// Build the application router.
///
/// Routes:
/// - `POST /parse-pdf-tables` - table extraction, with the body limit raised to the upload limit
/// - `GET /healthz` - liveness
/// - `GET /api-docs/openapi.json` and `GET /docs` - API documentation
///
/// Every request is wrapped in a tracing span.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    let upload_limit = usize::try_from(state.config.uploads.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route(
            "/parse-pdf-tables",
            post(api::handlers::tables::parse_pdf_tables).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// The HTTP service: a router bound to its configuration.
///
/// 1. **Create**: [`Application::new`] builds the extractor from configuration, or
///    [`Application::with_extractor`] takes one directly
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until the
///    shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create an application using the extractor selected by `config.extraction`
    pub fn new(config: Config) -> Self {
        let extractor = extraction::create_extractor(&config.extraction);
        Self::with_extractor(config, extractor)
    }

    /// Create an application around an existing extractor
    pub fn with_extractor(config: Config, extractor: Arc<dyn TableExtractor>) -> Self {
        debug!("Starting pdftables with configuration: {:#?}", config);
        info!(extractor = extractor.name(), "Table extractor ready");

        let state = AppState::builder().config(config.clone()).extractor(extractor).build();
        let router = build_router(state);

        Self { router, config }
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("pdftables listening on http://{}", bind_addr);

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::*;
    use axum::http::StatusCode;

    #[test_log::test(tokio::test)]
    async fn test_healthz() {
        let (server, _extractor, _dir) = create_test_app(MockExtractor::returning(vec![]));

        let response = server.get("/healthz").await;

        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[test_log::test(tokio::test)]
    async fn test_openapi_document_served() {
        let (server, _extractor, _dir) = create_test_app(MockExtractor::returning(vec![]));

        let response = server.get("/api-docs/openapi.json").await;

        response.assert_status_ok();
        let doc: serde_json::Value = response.json();
        assert!(doc["paths"]["/parse-pdf-tables"]["post"].is_object());
    }

    #[test_log::test(tokio::test)]
    async fn test_wrong_method_and_unknown_route() {
        let (server, _extractor, _dir) = create_test_app(MockExtractor::returning(vec![]));

        let response = server.get("/parse-pdf-tables").await;

        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
        let response = server.post("/upload").await;
        response.assert_status_not_found();
    }
}
