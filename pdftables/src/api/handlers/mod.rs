//! HTTP request handlers.
//!
//! - [`tables`]: PDF upload and table extraction
//!
//! Handlers return [`crate::errors::Error`] which converts to a status code and an
//! `{"error": ...}` JSON body.

pub mod tables;
