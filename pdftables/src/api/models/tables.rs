use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::extraction::Record;

/// Successful extraction result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParseTablesResponse {
    /// One entry per table, in document order. Each table is a list of rows keyed by column label.
    #[schema(value_type = Vec<Vec<Object>>)]
    pub data: Vec<Vec<Record>>,
    /// Human readable summary, e.g. "Extracted 2 tables."
    pub message: String,
}

impl ParseTablesResponse {
    pub fn new(data: Vec<Vec<Record>>) -> Self {
        let message = format!("Extracted {} tables.", data.len());
        Self { data, message }
    }
}
