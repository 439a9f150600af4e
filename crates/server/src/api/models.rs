//! Request and response data transfer objects for the REST API.
//!
//! Record types serialize directly from `shardvec-core`; only the request
//! wrappers live here.

use serde::{Deserialize, Serialize};
use shardvec_core::record::Vector;
use std::collections::HashMap;

/// Request body for `POST /search`.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Query record: its embedding drives candidate generation, its text
    /// (when non-empty) drives the rerank stage.
    pub vector: Vector,
    /// Number of results requested; must be at least 1.
    pub k: i64,
}

/// Request body for the metadata patch routes.
#[derive(Debug, Deserialize)]
pub struct MetadataPatch {
    /// Keys to merge into the stored metadata; existing keys are
    /// overridden, unmentioned keys survive.
    pub metadata: HashMap<String, String>,
}

/// Response body for `GET /query/{id}`: the record's text projection.
#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}
