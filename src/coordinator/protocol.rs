//! HTTP API Definitions
//!
//! Request and response bodies of the coordinator's HTTP API, plus its endpoint paths.
//! The recommendation endpoint keeps the `movieIds` field name existing clients send.

use serde::{Deserialize, Serialize};

use crate::dataset::types::ItemId;

pub const ENDPOINT_RECOMMEND: &str = "/api";
pub const ENDPOINT_WORKERS: &str = "/cluster/workers";
pub const ENDPOINT_FRAGMENT_RUN: &str = "/fragments/run";

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(rename = "movieIds")]
    pub movie_ids: Vec<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendResponse {
    #[serde(rename = "movieIds")]
    pub movie_ids: Vec<ItemId>,
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub contributors: usize,
    pub dispatched: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
