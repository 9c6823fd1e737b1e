//! Health check endpoint
//!
//! Reports the registered channels per family. Never touches an upstream.

use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::http::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub environment: String,
    pub channels: BTreeMap<String, Vec<String>>,
}

/// Health check router
pub fn create_health_router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let channels = state
        .registry
        .by_family()
        .into_iter()
        .map(|(family, ids)| (family.as_str().to_string(), ids))
        .collect();

    Json(HealthResponse {
        status: "ok".to_string(),
        environment: state.environment.clone(),
        channels,
    })
}
