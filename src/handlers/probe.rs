use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::CONFIG;
use crate::error::FirelinkError;
use crate::router::FirelinkState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/test/health -> liveness only; no database dependency.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "API running".to_string(),
        timestamp: Utc::now(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResponse {
    pub success: bool,
    pub message: String,
    pub document_in_test_collection: usize,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/test/firebase -> bounded read against the probe collection.
///
/// Reports only the count of returned documents, never their contents. Any
/// failure during the read is converted to the 500 contract by
/// [`FirelinkError::into_response`]; the process keeps serving.
pub async fn firebase_probe_handler(
    State(state): State<FirelinkState>,
) -> Result<Json<ProbeResponse>, FirelinkError> {
    info!(collection = %CONFIG.probe_collection, "starting Firestore connectivity probe");

    let documents = state
        .db
        .collection(CONFIG.probe_collection.clone())
        .limit(1)
        .get()
        .await?;

    Ok(Json(ProbeResponse {
        success: true,
        message: "Connection successful".to_string(),
        document_in_test_collection: documents.len(),
        timestamp: Utc::now(),
    }))
}
