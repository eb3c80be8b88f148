//! # Health Check Handler

use axum::Json;
use serde_json::{json, Value};

/// Liveness check
///
/// ## Route
/// GET /health
///
/// Runs on the standard chain only: no session is loaded and no cookie is set,
/// so load balancers can poll it freely.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "todo-api"
    }))
}
