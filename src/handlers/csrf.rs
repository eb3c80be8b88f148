use crate::middleware::csrf::CsrfToken;
use axum::Json;
use serde_json::{json, Value};

/// GET /api/csrf-token
///
/// Returns `{"csrf_token": "..."}`, the value the client must echo in the
/// `X-CSRF-Token` header. If the request carried no token cookie, the CSRF
/// stage issues one on this same response.
pub async fn csrf_token(token: CsrfToken) -> Json<Value> {
    tracing::debug!("CSRF token handed out");
    Json(json!({ "csrf_token": token.as_str() }))
}
