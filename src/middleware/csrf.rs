//! # CSRF Protection
//!
//! Double-submit cookie: the server hands out a random token in an HttpOnly
//! cookie, and every state-changing request must send the same value back
//! through a channel a cross-site page cannot forge: the `X-CSRF-Token`
//! header, or a `csrf_token` field in a JSON body. Clients that cannot read
//! the cookie get the value from `GET /api/csrf-token`.
//!
//! ## Per request
//! - no valid cookie → a new token is issued (cookie on the response)
//! - GET/HEAD/OPTIONS/TRACE → pass through
//! - anything else → cookie and submitted value must match, or 403 before the
//!   handler runs. A freshly issued token never verifies: the client cannot
//!   have echoed a value it did not have yet.

use crate::cookies;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use serde::Deserialize;
use time::{Duration, OffsetDateTime};

pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";

const TOKEN_BYTES: usize = 32;
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The token in force for this request, as set by the CSRF stage.
#[derive(Debug, Clone)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CsrfToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CsrfToken>()
            .cloned()
            .ok_or_else(|| AppError::Internal("CSRF stage is not installed".to_string()))
    }
}

pub async fn protect(State(state): State<AppState>, request: Request, next: Next) -> AppResult<Response> {
    let existing = cookies::read(request.headers(), CSRF_COOKIE).filter(|t| is_well_formed(t));
    let issued = existing.is_none();
    let token = existing.unwrap_or_else(generate_token);

    let mut request = if is_safe_method(request.method()) {
        request
    } else {
        let (request, submitted) = submitted_token(request).await?;
        let verified = !issued
            && submitted
                .as_deref()
                .is_some_and(|submitted| tokens_match(&token, submitted));

        if !verified {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "CSRF token missing or incorrect"
            );
            let mut response =
                AppError::Forbidden("CSRF token missing or incorrect".to_string()).into_response();
            if issued {
                cookies::append(&mut response, &token_cookie(&state, &token))?;
            }
            return Ok(response);
        }
        request
    };

    request.extensions_mut().insert(CsrfToken(token.clone()));
    let mut response = next.run(request).await;
    if issued {
        cookies::append(&mut response, &token_cookie(&state, &token))?;
    }
    Ok(response)
}

fn token_cookie(state: &AppState, token: &str) -> cookie::Cookie<'static> {
    cookies::build(
        CSRF_COOKIE,
        token.to_string(),
        state.config.secure_cookies,
        Some(OffsetDateTime::now_utc() + Duration::days(365)),
    )
}

#[derive(Deserialize)]
struct CsrfField {
    csrf_token: Option<String>,
}

/// The value the client echoed back, from the header or else a JSON body.
///
/// Reading the body means buffering it; the request is rebuilt from the bytes
/// so the handler still sees the full body.
async fn submitted_token(request: Request) -> AppResult<(Request, Option<String>)> {
    let from_header = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if from_header.is_some() {
        return Ok((request, from_header));
    }

    if !is_json(request.headers()) {
        return Ok((request, None));
    }

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::BadRequest("Request body is too large or unreadable".to_string()))?;
    let submitted = serde_json::from_slice::<CsrfField>(&bytes)
        .ok()
        .and_then(|field| field.csrf_token);

    Ok((Request::from_parts(parts, Body::from(bytes)), submitted))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn is_well_formed(token: &str) -> bool {
    URL_SAFE_NO_PAD
        .decode(token)
        .is_ok_and(|bytes| bytes.len() == TOKEN_BYTES)
}

/// Constant-time comparison.
fn tokens_match(expected: &str, submitted: &str) -> bool {
    let (a, b) = (expected.as_bytes(), submitted.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
