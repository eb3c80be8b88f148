//! # Authentication and Authorization
//!
//! Two separate stages:
//! - `authenticate` works out *who* the caller is, from the session, and
//!   records the answer in an `AuthContext`. It never blocks a request.
//! - `require_authentication` decides *whether* the route may run, looking only
//!   at the `AuthContext`. It knows nothing about sessions.

use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::session::{SessionHandle, AUTHENTICATED_USER_ID};
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Who the caller is, as established for this request.
///
/// Set once by `authenticate` and read-only afterwards. Requests that never
/// went through the dynamic chain extract the anonymous context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    user_id: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    fn authenticated(user_id: String) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Resolve the session's user and attach an `AuthContext` to the request.
///
/// A session pointing at a user that no longer exists (deleted account) is
/// treated as anonymous, and the stale id is dropped from the session so the
/// lookup is not repeated on every request.
pub async fn authenticate(
    State(state): State<AppState>,
    session: SessionHandle,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let context = match session.get::<String>(AUTHENTICATED_USER_ID)? {
        None => AuthContext::anonymous(),
        Some(user_id) => {
            if users::exists(&state.db, &user_id).await? {
                AuthContext::authenticated(user_id)
            } else {
                tracing::warn!(user_id = %user_id, "Session refers to a missing user; demoting to anonymous");
                session.remove(AUTHENTICATED_USER_ID);
                AuthContext::anonymous()
            }
        }
    };

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Reject unauthenticated requests with 401 before they reach the handler.
///
/// Responses that do get through are marked `Cache-Control: no-store` so
/// neither the browser nor a proxy keeps a copy of protected data.
pub async fn require_authentication(
    auth: AuthContext,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !auth.is_authenticated() {
        tracing::debug!(path = %request.uri().path(), "Unauthenticated request blocked");
        return Err(AppError::Unauthorized(
            "You must be logged in to access this resource".to_string(),
        ));
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}
