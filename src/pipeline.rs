//! # Request Pipeline
//!
//! The middleware order is data: a `Pipeline` is an ordered list of `Stage`s,
//! first stage outermost. Routes are wrapped by applying a pipeline to a
//! router, instead of stacking `.layer()` calls by hand.
//!
//! ```text
//! standard:  RecoverPanic → LogRequest → SecureHeaders
//! dynamic:   Session → Csrf → Authenticate
//! protected: Session → Csrf → Authenticate → RequireAuthentication
//! ```
//!
//! Every request runs the standard chain; API routes additionally run either
//! the dynamic or the protected chain, never both.

use crate::middleware::{auth, csrf, headers, logging, recover, session};
use crate::state::AppState;
use axum::{middleware::from_fn, middleware::from_fn_with_state, Router};
use std::any::Any;
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Panics below this point become a 500 with `Connection: close`.
    RecoverPanic,
    /// Request span and start/finish events.
    LogRequest,
    /// CORS and browser security headers.
    SecureHeaders,
    /// Load the session; commit it once on the way out.
    Session,
    /// Double-submit cookie check.
    Csrf,
    /// Session user → `AuthContext`.
    Authenticate,
    /// 401 unless the `AuthContext` is authenticated.
    RequireAuthentication,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        Self::new()
            .then(Stage::RecoverPanic)
            .then(Stage::LogRequest)
            .then(Stage::SecureHeaders)
    }

    pub fn dynamic() -> Self {
        Self::new()
            .then(Stage::Session)
            .then(Stage::Csrf)
            .then(Stage::Authenticate)
    }

    pub fn protected() -> Self {
        Self::dynamic().then(Stage::RequireAuthentication)
    }

    /// The session-aware chain for a route, gated if it requires authentication.
    pub fn for_route(requires_auth: bool) -> Self {
        if requires_auth {
            Self::protected()
        } else {
            Self::dynamic()
        }
    }

    /// Append a stage; it runs inside every stage added before it.
    pub fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Wrap every route of `router` in this pipeline.
    ///
    /// Axum runs the last added layer first, so stages are layered in reverse.
    pub fn apply(&self, router: Router<AppState>, state: &AppState) -> Router<AppState> {
        self.stages
            .iter()
            .rev()
            .fold(router, |router, stage| stage.wrap(router, state))
    }
}

impl Stage {
    /// Standard stages wrap the whole router, fallback included. Session-aware
    /// stages use `route_layer` so they only run for a matched route and an
    /// unknown path falls through to a plain 404.
    fn wrap(self, router: Router<AppState>, state: &AppState) -> Router<AppState> {
        match self {
            Stage::RecoverPanic => {
                let config = state.config.clone();
                router.layer(CatchPanicLayer::custom(move |err: Box<dyn Any + Send + 'static>| {
                    recover::handle_panic(&config, err)
                }))
            }
            Stage::LogRequest => router.layer(
                TraceLayer::new_for_http()
                    .make_span_with(logging::request_span)
                    .on_request(DefaultOnRequest::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
            Stage::SecureHeaders => {
                router.layer(from_fn_with_state(state.clone(), headers::secure_headers))
            }
            Stage::Session => {
                router.route_layer(from_fn_with_state(state.clone(), session::load_and_save))
            }
            Stage::Csrf => router.route_layer(from_fn_with_state(state.clone(), csrf::protect)),
            Stage::Authenticate => {
                router.route_layer(from_fn_with_state(state.clone(), auth::authenticate))
            }
            Stage::RequireAuthentication => {
                router.route_layer(from_fn(auth::require_authentication))
            }
        }
    }
}
