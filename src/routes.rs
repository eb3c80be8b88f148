//! # Routes
//!
//! Each route is mounted on exactly one session-aware chain, chosen by whether
//! it requires authentication; the standard chain then wraps everything.

use crate::handlers::{csrf, health::health_check, todos, users};
use crate::pipeline::Pipeline;
use crate::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::services::ServeDir;

pub fn app(state: AppState) -> Router {
    // Session-aware, open to anonymous callers
    let public_api = Router::new()
        .route("/api/csrf-token", get(csrf::csrf_token))
        .route("/api/user/signup", post(users::signup))
        .route("/api/user/login", post(users::login))
        .route("/api/user/session", get(users::session_info));

    // Session-aware, 401 unless logged in
    let protected_api = Router::new()
        .route("/api/user/logout", post(users::logout))
        .route("/api/todo", get(todos::list).post(todos::create))
        .route(
            "/api/todo/{id}",
            get(todos::view).put(todos::update).delete(todos::delete),
        )
        .route("/api/todo/{id}/toggle", patch(todos::toggle));

    let router = Router::new()
        .route("/health", get(health_check))
        .merge(Pipeline::for_route(false).apply(public_api, &state))
        .merge(Pipeline::for_route(true).apply(protected_api, &state))
        .nest_service("/static", ServeDir::new(&state.config.static_dir));

    Pipeline::standard().apply(router, &state).with_state(state)
}
