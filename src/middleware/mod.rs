//! # Middleware Module
//!
//! Every stage of the request pipeline lives here. `crate::pipeline` decides
//! their order; each module only knows its own job.
//!
//! ## Standard chain (every request)
//! - `recover`: turns panics into a plain 500 and closes the connection
//! - `logging`: one span per request with method, path, protocol and peer
//! - `headers`: CORS and browser security headers on every response
//!
//! ## Dynamic chain (API routes)
//! - `session`: loads the session and commits it exactly once on the way out
//! - `csrf`: double-submit cookie check on state-changing requests
//! - `auth`: derives the `AuthContext` and, for protected routes, gates on it

pub mod auth;
pub mod csrf;
pub mod headers;
pub mod logging;
pub mod recover;
pub mod session;
