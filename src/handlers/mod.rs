//! # HTTP Request Handlers
//!
//! Handlers are the last step of the pipeline. By the time one runs, the
//! middleware has already:
//! - loaded the session (extract `SessionHandle`)
//! - settled the CSRF token (extract `CsrfToken`)
//! - established who the caller is (extract `AuthContext`)
//! - for protected routes, rejected anonymous callers
//!
//! ## Submodules
//! - `health`: liveness check
//! - `csrf`: hands the current CSRF token to the client
//! - `users`: signup, login, logout, session status
//! - `todos`: todo CRUD (protected)
//!
//! Mutating handlers validate first and return `AppError::InvalidInput` with
//! the collected field errors before any storage call.

pub mod csrf;
pub mod health;
pub mod todos;
pub mod users;
