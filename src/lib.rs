//! # Todo API
//!
//! A small session-authenticated JSON API. Requests pass through an ordered
//! middleware pipeline (panic recovery, logging, security headers, session,
//! CSRF, authentication, authorization) before reaching the todo and user
//! handlers.
//!
//! ## Modules
//! - `config`: environment-driven settings
//! - `state`: shared handles (database pool, session service, config)
//! - `pipeline`: middleware order as data
//! - `middleware`: the pipeline stages
//! - `session`: server-side sessions with token rotation
//! - `validator`: field and non-field error collection
//! - `extract`: JSON body extraction with the app's 400 shape
//! - `handlers` / `routes`: the HTTP surface
//! - `db` / `password`: storage and credential hashing

pub mod config;
pub mod cookies;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod pipeline;
pub mod routes;
pub mod session;
pub mod state;
pub mod validator;

pub use routes::app;
