//! # Application State
//!
//! Everything a request needs that outlives the request: the database pool,
//! the session service and the configuration. Axum clones this per request;
//! every field is a reference-counted handle.
//!
//! There is no global state: the pipeline and every handler get what they need
//! from here.

use crate::config::Config;
use crate::session::{SessionManager, SessionSettings};
use sqlx::SqlitePool;
use std::sync::Arc;
use time::Duration;
use tower_sessions::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool for users and todos
    pub db: SqlitePool,

    /// Session service used by the session stage and the login/logout handlers
    pub sessions: SessionManager,

    pub config: Arc<Config>,
}

impl AppState {
    /// Assemble the state from an already migrated pool and a session store.
    ///
    /// Session cookie attributes and lifetime are taken from `config`.
    pub fn new(config: Config, db: SqlitePool, session_store: Arc<dyn SessionStore>) -> Self {
        let settings = SessionSettings {
            lifetime: Duration::hours(config.session_lifetime_hours),
            secure: config.secure_cookies,
            ..SessionSettings::default()
        };

        AppState {
            db,
            sessions: SessionManager::new(session_store, settings),
            config: Arc::new(config),
        }
    }
}
