//! # Session Service
//!
//! Server-side sessions keyed by an opaque cookie token. Records live in any
//! `tower_sessions::SessionStore` (SQLite in production, memory in tests); this
//! module owns the request-level rules around them:
//!
//! 1. `SessionManager::load` runs once when a request enters the dynamic chain
//! 2. handlers read and write the payload through the request's `SessionHandle`
//! 3. `SessionManager::renew_token` swaps the token on every privilege change
//! 4. `SessionManager::commit` runs once on the way out and yields the cookie
//!
//! ## Expiry
//! Absolute, renewed on write: every commit that saves the record sets
//! `expiry = now + lifetime`. Untouched sessions keep their old expiry.

use crate::cookies;
use axum::{extract::FromRequestParts, http::request::Parts};
use cookie::Cookie;
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tower_sessions::{
    session::{Id, Record},
    session_store, SessionStore,
};

/// Key holding the logged-in user's uuid.
pub const AUTHENTICATED_USER_ID: &str = "authenticatedUserID";
/// Key holding the one-shot message for the next response.
pub const FLASH: &str = "flash";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session store: {0}")]
    Store(#[from] session_store::Error),

    #[error("session value: {0}")]
    Value(#[from] serde_json::Error),

    #[error("session committed twice in one request")]
    AlreadyCommitted,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub lifetime: Duration,
    pub secure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            lifetime: Duration::hours(12),
            secure: true,
        }
    }
}

/// Loads, renews and commits sessions against a store.
///
/// Cheap to clone; lives in `AppState` and is handed to the pipeline explicitly.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    settings: SessionSettings,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, settings: SessionSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Look up the record behind `token`.
    ///
    /// A missing, malformed, unknown or expired token all give a fresh empty
    /// session; nothing is written until something is put into it.
    pub async fn load(&self, token: Option<&str>) -> Result<SessionHandle, SessionError> {
        let Some(id) = token.and_then(|t| t.parse::<Id>().ok()) else {
            return Ok(SessionHandle::fresh());
        };

        match self.store.load(&id).await? {
            Some(record) if record.expiry_date > OffsetDateTime::now_utc() => {
                Ok(SessionHandle::from_record(record))
            }
            _ => Ok(SessionHandle::fresh()),
        }
    }

    /// Give the session a new token, keeping its payload.
    ///
    /// The old record is deleted right away, so the old token stops working
    /// before the caller changes any authentication state.
    pub async fn renew_token(&self, handle: &SessionHandle) -> Result<String, SessionError> {
        let (old, new) = {
            let mut state = handle.inner.lock();
            let new = Id::default();
            let was_persisted = state.persisted;
            let old = state.id.replace(new).filter(|_| was_persisted);
            state.persisted = false;
            state.renewed = true;
            state.modified = true;
            (old, new)
        };

        if let Some(old) = old {
            self.store.delete(&old).await?;
        }
        tracing::debug!("Session token renewed");

        Ok(new.to_string())
    }

    /// Persist the session if it changed and return the cookie to send.
    ///
    /// Allowed once per handle. Returns `Ok(None)` when there was nothing to write.
    pub async fn commit(
        &self,
        handle: &SessionHandle,
    ) -> Result<Option<Cookie<'static>>, SessionError> {
        let record = {
            let mut state = handle.inner.lock();
            if state.committed {
                return Err(SessionError::AlreadyCommitted);
            }
            state.committed = true;

            if !state.modified {
                return Ok(None);
            }
            if state.data.is_empty() && !state.persisted && !state.renewed {
                return Ok(None);
            }

            let id = *state.id.get_or_insert_with(Id::default);
            Record {
                id,
                data: state.data.clone(),
                expiry_date: OffsetDateTime::now_utc() + self.settings.lifetime,
            }
        };

        self.store.save(&record).await?;

        handle.inner.lock().persisted = true;

        Ok(Some(cookies::build(
            &self.settings.cookie_name,
            record.id.to_string(),
            self.settings.secure,
            Some(record.expiry_date),
        )))
    }
}

#[derive(Debug, Default)]
struct SessionState {
    id: Option<Id>,
    data: HashMap<String, Value>,
    /// A record for `id` exists in the store.
    persisted: bool,
    renewed: bool,
    modified: bool,
    committed: bool,
}

/// The current request's session.
///
/// Clones share the same state: the session middleware keeps one clone to
/// commit, downstream middleware and handlers extract another.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionHandle {
    fn fresh() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    fn from_record(record: Record) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                id: Some(record.id),
                data: record.data,
                persisted: true,
                ..SessionState::default()
            })),
        }
    }

    /// The token the client will hold after this request, if any.
    pub fn token(&self) -> Option<String> {
        self.inner.lock().id.map(|id| id.to_string())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        let state = self.inner.lock();
        match state.data.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub fn put<T: Serialize>(&self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        let mut state = self.inner.lock();
        state.data.insert(key.to_string(), value);
        state.modified = true;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut state = self.inner.lock();
        let removed = state.data.remove(key);
        if removed.is_some() {
            state.modified = true;
        }
        removed
    }

    /// Read a string value and delete it in one step. Absent or non-string
    /// values give an empty string.
    pub fn pop_string(&self, key: &str) -> String {
        match self.remove(key) {
            Some(Value::String(s)) => s,
            _ => String::new(),
        }
    }

    pub fn pop_flash(&self) -> String {
        self.pop_string(FLASH)
    }

    pub fn set_flash(&self, message: &str) -> Result<(), SessionError> {
        self.put(FLASH, message)
    }
}

/// Extract the handle the session stage stored in the request extensions.
impl<S: Send + Sync> FromRequestParts<S> for SessionHandle {
    type Rejection = crate::error::AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<SessionHandle>().cloned().ok_or_else(|| {
            crate::error::AppError::Internal("session stage is not installed".to_string())
        })
    }
}
