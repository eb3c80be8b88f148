//! # Database Models
//!
//! Rows of the `users` and `todos` tables.
//!
//! Timestamps are RFC3339 strings: SQLite stores them as TEXT and they go to
//! JSON unchanged.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

/// Registered account
///
/// `hashed_password` is an Argon2 PHC string and is never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique identifier (UUID v4), also the value kept in the session
    pub uuid: String,

    pub name: String,

    /// Unique across all users (`users_uc_email`)
    pub email: String,

    #[serde(skip)]
    pub hashed_password: String,

    pub created_at: String,
}

impl User {
    pub fn new(uuid: String, name: String, email: String, hashed_password: String) -> Self {
        Self {
            uuid,
            name,
            email,
            hashed_password,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Todo {
    pub id: String,
    pub body: String,
    pub done: bool,
    pub created_at: String,
}

impl Todo {
    /// New, not yet done todo with a generated id
    pub fn new(body: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            body,
            done: false,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
