//! # Database Module
//!
//! Storage for the two row types the API works with:
//! - `models`: `User` and `Todo`
//! - `users`: signup, credential check, existence lookups
//! - `todos`: plain CRUD
//!
//! Session records are not stored here; they go through the session store
//! (see `crate::session`), which keeps its own table in the same database.

pub mod models;
pub mod todos;
pub mod users;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Open the pool and bring the schema up to date.
///
/// Migrations from `./migrations` are embedded at compile time and tracked,
/// so running this on every start is safe.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePool::connect(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Private in-memory database, migrated.
///
/// Capped at one connection that is never recycled: every SQLite `:memory:`
/// connection is a separate database.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
