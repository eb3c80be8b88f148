use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::password;
use sqlx::SqlitePool;

/// Hash the password and insert the user.
///
/// An email that is already registered gives `AppError::DuplicateEmail`.
pub async fn insert(
    pool: &SqlitePool,
    uuid: &str,
    name: &str,
    email: &str,
    plain_password: &str,
) -> AppResult<User> {
    let hashed = password::hash(plain_password).await?;
    let user = User::new(uuid.to_string(), name.to_string(), email.to_string(), hashed);

    sqlx::query(
        "INSERT INTO users (uuid, name, email, hashed_password, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&user.uuid)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.hashed_password)
    .bind(&user.created_at)
    .execute(pool)
    .await
    .map_err(|e| match e.as_database_error() {
        Some(db) if db.is_unique_violation() => AppError::DuplicateEmail,
        _ => AppError::Database(e),
    })?;

    Ok(user)
}

/// Check an email/password pair and return the user's uuid.
///
/// Unknown email and wrong password both give `Ok(None)`, so callers cannot
/// tell them apart.
pub async fn authenticate(
    pool: &SqlitePool,
    email: &str,
    plain_password: &str,
) -> AppResult<Option<String>> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT uuid, hashed_password FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

    let Some((uuid, hashed)) = row else {
        return Ok(None);
    };

    if password::verify(plain_password, &hashed).await? {
        Ok(Some(uuid))
    } else {
        Ok(None)
    }
}

pub async fn exists(pool: &SqlitePool, uuid: &str) -> AppResult<bool> {
    let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?)")
        .bind(uuid)
        .fetch_one(pool)
        .await?;

    Ok(found)
}

pub async fn find_by_id(pool: &SqlitePool, uuid: &str) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE uuid = ?")
        .bind(uuid)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("User with id '{}' not found", uuid)),
            _ => AppError::Database(e),
        })?;

    Ok(user)
}

pub async fn delete(pool: &SqlitePool, uuid: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM users WHERE uuid = ?")
        .bind(uuid)
        .execute(pool)
        .await?;

    Ok(())
}
