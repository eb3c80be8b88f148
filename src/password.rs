//! # Password hashing (Argon2id)
//!
//! - [`hash`] salts with [`OsRng`] and returns a PHC-format string
//!   (`$argon2id$v=19$m=19456,t=2,p=1$...`), stored in `users.hashed_password`.
//! - [`verify`] checks a plaintext against such a string.
//!
//! Both are deliberately slow and run on tokio's blocking pool so they never
//! stall the request workers. Results are never cached.

use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

pub async fn hash(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::PasswordHash(format!("Failed to hash password: {}", e)))
    })
    .await
    .map_err(|e| AppError::PasswordHash(format!("Hashing task failed: {}", e)))?
}

/// `Ok(false)` on mismatch; `Err` only if the stored hash is malformed.
pub async fn verify(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|e| AppError::PasswordHash(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::PasswordHash(format!("Verification task failed: {}", e)))?
}
