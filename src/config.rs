//! # Configuration Management
//!
//! Configuration comes from environment variables, with an optional `.env`
//! file loaded first for local development.
//!
//! ## Environment Variables
//! - `HOST`: Server bind address (default: 127.0.0.1)
//! - `PORT`: Server port (default: 4000)
//! - `DATABASE_URL`: SQLite connection string for users, todos and sessions
//! - `ALLOWED_ORIGIN`: Frontend origin allowed by CORS (default: http://localhost:3000)
//! - `SESSION_LIFETIME_HOURS`: How long a session lives after its last write (default: 12)
//! - `SECURE_COOKIES`: Send cookies with the `Secure` attribute (default: true)
//! - `STATIC_DIR`: Directory served under `/static` (default: ./ui/static)

use anyhow::{Context, Result};
use std::env;

/// Application configuration
///
/// All fields are public; the config is read once in `main` and shared through
/// `AppState` behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host/IP address to bind to
    pub host: String,

    /// Server port number
    pub port: u16,

    /// SQLite database connection URL
    /// Format: "sqlite:filename.db?mode=rwc" (read, write, create if missing)
    pub database_url: String,

    /// Origin of the frontend that calls this API with credentials
    /// Sent back verbatim in `Access-Control-Allow-Origin`
    pub allowed_origin: String,

    /// Session lifetime in hours
    pub session_lifetime_hours: i64,

    /// Whether session and CSRF cookies carry `Secure`
    /// Only turn this off for plain-HTTP local development
    pub secure_cookies: bool,

    pub static_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 4000,
            database_url: "sqlite:todo.db?mode=rwc".to_string(),
            allowed_origin: "http://localhost:3000".to_string(),
            session_lifetime_hours: 12,
            secure_cookies: true,
            static_dir: "./ui/static".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Variables that are not set fall back to `Config::default()`. Variables
    /// that are set but do not parse are an error, so a typo never silently
    /// turns into a default.
    ///
    /// ## Example .env file
    /// ```text
    /// HOST=127.0.0.1
    /// PORT=4000
    /// DATABASE_URL=sqlite:todo.db?mode=rwc
    /// ALLOWED_ORIGIN=http://localhost:3000
    /// SESSION_LIFETIME_HOURS=12
    /// SECURE_COOKIES=true
    /// ```
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (dotenvy doesn't error if file missing)
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        Ok(Config {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            allowed_origin: env::var("ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin),
            session_lifetime_hours: parse_var(
                "SESSION_LIFETIME_HOURS",
                defaults.session_lifetime_hours,
            )?,
            secure_cookies: parse_var("SECURE_COOKIES", defaults.secure_cookies)?,
            static_dir: env::var("STATIC_DIR").unwrap_or(defaults.static_dir),
        })
    }

    /// Get the socket address to bind the server to, e.g. "127.0.0.1:4000"
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
