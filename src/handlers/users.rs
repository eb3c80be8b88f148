//! # User Handlers
//!
//! Signup, login, logout and a session status endpoint.
//!
//! ## Token rotation
//! Login and logout change what the session is allowed to do, so both call
//! `SessionManager::renew_token` *before* touching `authenticatedUserID`. A
//! token captured before the change is already dead by the time the new
//! privilege state exists.

use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::middleware::auth::AuthContext;
use crate::session::{SessionHandle, AUTHENTICATED_USER_ID};
use crate::state::AppState;
use crate::validator::{self, Validator, EMAIL_RX};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SignupInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignupInput {
    pub fn validate(&self) -> Validator {
        let mut form = Validator::new();
        form.check_field(validator::not_blank(&self.name), "name", "This field cannot be blank");
        form.check_field(validator::not_blank(&self.email), "email", "This field cannot be blank");
        form.check_field(
            validator::matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        form.check_field(
            validator::not_blank(&self.password),
            "password",
            "This field cannot be blank",
        );
        form.check_field(
            validator::min_chars(&self.password, 8),
            "password",
            "This field must be at least 8 characters long",
        );
        form
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginInput {
    /// Email shape is checked too, as a typo catcher; the real check is the
    /// credential lookup.
    pub fn validate(&self) -> Validator {
        let mut form = Validator::new();
        form.check_field(validator::not_blank(&self.email), "email", "This field cannot be blank");
        form.check_field(
            validator::matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        form.check_field(
            validator::not_blank(&self.password),
            "password",
            "This field cannot be blank",
        );
        form
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub uuid: String,
    pub email: String,
    pub flash: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub flash: String,
}

/// POST /api/user/signup
///
/// ## Request
/// ```json
/// { "name": "Ann", "email": "ann@example.com", "password": "longenough" }
/// ```
///
/// ## Responses
/// - 200 `{"uuid": "...", "email": "ann@example.com", "flash": "..."}`
/// - 400 field errors, including `email` when the address is already taken
pub async fn signup(
    State(state): State<AppState>,
    session: SessionHandle,
    ApiJson(input): ApiJson<SignupInput>,
) -> AppResult<Json<UserResponse>> {
    let mut form = input.validate();
    if !form.valid() {
        return Err(AppError::InvalidInput(form));
    }

    let uuid = Uuid::new_v4().to_string();
    match users::insert(&state.db, &uuid, &input.name, &input.email, &input.password).await {
        Ok(_) => {}
        Err(AppError::DuplicateEmail) => {
            tracing::info!("Signup with an email already in use");
            form.add_field_error("email", "Email address is already in use");
            return Err(AppError::InvalidInput(form));
        }
        Err(e) => return Err(e),
    }
    tracing::info!(user_id = %uuid, "User signed up");

    session.set_flash("Your signup was successful. Please log in.")?;

    Ok(Json(UserResponse {
        uuid,
        email: input.email,
        flash: session.pop_flash(),
    }))
}

/// POST /api/user/login
///
/// ## Responses
/// - 200 `{"uuid", "email", "flash"}` with a new session cookie
/// - 400 field errors for malformed input
/// - 401 `{"non_field_errors": ["Email or password is incorrect"]}`; the
///   session token is left alone
pub async fn login(
    State(state): State<AppState>,
    session: SessionHandle,
    ApiJson(input): ApiJson<LoginInput>,
) -> AppResult<Json<UserResponse>> {
    let mut form = input.validate();
    if !form.valid() {
        return Err(AppError::InvalidInput(form));
    }

    let Some(user_id) = users::authenticate(&state.db, &input.email, &input.password).await? else {
        tracing::info!("Login rejected");
        form.add_non_field_error("Email or password is incorrect");
        return Err(AppError::InvalidCredentials(form));
    };

    state.sessions.renew_token(&session).await?;
    session.put(AUTHENTICATED_USER_ID, &user_id)?;
    tracing::info!(user_id = %user_id, "User logged in");

    session.set_flash("Login successful!")?;

    Ok(Json(UserResponse {
        uuid: user_id,
        email: input.email,
        flash: session.pop_flash(),
    }))
}

/// POST /api/user/logout (protected)
///
/// Rotates the token, then forgets the user. Any request body is ignored.
pub async fn logout(
    State(state): State<AppState>,
    session: SessionHandle,
) -> AppResult<Json<LogoutResponse>> {
    state.sessions.renew_token(&session).await?;
    session.remove(AUTHENTICATED_USER_ID);
    tracing::info!("User logged out");

    session.set_flash("You've been logged out successfully!")?;

    Ok(Json(LogoutResponse {
        flash: session.pop_flash(),
    }))
}

#[derive(Debug, Default, Serialize)]
pub struct SessionInfo {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// GET /api/user/session
///
/// Lets the frontend ask whether it is logged in, and as whom, without hitting
/// a protected route and handling a 401.
///
/// ## Response
/// ```json
/// { "authenticated": true, "user_id": "...", "name": "Ann", "email": "ann@example.com" }
/// ```
/// Anonymous callers get `{"authenticated": false}`.
pub async fn session_info(
    State(state): State<AppState>,
    auth: AuthContext,
) -> AppResult<Json<SessionInfo>> {
    let Some(user_id) = auth.user_id() else {
        return Ok(Json(SessionInfo::default()));
    };

    let user = users::find_by_id(&state.db, user_id).await?;
    Ok(Json(SessionInfo {
        authenticated: true,
        user_id: Some(user.uuid),
        name: Some(user.name),
        email: Some(user.email),
    }))
}
