use crate::error::{AppError, AppResult};
use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::Response,
};
use cookie::{Cookie, SameSite};
use time::OffsetDateTime;

/// Value of the first cookie called `name` in the request's `Cookie` headers.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

/// HttpOnly cookie scoped to the whole site.
pub fn build(
    name: &str,
    value: String,
    secure: bool,
    expires: Option<OffsetDateTime>,
) -> Cookie<'static> {
    let mut cookie = Cookie::build((name.to_string(), value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build();
    if let Some(expires) = expires {
        cookie.set_expires(expires);
    }
    cookie
}

/// Add a `Set-Cookie` header without touching ones already there.
pub fn append(response: &mut Response, cookie: &Cookie<'_>) -> AppResult<()> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| AppError::Internal(format!("Invalid cookie header: {}", e)))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
