use crate::config::Config;
use crate::error::plain_status;
use crate::middleware::headers::apply_security_headers;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use std::any::Any;

/// Response for a panic caught by `CatchPanicLayer`.
///
/// The client gets the same generic 500 as any other server error. The
/// connection is closed afterwards since its state is unknown. This stage sits
/// outside `secure_headers`, so the security headers are applied here too.
pub fn handle_panic(config: &Config, err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!("Request handler panicked: {}", detail);

    let mut response = plain_status(StatusCode::INTERNAL_SERVER_ERROR);
    let headers = response.headers_mut();
    apply_security_headers(headers, config);
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}
