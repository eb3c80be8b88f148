use axum::extract::{ConnectInfo, Request};
use std::net::SocketAddr;
use tracing::Span;

/// Span for one request: method, path, protocol and (when the server was
/// started with connect info) the peer address.
pub fn request_span(request: &Request) -> Span {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        protocol = ?request.version(),
        remote_addr = %remote_addr,
    )
}
