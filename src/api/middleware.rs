use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::http::header::USER_AGENT;
use axum::middleware::Next;
use axum::response::Response;
use log::info;

/// Logs one line per request once the response status is known.
pub async fn log_request(request: Request, next: Next) -> Response {
    let addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| String::from("-"));
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let version = format!("{:?}", request.version());
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let response = next.run(request).await;

    info!(
        addr = addr.as_str(),
        method = method.as_str(),
        uri = uri.as_str(),
        version = version.as_str(),
        status = response.status().as_u16(),
        user_agent = user_agent.as_str();
        "request served"
    );
    response
}
