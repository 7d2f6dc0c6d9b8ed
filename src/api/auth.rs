use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use crate::api::handlers::ErrorResponse;
use crate::config::AuthConfig;

/// Passcode check for every protected route. Clients send the shared
/// passcode in the `X-Passcode` header; requests without it (or with the
/// wrong one) are rejected before any handler runs. With no passcode
/// configured the check is disabled for local development.
pub async fn require_passcode(
    State(auth): State<Arc<AuthConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = auth.passcode.as_deref() else {
        return next.run(request).await;
    };

    match extract_header_value(request.headers(), "x-passcode") {
        Some(provided) if provided == expected => next.run(request).await,
        Some(_) => {
            log::warn!("Rejected request with wrong passcode");
            unauthorized("Invalid passcode")
        }
        None => unauthorized("Missing X-Passcode header"),
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(message)),
    )
        .into_response()
}

/// Extract header value as string
fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.to_string())
}
