//! JSON envelopes for responses produced by tower layers.
//!
//! The body limit and request timeout answer with plain-text or empty
//! bodies. Those are rewritten into the same `{ error }` object the
//! handlers return.

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::response::ApiError;

pub async fn error_envelope(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;
    if is_json(&response) {
        return response;
    }

    match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge.into_response(),
        StatusCode::REQUEST_TIMEOUT => {
            tracing::warn!("Request exceeded its timeout");
            ApiError::TimedOut.into_response()
        }
        _ => response,
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
