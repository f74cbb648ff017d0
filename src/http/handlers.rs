//! Function handlers.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

pub const SEND_DONATION: &str = "sendDonation";
pub const MINT_CERTIFICATE: &str = "mintCertificate";

/// `POST /sendDonation`
pub async fn send_donation(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let result = match require_json(&headers) {
        Ok(()) => state.donations.send(&body).await,
        Err(e) => Err(e),
    };
    respond(SEND_DONATION, start, result)
}

/// `POST /mintCertificate`
pub async fn mint_certificate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let result = match require_json(&headers) {
        Ok(()) => state.certificates.mint(&body).await,
        Err(e) => Err(e),
    };
    respond(MINT_CERTIFICATE, start, result)
}

/// CORS preflight. Headers are added by the CORS middleware.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
        .into_response()
}

/// Liveness report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub ledger_reachable: bool,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let ledger_reachable = state.ledger.is_healthy().await;
    Json(HealthReport {
        status: if ledger_reachable { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ledger_reachable,
    })
}

/// A declared content type must be JSON. An absent one is tolerated.
fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    match headers.get(CONTENT_TYPE) {
        None => Ok(()),
        Some(value) => {
            let is_json = value
                .to_str()
                .map(|v| v.trim_start().to_ascii_lowercase().starts_with("application/json"))
                .unwrap_or(false);
            if is_json {
                Ok(())
            } else {
                Err(ApiError::InvalidInput(
                    "Content-Type must be application/json.".to_string(),
                ))
            }
        }
    }
}

fn respond<T: Serialize>(
    function: &'static str,
    start: Instant,
    result: Result<T, ApiError>,
) -> Response {
    let response = match result {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(err) => {
            tracing::warn!(function, status = err.status().as_u16(), error = %err, "Function failed");
            err.into_response()
        }
    };
    metrics::record_request(function, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_require_json() {
        let mut headers = HeaderMap::new();
        assert!(require_json(&headers).is_ok());

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert!(require_json(&headers).is_ok());

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(matches!(
            require_json(&headers),
            Err(ApiError::InvalidInput(_))
        ));
    }
}
