//! Response envelopes and error mapping.
//!
//! # Design Decisions
//! - Every error is a flat JSON object `{ error, txId? }`
//! - Status codes are derived from the error kind, never chosen by handlers
//! - Node rejections of a known kind are client-visible 400s

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::RejectionKind;

/// Caller-visible failure of a gateway function.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client-correctable input problem.
    #[error("{0}")]
    InvalidInput(String),

    /// Missing or malformed operator configuration.
    #[error("{0}")]
    Configuration(String),

    /// Ledger node unreachable before anything was submitted.
    #[error("{0}")]
    Network(String),

    /// Node refused the transaction.
    #[error("{message}")]
    Rejected { kind: RejectionKind, message: String },

    /// Submitted, but the outcome is unknown or unusable.
    #[error("{message}")]
    Unconfirmed { message: String, tx_id: String },

    #[error("{0}")]
    Internal(String),

    #[error("Method not allowed. Only POST requests are supported.")]
    MethodNotAllowed,

    #[error("Request body too large.")]
    PayloadTooLarge,

    #[error("Request timed out.")]
    TimedOut,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) | Self::Internal(_) | Self::Unconfirmed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Rejected { kind, .. } => match kind {
                RejectionKind::Other => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::TimedOut => StatusCode::REQUEST_TIMEOUT,
        }
    }

    /// Transaction id to surface alongside the error, if one exists.
    pub fn tx_id(&self) -> Option<&str> {
        match self {
            Self::Unconfirmed { tx_id, .. } => Some(tx_id),
            _ => None,
        }
    }
}

/// Wire form of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(rename = "txId", default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
}

impl From<&ApiError> for ErrorBody {
    fn from(err: &ApiError) -> Self {
        Self {
            error: err.to_string(),
            tx_id: err.tx_id().map(str::to_string),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::InvalidInput("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Network("x".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Rejected {
                kind: RejectionKind::InsufficientFunds,
                message: "x".into()
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Rejected {
                kind: RejectionKind::Other,
                message: "x".into()
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(ApiError::TimedOut.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn test_error_body_includes_tx_id_only_when_known() {
        let body = ErrorBody::from(&ApiError::Unconfirmed {
            message: "pending".into(),
            tx_id: "TX1".into(),
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "pending");
        assert_eq!(json["txId"], "TX1");

        let json = serde_json::to_value(ErrorBody::from(&ApiError::Internal("boom".into()))).unwrap();
        assert!(json.get("txId").is_none());
    }
}
