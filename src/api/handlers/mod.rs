//! API handlers and the mapping from domain errors to HTTP responses.

pub mod flows;
pub mod health;
pub mod lookup;
pub mod root;
pub mod send_code;
pub mod types;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use self::types::ErrorBody;
use crate::verification::{FlowError, LookupError};

/// JSON error response with a machine readable `kind`.
pub(crate) fn error_response(status: StatusCode, kind: &str, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            kind: kind.to_string(),
            error: error.into(),
            fields: None,
        }),
    )
        .into_response()
}

pub(crate) fn flow_error_status(err: &FlowError) -> StatusCode {
    match err {
        FlowError::MissingFields(_) | FlowError::UnknownCompany(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        FlowError::CodeMismatch => StatusCode::BAD_REQUEST,
        FlowError::Delivery(_) => StatusCode::BAD_GATEWAY,
        FlowError::InvalidStep { .. } => StatusCode::CONFLICT,
        FlowError::UnknownFlow(_) => StatusCode::NOT_FOUND,
    }
}

impl IntoResponse for FlowError {
    fn into_response(self) -> Response {
        let status = flow_error_status(&self);
        if status == StatusCode::BAD_GATEWAY {
            warn!("code delivery failed: {self}");
        } else {
            debug!(kind = self.kind(), "flow request rejected: {self}");
        }

        let fields = match &self {
            FlowError::MissingFields(fields) => {
                Some(fields.iter().map(|field| (*field).to_string()).collect())
            }
            _ => None,
        };

        (
            status,
            Json(ErrorBody {
                kind: self.kind().to_string(),
                error: self.to_string(),
                fields,
            }),
        )
            .into_response()
    }
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        error_response(StatusCode::BAD_REQUEST, "malformed_code", self.to_string())
    }
}
