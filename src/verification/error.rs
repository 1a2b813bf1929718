use thiserror::Error;
use ulid::Ulid;

use super::types::Step;
use crate::delivery::DeliveryError;

/// Reasons a flow refuses to move forward. None of them end the flow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("unknown company: {0}")]
    UnknownCompany(String),

    #[error("entered code does not match the code that was sent")]
    CodeMismatch,

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("cannot {action} while the flow is at step {step}")]
    InvalidStep { step: Step, action: &'static str },

    #[error("verification flow {0} not found")]
    UnknownFlow(Ulid),
}

impl FlowError {
    /// Stable machine readable tag used in API error bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingFields(_) => "missing_fields",
            Self::UnknownCompany(_) => "unknown_company",
            Self::CodeMismatch => "code_mismatch",
            Self::Delivery(_) => "delivery_failed",
            Self::InvalidStep { .. } => "invalid_step",
            Self::UnknownFlow(_) => "flow_not_found",
        }
    }
}

/// Admin lookups reject codes that cannot possibly match before searching.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("lookup code must be {expected} characters, got {length}")]
    MalformedCode { expected: usize, length: usize },
}
