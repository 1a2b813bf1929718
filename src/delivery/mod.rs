//! Session code delivery.
//!
//! The flow only sees the [`Delivery`] trait: hand over `{contactType, contact,
//! code}` and learn whether it was sent. Two implementations exist:
//!
//! - [`HttpDelivery`] posts the request to a remote collaborator and treats any
//!   non-2xx status, `success: false`, or unreadable reply as a failure.
//! - [`LocalDelivery`] calls the in-process [`CodeSenders`], the same senders
//!   behind the `/v1/send-code` endpoint.

mod http;
mod local;
pub mod sender;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use utoipa::ToSchema;

use crate::verification::ContactType;

pub use http::HttpDelivery;
pub use local::LocalDelivery;
pub use sender::{CodeSenders, LogCodeSender, SmscSender, SmtpSender};

/// Message used when the collaborator rejects a code without saying why.
pub const DEFAULT_REJECTION: &str = "Could not send the code. Check the delivery settings.";

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRequest {
    pub contact_type: ContactType,
    pub contact: String,
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DeliveryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The collaborator answered and refused; the message is shown to the user.
    #[error("{0}")]
    Rejected(String),

    #[error("Could not reach the code delivery service")]
    Unreachable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryMode {
    Local,
    Remote,
}

impl DeliveryMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// Caller side of the delivery collaborator contract.
pub trait Delivery: Send + Sync {
    fn deliver<'a>(
        &'a self,
        request: &'a DeliveryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>;

    fn mode(&self) -> DeliveryMode;
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn request_uses_collaborator_field_names() -> Result<()> {
        let request = DeliveryRequest {
            contact_type: ContactType::Phone,
            contact: "+7 999 123 45 67".to_string(),
            code: "482913".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        assert_eq!(
            value,
            serde_json::json!({
                "contactType": "phone",
                "contact": "+7 999 123 45 67",
                "code": "482913"
            })
        );
        Ok(())
    }

    #[test]
    fn response_without_success_is_a_failure() -> Result<()> {
        let response: DeliveryResponse = serde_json::from_str(r#"{"error":"boom"}"#)?;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("boom"));
        Ok(())
    }

    #[test]
    fn mode_labels() {
        assert_eq!(DeliveryMode::Local.as_str(), "local");
        assert_eq!(DeliveryMode::Remote.as_str(), "remote");
    }
}
