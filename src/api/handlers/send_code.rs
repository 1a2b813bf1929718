//! Code delivery backend, the in-process counterpart of the remote collaborator.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use std::sync::Arc;
use tracing::{error, instrument};

use super::types::SendCodeRequest;
use crate::delivery::{CodeSenders, DeliveryRequest, DeliveryResponse};
use crate::verification::ContactType;

fn failure(status: StatusCode, error: String) -> (StatusCode, Json<DeliveryResponse>) {
    (
        status,
        Json(DeliveryResponse {
            success: false,
            error: Some(error),
            message: None,
        }),
    )
}

/// Only `email` selects the email sender; any other contact type is sent by SMS.
fn delivery_request(request: SendCodeRequest) -> Option<DeliveryRequest> {
    let non_empty = |value: Option<String>| value.filter(|value| !value.is_empty());
    let contact_type = non_empty(request.contact_type)?;
    let contact = non_empty(request.contact)?;
    let code = non_empty(request.code)?;

    Some(DeliveryRequest {
        contact_type: if contact_type == "email" {
            ContactType::Email
        } else {
            ContactType::Phone
        },
        contact,
        code,
    })
}

#[utoipa::path(
    post,
    path = "/v1/send-code",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Code sent", body = DeliveryResponse),
        (status = 400, description = "Missing required fields", body = DeliveryResponse),
        (status = 500, description = "Sender failed", body = DeliveryResponse),
    ),
    tag = "delivery"
)]
#[instrument(skip(senders, payload))]
pub async fn send_code(
    senders: Extension<Arc<CodeSenders>>,
    payload: Option<Json<SendCodeRequest>>,
) -> impl IntoResponse {
    let Some(request) = payload.and_then(|Json(request)| delivery_request(request)) else {
        return failure(
            StatusCode::BAD_REQUEST,
            "Missing required fields".to_string(),
        );
    };

    match senders.send(&request).await {
        Ok(()) => (
            StatusCode::OK,
            Json(DeliveryResponse {
                success: true,
                error: None,
                message: Some("Code sent successfully".to_string()),
            }),
        ),
        Err(err) => {
            error!("Error sending code: {err:#}");
            failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(contact_type: &str, contact: &str, code: &str) -> SendCodeRequest {
        SendCodeRequest {
            contact_type: Some(contact_type.to_string()),
            contact: Some(contact.to_string()),
            code: Some(code.to_string()),
        }
    }

    #[test]
    fn every_field_is_required() {
        assert!(delivery_request(SendCodeRequest::default()).is_none());
        assert!(delivery_request(request("", "a@b.com", "482913")).is_none());
        assert!(delivery_request(request("email", "", "482913")).is_none());
        assert!(delivery_request(request("email", "a@b.com", "")).is_none());
    }

    #[test]
    fn anything_but_email_goes_by_sms() {
        let email = delivery_request(request("email", "a@b.com", "482913"));
        assert_eq!(email.map(|r| r.contact_type), Some(ContactType::Email));

        let phone = delivery_request(request("phone", "+79991234567", "482913"));
        assert_eq!(phone.map(|r| r.contact_type), Some(ContactType::Phone));

        let other = delivery_request(request("telegram", "@ivan", "482913"));
        assert_eq!(other.map(|r| r.contact_type), Some(ContactType::Phone));
    }
}
