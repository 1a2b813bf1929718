//! Request and response bodies of the public API.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ulid::Ulid;
use utoipa::ToSchema;

use crate::verification::{
    Applicant, ApplicantForm, ConfirmationForm, ContactType, FlowState, Step, VerificationRecord,
};

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub kind: String,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

/// First step as submitted by the client. Absent fields count as empty.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicantRequest {
    pub name: String,
    pub age: String,
    pub contact: String,
    pub contact_type: ContactType,
    pub company: String,
}

impl From<ApplicantRequest> for ApplicantForm {
    fn from(request: ApplicantRequest) -> Self {
        Self {
            name: request.name,
            age: request.age,
            contact: request.contact,
            contact_type: request.contact_type,
            company: request.company,
        }
    }
}

/// Second step. `photo` is a reference to the captured image; only its presence matters.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfirmationRequest {
    pub code: String,
    pub photo: Option<String>,
    pub movie_name: String,
    pub movie_date: String,
    pub movie_time: String,
}

impl From<ConfirmationRequest> for ConfirmationForm {
    fn from(request: ConfirmationRequest) -> Self {
        Self {
            code: request.code,
            photo_present: request.photo.is_some_and(|photo| !photo.is_empty()),
            movie_name: request.movie_name,
            movie_date: request.movie_date,
            movie_time: request.movie_time,
        }
    }
}

/// Public view of a flow. The session code is never exposed.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FlowView {
    pub id: String,
    pub step: Step,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant: Option<Applicant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<VerificationRecord>,
}

impl FlowView {
    #[must_use]
    pub fn new(id: Ulid, state: &FlowState) -> Self {
        let (applicant, record) = match state {
            FlowState::Collect => (None, None),
            FlowState::Confirm { applicant, .. } => (Some(applicant.clone()), None),
            FlowState::Issued { record } => (None, Some(Arc::clone(record))),
        };

        Self {
            id: id.to_string(),
            step: state.step(),
            applicant,
            verification_code: record
                .as_ref()
                .map(|record| record.verification_code.clone()),
            record: record.map(|record| (*record).clone()),
        }
    }
}

/// Request accepted by the code delivery backend.
///
/// Fields stay optional so a partial body is answered with the backend's own
/// `Missing required fields` error instead of a deserialization failure.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SendCodeRequest {
    pub contact_type: Option<String>,
    pub contact: Option<String>,
    pub code: Option<String>,
}

/// Admin lookup result.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    pub company_label: String,
    pub record: VerificationRecord,
}
