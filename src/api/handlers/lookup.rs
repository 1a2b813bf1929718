use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    error_response,
    types::{ErrorBody, LookupResponse},
};
use crate::verification::LookupService;

#[utoipa::path(
    get,
    path = "/v1/verifications/{code}",
    params(("code" = String, Path, description = "Six character lookup code, any case")),
    responses(
        (status = 200, description = "Verification record", body = LookupResponse),
        (status = 400, description = "Code is not six characters long", body = ErrorBody),
        (status = 404, description = "No verification issued under this code", body = ErrorBody),
    ),
    tag = "verifications"
)]
#[instrument(skip(lookup))]
pub async fn lookup(lookup: Extension<Arc<LookupService>>, Path(code): Path<String>) -> Response {
    match lookup.lookup(&code) {
        Ok(Some(record)) => Json(LookupResponse {
            company_label: record.company.label().to_string(),
            record: (*record).clone(),
        })
        .into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            "Verification code not found",
        ),
        Err(err) => err.into_response(),
    }
}
