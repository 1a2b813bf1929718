use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, instrument};
use ulid::Ulid;

use super::{
    error_response,
    types::{ApplicantRequest, ConfirmationRequest, ErrorBody, FlowView},
};
use crate::verification::{FlowRegistry, FlowState};

fn parse_flow_id(id: &str) -> Result<Ulid, Response> {
    Ulid::from_string(id).map_err(|_| {
        error_response(
            StatusCode::NOT_FOUND,
            "flow_not_found",
            format!("verification flow {id} not found"),
        )
    })
}

fn missing_payload() -> Response {
    error_response(StatusCode::BAD_REQUEST, "missing_payload", "Missing payload")
}

#[utoipa::path(
    post,
    path = "/v1/flows",
    responses(
        (status = 201, description = "Flow created at the collect step", body = FlowView),
    ),
    tag = "flows"
)]
#[instrument(skip(registry))]
pub async fn create(registry: Extension<Arc<FlowRegistry>>) -> impl IntoResponse {
    let id = registry.create().await;
    info!(flow_id = %id, "verification flow started");
    (
        StatusCode::CREATED,
        Json(FlowView::new(id, &FlowState::Collect)),
    )
}

#[utoipa::path(
    get,
    path = "/v1/flows/{id}",
    params(("id" = String, Path, description = "Flow id")),
    responses(
        (status = 200, description = "Current flow state", body = FlowView),
        (status = 404, description = "Flow not found", body = ErrorBody),
    ),
    tag = "flows"
)]
#[instrument(skip(registry))]
pub async fn show(registry: Extension<Arc<FlowRegistry>>, Path(id): Path<String>) -> Response {
    let id = match parse_flow_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match registry.get(id).await {
        Ok(state) => Json(FlowView::new(id, &state)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/flows/{id}/applicant",
    params(("id" = String, Path, description = "Flow id")),
    request_body = ApplicantRequest,
    responses(
        (status = 200, description = "Code delivered, flow moved to the confirm step", body = FlowView),
        (status = 400, description = "Missing payload", body = ErrorBody),
        (status = 404, description = "Flow not found", body = ErrorBody),
        (status = 409, description = "Flow is not collecting applicant details", body = ErrorBody),
        (status = 422, description = "Missing fields or unknown company", body = ErrorBody),
        (status = 502, description = "Code delivery failed", body = ErrorBody),
    ),
    tag = "flows"
)]
#[instrument(skip(registry, payload))]
pub async fn submit_applicant(
    registry: Extension<Arc<FlowRegistry>>,
    Path(id): Path<String>,
    payload: Option<Json<ApplicantRequest>>,
) -> Response {
    let id = match parse_flow_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match registry.submit_applicant(id, request.into()).await {
        Ok(state) => Json(FlowView::new(id, &state)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/flows/{id}/confirmation",
    params(("id" = String, Path, description = "Flow id")),
    request_body = ConfirmationRequest,
    responses(
        (status = 200, description = "Verification issued", body = FlowView),
        (status = 400, description = "Code mismatch or missing payload", body = ErrorBody),
        (status = 404, description = "Flow not found", body = ErrorBody),
        (status = 409, description = "Flow is not waiting for a confirmation", body = ErrorBody),
        (status = 422, description = "Photo or screening details missing", body = ErrorBody),
    ),
    tag = "flows"
)]
#[instrument(skip(registry, payload))]
pub async fn confirm(
    registry: Extension<Arc<FlowRegistry>>,
    Path(id): Path<String>,
    payload: Option<Json<ConfirmationRequest>>,
) -> Response {
    let id = match parse_flow_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match registry.confirm(id, request.into()).await {
        Ok(state) => Json(FlowView::new(id, &state)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/flows/{id}/reset",
    params(("id" = String, Path, description = "Flow id")),
    responses(
        (status = 200, description = "Flow back at the collect step", body = FlowView),
        (status = 404, description = "Flow not found", body = ErrorBody),
    ),
    tag = "flows"
)]
#[instrument(skip(registry))]
pub async fn reset(registry: Extension<Arc<FlowRegistry>>, Path(id): Path<String>) -> Response {
    let id = match parse_flow_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match registry.reset(id).await {
        Ok(state) => Json(FlowView::new(id, &state)).into_response(),
        Err(err) => err.into_response(),
    }
}
