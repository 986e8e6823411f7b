//! Application intake, reads, and transition handlers.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::workflow::{Actor, RevisionUpload, TransitionCommand};
use crate::domain::applications::ApplicationRecord;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::{
    ApplicationViewResponse, RevisionRequest, SubmitBuildingRequest, SubmitOccupancyRequest,
    TransitionRequest, decode_base64,
};
use crate::infra::http::state::AppState;

pub async fn submit_building(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<SubmitBuildingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let application = state
        .workflow
        .submit_building(&actor, request.payload)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn submit_occupancy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<SubmitOccupancyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let application = state
        .workflow
        .submit_occupancy(&actor, &request.building_permit, request.payload)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn list_applications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<ApplicationViewResponse>>, ApiError> {
    let views = if actor.role.is_admin() {
        state.workflow.list_all(&actor).await?
    } else {
        state.workflow.list_for_applicant(&actor).await?
    };
    Ok(Json(views.into_iter().map(Into::into).collect()))
}

pub async fn get_application(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationViewResponse>, ApiError> {
    let view = state.workflow.get_application(id, &actor).await?;
    Ok(Json(view.into()))
}

pub async fn get_by_reference(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(reference): Path<String>,
) -> Result<Json<ApplicationViewResponse>, ApiError> {
    let view = state.workflow.get_by_reference(&reference, &actor).await?;
    Ok(Json(view.into()))
}

pub async fn apply_transition(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<ApplicationRecord>, ApiError> {
    if !actor.role.is_admin() {
        return Err(ApiError::forbidden(Some(format!(
            "role `{}` may not drive status transitions",
            actor.role.as_str()
        ))));
    }
    let command = TransitionCommand {
        comments: request.comments,
        missing_documents: request.missing_documents,
    };
    let updated = state
        .workflow
        .apply_transition(id, &request.status, &actor, command)
        .await?;
    Ok(Json(updated))
}

pub async fn resubmit_revisions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<RevisionRequest>,
) -> Result<Json<ApplicationRecord>, ApiError> {
    let mut files = Vec::with_capacity(request.files.len());
    for file in request.files {
        files.push(RevisionUpload {
            requirement_name: file.requirement_name,
            file_name: file.file_name,
            content_type: file.content_type,
            content: decode_base64(&file.content)?,
        });
    }
    let updated = state.workflow.resubmit_revisions(id, &actor, files).await?;
    Ok(Json(updated))
}
