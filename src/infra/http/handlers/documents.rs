//! Document ledger handlers.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::documents::DocumentUpload;
use crate::application::workflow::Actor;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::{
    DocumentContentResponse, DocumentResponse, DocumentUploadRequest, decode_base64,
};
use crate::infra::http::state::AppState;

pub async fn list_documents(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DocumentResponse>>, ApiError> {
    let listed = state.documents.list(id, &actor).await?;
    Ok(Json(listed.into_iter().map(Into::into).collect()))
}

pub async fn upload_document(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<DocumentUploadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let upload = to_upload(request)?;
    let appended = state.documents.append(id, &actor, upload).await?;
    Ok((StatusCode::CREATED, Json(DocumentResponse::from(appended))))
}

/// Replacement is keyed on the upload's requirement name; the superseded
/// row's position is preserved. An unmatched requirement appends instead.
pub async fn replace_document(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<DocumentUploadRequest>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let upload = to_upload(request)?;
    let replaced = state.documents.replace(id, &actor, upload).await?;
    Ok(Json(replaced.into()))
}

pub async fn get_document(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, index)): Path<(Uuid, i32)>,
) -> Result<Json<DocumentContentResponse>, ApiError> {
    let document = state.documents.get_by_index(id, index, &actor).await?;
    Ok(Json(document.into()))
}

fn to_upload(request: DocumentUploadRequest) -> Result<DocumentUpload, ApiError> {
    Ok(DocumentUpload {
        requirement_name: request.requirement_name,
        file_name: request.file_name,
        content_type: request.content_type,
        content: decode_base64(&request.content)?,
        notes: request.notes,
    })
}
