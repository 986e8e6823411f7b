//! Checklist flag/resolve handlers.

use axum::Json;
use axum::extract::{Extension, Path, State};
use uuid::Uuid;

use crate::application::workflow::Actor;
use crate::domain::applications::ApplicationRecord;
use crate::domain::checklist::ItemKey;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::{ChecklistFlagRequest, ChecklistItemRef, ChecklistResolveRequest};
use crate::infra::http::state::AppState;

pub async fn flag_checklist_items(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChecklistFlagRequest>,
) -> Result<Json<ApplicationRecord>, ApiError> {
    let updated = state
        .checklist
        .flag_items(id, to_keys(request.items), request.note, &actor)
        .await?;
    Ok(Json(updated))
}

pub async fn resolve_checklist_items(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChecklistResolveRequest>,
) -> Result<Json<ApplicationRecord>, ApiError> {
    let updated = state
        .checklist
        .resolve_items(id, to_keys(request.items), &actor)
        .await?;
    Ok(Json(updated))
}

fn to_keys(items: Vec<ChecklistItemRef>) -> Vec<ItemKey> {
    items
        .into_iter()
        .map(|item| ItemKey {
            category: item.category,
            item: item.item,
        })
        .collect()
}
