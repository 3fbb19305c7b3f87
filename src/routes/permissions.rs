use crate::common::ApiResult;
use crate::extractors::Operator;
use crate::models::{Permission, PermissionDraft};
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};

pub async fn list(State(state): State<AppState>, _: Operator) -> ApiResult<Json<Vec<Permission>>> {
    Ok(Json(state.permissions.list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    _: Operator,
    body: Result<Json<PermissionDraft>, JsonRejection>,
) -> ApiResult<Json<Vec<Permission>>> {
    let Json(draft) = body?;
    Ok(Json(state.permissions.create(draft).await?))
}

pub async fn update(
    State(state): State<AppState>,
    _: Operator,
    Path(id): Path<String>,
    body: Result<Json<PermissionDraft>, JsonRejection>,
) -> ApiResult<Json<Vec<Permission>>> {
    let Json(draft) = body?;
    Ok(Json(state.permissions.update(&id, draft).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    _: Operator,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Permission>>> {
    Ok(Json(state.permissions.delete(&id).await?))
}
