use crate::common::ApiResult;
use crate::extractors::Operator;
use crate::models::{USER_IMPORT_COLUMNS, User, UserDraft, UserPatch, import_template};
use crate::routes::import::{read_import_file, template};
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;

pub async fn list(State(state): State<AppState>, _: Operator) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.list().await?))
}

pub async fn get(
    State(state): State<AppState>,
    _: Operator,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    _: Operator,
    body: Result<Json<UserDraft>, JsonRejection>,
) -> ApiResult<Json<Vec<User>>> {
    let Json(draft) = body?;
    Ok(Json(state.users.create(draft).await?))
}

pub async fn update(
    State(state): State<AppState>,
    _: Operator,
    Path(id): Path<String>,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> ApiResult<Json<Vec<User>>> {
    let Json(patch) = body?;
    Ok(Json(state.users.update(&id, patch).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    _: Operator,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.delete(&id).await?))
}

pub async fn import(
    State(state): State<AppState>,
    _: Operator,
    multipart: Multipart,
) -> ApiResult<Json<Vec<User>>> {
    let file = read_import_file(multipart).await?;
    Ok(Json(state.users.import(file).await?))
}

pub async fn import_template_csv() -> impl IntoResponse {
    template("users_template.csv", import_template(&USER_IMPORT_COLUMNS))
}
