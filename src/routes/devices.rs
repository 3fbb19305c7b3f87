use crate::common::ApiResult;
use crate::extractors::Operator;
use crate::models::{DEVICE_IMPORT_COLUMNS, Device, DeviceDraft, DeviceProfile, import_template};
use crate::routes::import::{read_import_file, template};
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;

pub async fn list(State(state): State<AppState>, _: Operator) -> ApiResult<Json<Vec<Device>>> {
    Ok(Json(state.devices.list().await?))
}

pub async fn profiles(
    State(state): State<AppState>,
    _: Operator,
) -> ApiResult<Json<Vec<DeviceProfile>>> {
    Ok(Json(state.devices.profiles().await?))
}

pub async fn get(
    State(state): State<AppState>,
    _: Operator,
    Path(id): Path<String>,
) -> ApiResult<Json<Device>> {
    Ok(Json(state.devices.get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    _: Operator,
    body: Result<Json<DeviceDraft>, JsonRejection>,
) -> ApiResult<Json<Vec<Device>>> {
    let Json(draft) = body?;
    Ok(Json(state.devices.create(draft).await?))
}

pub async fn update(
    State(state): State<AppState>,
    _: Operator,
    Path(id): Path<String>,
    body: Result<Json<DeviceDraft>, JsonRejection>,
) -> ApiResult<Json<Vec<Device>>> {
    let Json(draft) = body?;
    Ok(Json(state.devices.update(&id, draft).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    _: Operator,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Device>>> {
    Ok(Json(state.devices.delete(&id).await?))
}

pub async fn import(
    State(state): State<AppState>,
    _: Operator,
    multipart: Multipart,
) -> ApiResult<Json<Vec<Device>>> {
    let file = read_import_file(multipart).await?;
    Ok(Json(state.devices.import(file).await?))
}

pub async fn import_template_csv() -> impl IntoResponse {
    template("devices_template.csv", import_template(&DEVICE_IMPORT_COLUMNS))
}
