use crate::common::{ApiError, ApiResult};
use crate::extractors::{Operator, REQUEST_SEQ_HEADER, RequestSeq};
use crate::models::HistoryEntry;
use crate::models::dtos::history::{
    ExpandQueryDto, HistoryQueryDto, HistoryResponseDto, HistoryRowDto,
};
use crate::state::AppState;
use crate::utils::FenceRefusal;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use std::collections::HashMap;

const UNKNOWN_NAME: &str = "Unknown";

pub async fn query(
    State(state): State<AppState>,
    Operator(operator): Operator,
    RequestSeq(requested): RequestSeq,
    expand: Result<Query<ExpandQueryDto>, QueryRejection>,
    body: Result<Json<HistoryQueryDto>, JsonRejection>,
) -> ApiResult<Json<HistoryResponseDto>> {
    let Query(expand) = expand?;
    let Json(body) = body?;
    if body.start_time.is_none() || body.end_time.is_none() {
        return Err(ApiError::MissingTimeRange);
    }
    let key = format!("history:{}", operator.id);
    let seq = state
        .fence
        .issue(&key, requested)
        .map_err(|refusal| match refusal {
            FenceRefusal::Stale { latest } => ApiError::Superseded {
                seq: requested.unwrap_or_default(),
                latest,
            },
            FenceRefusal::Exhausted => ApiError::BadRequest(anyhow::anyhow!(
                "Header '{REQUEST_SEQ_HEADER}' reached its largest value for this query"
            )),
        })?;

    let entries = state
        .history
        .reconcile(&body.user_ids, &body.device_ids, body.start_time, body.end_time)
        .await?;

    if !state.fence.is_latest(&key, seq) {
        return Err(ApiError::Superseded {
            seq,
            latest: state.fence.latest(&key),
        });
    }

    let entries = if expand.names() {
        with_names(&state, entries).await
    } else {
        entries
            .into_iter()
            .map(|entry| HistoryRowDto {
                entry,
                user_name: None,
                device_name: None,
            })
            .collect()
    };
    Ok(Json(HistoryResponseDto { seq, entries }))
}

async fn with_names(state: &AppState, entries: Vec<HistoryEntry>) -> Vec<HistoryRowDto> {
    let (users, devices) = futures::join!(state.users.names(), state.devices.names());
    let users = users.unwrap_or_else(|err| {
        tracing::warn!("Failed to resolve user names: {}", err);
        HashMap::new()
    });
    let devices = devices.unwrap_or_else(|err| {
        tracing::warn!("Failed to resolve device names: {}", err);
        HashMap::new()
    });
    let name = |names: &HashMap<String, String>, id: &str| {
        names
            .get(id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    };
    entries
        .into_iter()
        .map(|entry| HistoryRowDto {
            user_name: Some(name(&users, &entry.user_id)),
            device_name: entry.device_id.as_deref().map(|id| name(&devices, id)),
            entry,
        })
        .collect()
}
