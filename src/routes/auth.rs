use crate::common::ApiResult;
use crate::extractors::Operator;
use crate::models::Profile;
use crate::models::dtos::auth::LoginBodyDto;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginBodyDto>, JsonRejection>,
) -> ApiResult<Json<Profile>> {
    let Json(body) = body?;
    let profile = state.auth.login(&body.username, &body.password).await?;
    Ok(Json(profile))
}

pub async fn logout(State(state): State<AppState>) -> StatusCode {
    state.auth.logout();
    StatusCode::NO_CONTENT
}

pub async fn me(Operator(profile): Operator) -> Json<Profile> {
    Json(profile)
}
