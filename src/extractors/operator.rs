use crate::common::ApiError;
use crate::models::Profile;
use crate::state::AppState;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;

/// Profile of the signed-in operator; rejects with 401 when nobody is signed in.
#[derive(Clone, Debug)]
pub struct Operator(pub Profile);

impl<S> FromRequestParts<S> for Operator
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(Self(state.auth.current()?))
    }
}
