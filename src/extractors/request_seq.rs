use crate::common::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub const REQUEST_SEQ_HEADER: &str = "x-request-seq";

/// Optional caller-chosen ordering of a query, see [`crate::utils::RequestFence`].
#[derive(Clone, Copy, Debug)]
pub struct RequestSeq(pub Option<u64>);

impl<S> FromRequestParts<S> for RequestSeq
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(REQUEST_SEQ_HEADER) else {
            return Ok(Self(None));
        };
        value
            .to_str()
            .ok()
            .and_then(|it| it.trim().parse::<u64>().ok())
            .map(|seq| Self(Some(seq)))
            .ok_or_else(|| {
                ApiError::BadRequest(anyhow::anyhow!(
                    "Header '{REQUEST_SEQ_HEADER}' must be an unsigned integer"
                ))
            })
    }
}
