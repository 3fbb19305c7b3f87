use crate::gateways::GatewayError;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ApiError {
    Unauthenticated,
    Validation(String),
    MissingTimeRange,
    NotFound(String),
    /// A newer query for the same key was issued while this one was in flight.
    Superseded { seq: u64, latest: u64 },
    Gateway(GatewayError),
    BadRequest(anyhow::Error),
    Internal(anyhow::Error),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthenticated => f.write_str("No active session, please sign in"),
            ApiError::Validation(message) => f.write_str(message),
            ApiError::MissingTimeRange => f.write_str("Please select start and end time"),
            ApiError::NotFound(message) => f.write_str(message),
            ApiError::Superseded { seq, latest } => {
                write!(f, "Query {seq} was superseded by query {latest}")
            }
            ApiError::Gateway(err) => write!(f, "{err}"),
            ApiError::BadRequest(err) => write!(f, "{err}"),
            ApiError::Internal(_) => {
                f.write_str("An internal error occurred. Please try again later.")
            }
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) | ApiError::MissingTimeRange | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Superseded { .. } => StatusCode::CONFLICT,
            ApiError::Gateway(err) => match err {
                GatewayError::Unauthenticated => StatusCode::UNAUTHORIZED,
                GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
                // client errors of the upstream are the caller's errors too
                GatewayError::Remote { status, .. } if (400..500).contains(status) => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", message);
        } else {
            tracing::warn!("{}", message);
        }
        if let ApiError::Internal(err) = &self {
            tracing::error!("{:?}", err);
            err.chain()
                .skip(1)
                .for_each(|cause| tracing::error!("Because: {}", cause));
        }
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::Unauthenticated => ApiError::Unauthenticated,
            GatewayError::NotFound(message) => ApiError::NotFound(message),
            other => ApiError::Gateway(other),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(anyhow::anyhow!(value.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::BadRequest(anyhow::anyhow!(value.body_text()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(value: MultipartError) -> Self {
        Self::BadRequest(anyhow::anyhow!(value.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_statuses() {
        let remote = |status| {
            ApiError::from(GatewayError::Remote {
                status,
                message: "nope".into(),
            })
        };
        assert_eq!(remote(409).status(), StatusCode::CONFLICT);
        assert_eq!(remote(500).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::from(GatewayError::transport("list devices", "refused")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(GatewayError::Unauthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(GatewayError::NotFound("User not found".into())).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn keeps_remote_message() {
        let err = ApiError::from(GatewayError::Remote {
            status: 400,
            message: "ID number already exists".into(),
        });
        assert_eq!(err.to_string(), "ID number already exists");
    }
}
