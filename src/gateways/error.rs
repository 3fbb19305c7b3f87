use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("No active session, please sign in")]
    Unauthenticated,

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Failed to reach {operation}: {reason}")]
    Transport { operation: String, reason: String },

    #[error("Unexpected response for {operation}: {reason}")]
    Decode { operation: String, reason: String },
}

impl GatewayError {
    pub(crate) fn unknown(operation: &str, status: u16) -> Self {
        GatewayError::Remote {
            status,
            message: format!("Unknown error for {operation}"),
        }
    }

    pub(crate) fn transport(operation: &str, err: impl std::fmt::Display) -> Self {
        GatewayError::Transport {
            operation: operation.to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn decode(operation: &str, err: impl std::fmt::Display) -> Self {
        GatewayError::Decode {
            operation: operation.to_string(),
            reason: err.to_string(),
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
