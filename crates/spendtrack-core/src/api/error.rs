pub use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Server error ({status}): {message}")]
    ServerError { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Coarse failure classes used by views to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never completed
    Network,
    /// 401, or no credentials to send
    Auth,
    /// The response arrived but was missing required data
    Validation,
    /// Any other non-2xx status
    Server,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return ApiError::Unauthorized;
        }

        // Backends usually answer with {"message": "..."}; fall back to the raw body
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| Self::truncate_body(body));

        ApiError::ServerError { status, message }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized | ApiError::NotAuthenticated => ErrorKind::Auth,
            ApiError::ServerError { .. } => ErrorKind::Server,
            ApiError::NetworkError(_) => ErrorKind::Network,
            ApiError::InvalidResponse(_) => ErrorKind::Validation,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Server-provided message, when the server sent one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::ServerError { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}
