use serde::Deserialize;
use thiserror::Error;

/// Error code the backend attaches to a 401 when the access token expired
/// but the refresh token may still be good.
pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Unauthorized: {message}")]
    Unauthorized {
        code: Option<String>,
        message: String,
    },

    #[error("{0}")]
    ValidationFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error payload returned by the auth backend: `{ code, message }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Parse an error payload, tolerating empty or non-JSON bodies.
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed = ErrorBody::parse(body);
        let message = parsed
            .message
            .clone()
            .unwrap_or_else(|| Self::truncate_body(body));
        match status {
            401 => ApiError::Unauthorized {
                code: parsed.code,
                message: if message.is_empty() {
                    "Unauthorized".to_string()
                } else {
                    message
                },
            },
            400..=499 => ApiError::ValidationFailed(if message.is_empty() {
                format!("Request rejected with status {}", status)
            } else {
                message
            }),
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// True for a 401 whose code says the access token merely expired.
    pub fn is_token_expired(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized { code: Some(code), .. } if code == TOKEN_EXPIRED
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Message suitable for showing next to a form.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized { message, .. } => message.clone(),
            ApiError::ValidationFailed(message) => message.clone(),
            ApiError::NetworkError(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            ApiError::ServerError(_) | ApiError::InvalidResponse(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::NetworkError(err.to_string())
        }
    }
}
