use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status { status: u16, message: Option<String> },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Text shown inline to the user. The backend's own message wins when it
    /// sent one, otherwise `fallback` is used.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// Pull `{"message": "..."}` out of an error response body, if present
pub fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Please enter a valid NIC number (9 digits + V/v or 12 digits)")]
    InvalidNic,

    #[error("Passwords do not match!")]
    PasswordMismatch,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sort field: {0}")]
pub struct UnknownField(pub String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
