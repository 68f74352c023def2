use serde_json::Value;
use thiserror::Error;

/// Longest error body kept in a message.
const MAX_ERROR_CHARS: usize = 300;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Builds an HTTP error from a failed response body. The backend reports
    /// failures as `{"detail": "..."}`; other bodies are trimmed and truncated.
    #[must_use]
    pub fn from_body(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| match value.get("detail") {
                Some(Value::String(detail)) => Some(detail.clone()),
                _ => value
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });

        let message = detail.unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "Request failed.".to_string()
            } else {
                trimmed.chars().take(MAX_ERROR_CHARS).collect()
            }
        });

        Self::Http { status, message }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout("Request timed out. Please try again.".to_string())
        } else if err.is_decode() {
            Self::Parse(format!("Failed to decode response: {err}"))
        } else if err.is_builder() {
            Self::Config(format!("Failed to build request: {err}"))
        } else {
            Self::Network(format!("Unable to reach the server: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_is_extracted() {
        let err = ApiError::from_body(404, r#"{"detail":"Campaign not found"}"#);
        assert_eq!(
            err,
            ApiError::Http {
                status: 404,
                message: "Campaign not found".to_string()
            }
        );
        assert_eq!(err.to_string(), "Request failed (404): Campaign not found");
    }

    #[test]
    fn plain_bodies_are_truncated() {
        let body = "x".repeat(MAX_ERROR_CHARS + 50);
        let ApiError::Http { message, .. } = ApiError::from_body(500, &body) else {
            panic!("expected an HTTP error");
        };
        assert_eq!(message.len(), MAX_ERROR_CHARS);

        let ApiError::Http { message, .. } = ApiError::from_body(502, "  ") else {
            panic!("expected an HTTP error");
        };
        assert_eq!(message, "Request failed.");
    }
}
