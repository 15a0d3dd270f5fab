use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback text when the backend rejects a request without saying why.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// A request the backend answered with `success: false`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    /// Prefers the `error` field, then `message`, then [`UNKNOWN_ERROR`].
    pub fn from_reply(error: Option<String>, message: Option<String>) -> Self {
        let message = error
            .filter(|text| !text.trim().is_empty())
            .or(message.filter(|text| !text.trim().is_empty()))
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_text_falls_back_in_order() {
        assert_eq!(
            ApiError::from_reply(Some("boom".into()), Some("ignored".into())).message,
            "boom"
        );
        assert_eq!(
            ApiError::from_reply(None, Some("quota".into())).message,
            "quota"
        );
        assert_eq!(
            ApiError::from_reply(Some("  ".into()), None).message,
            UNKNOWN_ERROR
        );
    }
}
