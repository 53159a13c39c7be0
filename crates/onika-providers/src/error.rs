//! Why a single upstream attempt failed.
//!
//! Every variant is ordinary data: the router records it, maybe retries, and
//! moves on. None of these ever reach the end user directly.

use std::time::Duration;

use thiserror::Error;

/// Longest upstream error body kept in a failure reason.
pub const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttemptError {
    /// The call did not finish within the layer's deadline.
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Non-2xx status. `body` is already truncated.
    #[error("HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    /// HTTP 429 or a provider-specific rate-limit marker.
    #[error("rate limited (HTTP {status}): {body}")]
    RateLimited { status: u16, body: String },

    /// DNS, TLS, connect, or mid-body I/O failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// 2xx whose body lacked the expected envelope.
    #[error("malformed response")]
    MalformedResponse,

    /// No credentials for the layer's provider.
    #[error("not configured")]
    NotConfigured,

    /// Paid layer skipped because the daily limit is reached.
    #[error("budget limit")]
    BudgetExceeded,
}

impl AttemptError {
    /// Classify a non-success response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = onika_core::utils::truncate_string(body.trim(), MAX_ERROR_BODY_CHARS);
        if status == 429 || has_rate_limit_marker(&body) {
            AttemptError::RateLimited { status, body }
        } else {
            AttemptError::Transport { status, body }
        }
    }

    /// Classify a 2xx body that failed to parse.
    ///
    /// Some aggregators report upstream throttling inside a 200 envelope as
    /// `{"error": {"code": 429, ...}}`; anything else is malformed.
    pub fn from_unparseable_body(body: &str) -> Self {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
            return AttemptError::MalformedResponse;
        };
        let Some(error) = value.get("error") else {
            return AttemptError::MalformedResponse;
        };
        let code = error.get("code").and_then(|c| c.as_u64());
        let text = error.to_string();
        if code == Some(429) || has_rate_limit_marker(&text) {
            AttemptError::RateLimited {
                status: 429,
                body: onika_core::utils::truncate_string(&text, MAX_ERROR_BODY_CHARS),
            }
        } else {
            AttemptError::MalformedResponse
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AttemptError::RateLimited { .. })
    }
}

fn has_rate_limit_marker(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["rate_limit", "rate limit", "ratelimit", "too many requests", "quota"]
        .iter()
        .any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_429_is_rate_limited() {
        let err = AttemptError::from_status(429, "slow down");
        assert!(err.is_rate_limit());
        assert_eq!(err.to_string(), "rate limited (HTTP 429): slow down");
    }

    #[test]
    fn test_marker_in_body_is_rate_limited() {
        let err = AttemptError::from_status(
            400,
            r#"{"error":{"type":"rate_limit_error","message":"Too many"}}"#,
        );
        assert!(err.is_rate_limit());
    }

    #[test]
    fn test_other_status_is_transport() {
        let err = AttemptError::from_status(503, "  upstream down \n");
        assert_eq!(
            err,
            AttemptError::Transport {
                status: 503,
                body: "upstream down".into()
            }
        );
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(1000);
        match AttemptError::from_status(500, &body) {
            AttemptError::Transport { body, .. } => {
                assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_body_classification() {
        assert_eq!(
            AttemptError::from_unparseable_body("<html>oops</html>"),
            AttemptError::MalformedResponse
        );
        assert_eq!(
            AttemptError::from_unparseable_body(r#"{"object":"list"}"#),
            AttemptError::MalformedResponse
        );
        assert!(AttemptError::from_unparseable_body(
            r#"{"error":{"code":429,"message":"Provider returned error"}}"#
        )
        .is_rate_limit());
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(AttemptError::MalformedResponse.to_string(), "malformed response");
        assert_eq!(AttemptError::BudgetExceeded.to_string(), "budget limit");
        assert_eq!(AttemptError::NotConfigured.to_string(), "not configured");
        assert_eq!(
            AttemptError::Timeout(Duration::from_millis(1500)).to_string(),
            "timed out after 1500ms"
        );
    }
}
