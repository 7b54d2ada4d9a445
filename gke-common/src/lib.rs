//! Common types shared by the gkectl crates: the cluster spec record, the
//! GKE v1 wire schema and the error taxonomy.

pub mod request;
pub mod schema;
pub mod spec;

pub use spec::{ClusterRef, ClusterSpec};

use std::time::Duration;

/// Status value the control plane reports once a cluster or node pool has converged
pub const STATUS_RUNNING: &str = "RUNNING";

/// Failure reported by the control-plane API.
///
/// Carries the structured parts of the Google error envelope so callers can
/// classify outcomes without looking at the message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status, absent for transport failures
    pub status: Option<u16>,
    /// Canonical provider code, e.g. `ALREADY_EXISTS`
    pub code: Option<String>,
    /// First reason from the `errors` array, e.g. `alreadyExists`
    pub reason: Option<String>,
    pub message: String,
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            reason: None,
            message: message.into(),
        }
    }

    /// Build from an HTTP status and the raw response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<schema::ErrorEnvelope>(body) {
            Ok(envelope) => Self {
                status: Some(status),
                code: envelope.error.status,
                reason: envelope.error.errors.into_iter().find_map(|e| e.reason),
                message: envelope.error.message,
            },
            Err(_) => Self {
                status: Some(status),
                code: None,
                reason: None,
                message: body.trim().to_string(),
            },
        }
    }

    pub fn is_already_exists(&self) -> bool {
        self.status == Some(409) || self.code.as_deref() == Some("ALREADY_EXISTS")
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404) || self.code.as_deref() == Some("NOT_FOUND")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.status, &self.code) {
            (Some(status), Some(code)) => write!(f, "{} {}: {}", status, code, self.message),
            (Some(status), None) => write!(f, "{}: {}", status, self.message),
            (None, _) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// gkectl error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("API request failed: {0}")]
    Api(#[from] ApiError),

    #[error("Failed to read status of {resource}: {source}")]
    Poll {
        resource: String,
        #[source]
        source: ApiError,
    },

    #[error("Timed out after {}s waiting for {resource} to reach RUNNING", .elapsed.as_secs())]
    Timeout { resource: String, elapsed: Duration },

    #[error("Cancelled while waiting for {resource}")]
    Cancelled { resource: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_from_envelope() {
        let body = r#"{
            "error": {
                "code": 409,
                "message": "Already exists: projects/p/zones/z/clusters/c.",
                "status": "ALREADY_EXISTS",
                "errors": [{"message": "Already exists", "domain": "global", "reason": "alreadyExists"}]
            }
        }"#;

        let err = ApiError::from_response(409, body);
        assert!(err.is_already_exists());
        assert!(!err.is_not_found());
        assert_eq!(err.code.as_deref(), Some("ALREADY_EXISTS"));
        assert_eq!(err.reason.as_deref(), Some("alreadyExists"));
    }

    #[test]
    fn test_classification_ignores_message_text() {
        // A 400 whose message happens to mention notFound is still fatal
        let body = r#"{"error": {"code": 400, "message": "notFound alreadyExists", "status": "INVALID_ARGUMENT"}}"#;
        let err = ApiError::from_response(400, body);
        assert!(!err.is_not_found());
        assert!(!err.is_already_exists());
    }

    #[test]
    fn test_not_found_from_status_only() {
        let err = ApiError::from_response(404, "<html>Not Found</html>");
        assert!(err.is_not_found());
        assert_eq!(err.message, "<html>Not Found</html>");
    }

    #[test]
    fn test_transport_error_is_never_classified() {
        let err = ApiError::transport("connection refused");
        assert!(!err.is_not_found());
        assert!(!err.is_already_exists());
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout {
            resource: "cluster demo".to_string(),
            elapsed: Duration::from_secs(90),
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 90s waiting for cluster demo to reach RUNNING"
        );
    }
}
