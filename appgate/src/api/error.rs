use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use super::version::ApiRevision;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid provider configuration: {0}")]
    Configuration(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Conflict (HTTP 409): {0}")]
    Conflict(ErrorEnvelope),

    #[error("Validation failed (HTTP {status}): {envelope}")]
    Validation { status: u16, envelope: ErrorEnvelope },

    #[error(
        "{attribute} requires Appgate SDP {} (API {}) or newer, the collective runs API {active}",
        .required.peer_version(),
        .required
    )]
    VersionMismatch {
        attribute: String,
        required: ApiRevision,
        active: ApiRevision,
    },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Appgate SDP server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("API returned error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Outcomes where the peer may have applied the request before it failed
    pub fn may_have_reached_peer(&self) -> bool {
        matches!(
            self,
            ApiError::Transport(_)
                | ApiError::Timeout(_)
                | ApiError::Server { .. }
                | ApiError::Cancelled
        )
    }

    /// Builds the error matching a non-success status and its body
    pub fn from_status(status: u16, path: &str, body: &str) -> Self {
        let envelope = ErrorEnvelope::parse(body);

        match status {
            401 => ApiError::Authentication(envelope.message),
            404 => ApiError::NotFound(path.to_string()),
            409 => ApiError::Conflict(envelope),
            400 | 422 => ApiError::Validation { status, envelope },
            s if s >= 500 => ApiError::Server {
                status,
                message: envelope.to_string(),
            },
            _ => ApiError::Api {
                status,
                message: envelope.to_string(),
            },
        }
    }
}

/// Error body returned by the peer: `{id, message, errors: [{field, message}]}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl ErrorEnvelope {
    /// Falls back to the raw body as the message when it is not an envelope
    pub fn parse(body: &str) -> Self {
        serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .filter(|e| !e.id.is_empty() || !e.message.is_empty() || !e.errors.is_empty())
            .unwrap_or_else(|| ErrorEnvelope {
                message: body.trim().to_string(),
                ..Default::default()
            })
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.id.is_empty(), self.message.is_empty()) {
            (false, false) => write!(f, "{}: {}", self.id, self.message)?,
            (false, true) => write!(f, "{}", self.id)?,
            (true, _) => write!(f, "{}", self.message)?,
        }
        for error in &self.errors {
            write!(f, "\n  - {}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

/// Reported alongside 406 Not Acceptable on login
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedVersions {
    pub min_supported_version: u32,
    pub max_supported_version: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_pretty_prints_field_errors() {
        let body = r#"{
            "id": "unprocessable entity",
            "message": "Request validation failed",
            "errors": [{"field": "privileges", "message": "scope is not allowed with type View and target Ztp"}]
        }"#;

        let envelope = ErrorEnvelope::parse(body);
        assert_eq!(envelope.errors.len(), 1);
        assert_eq!(
            envelope.to_string(),
            "unprocessable entity: Request validation failed\n  - privileges: scope is not allowed with type View and target Ztp"
        );
    }

    #[test]
    fn non_json_body_becomes_message() {
        let envelope = ErrorEnvelope::parse("Bad Gateway\n");
        assert_eq!(envelope.message, "Bad Gateway");
        assert!(envelope.id.is_empty());
    }

    #[test]
    fn status_classification() {
        assert!(ApiError::from_status(404, "/sites/x", "").is_not_found());
        assert!(matches!(
            ApiError::from_status(409, "/sites", r#"{"id":"conflict","message":"name taken"}"#),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from_status(422, "/sites", "{}"),
            ApiError::Validation { status: 422, .. }
        ));
        assert!(matches!(
            ApiError::from_status(503, "/sites", "down"),
            ApiError::Server { status: 503, .. }
        ));
        assert!(matches!(
            ApiError::from_status(403, "/sites", "nope"),
            ApiError::Api { status: 403, .. }
        ));
    }

    #[test]
    fn only_unfinished_requests_may_have_reached_the_peer() {
        assert!(ApiError::Cancelled.may_have_reached_peer());
        assert!(ApiError::Timeout(20).may_have_reached_peer());
        assert!(ApiError::from_status(502, "/sites", "bad gateway").may_have_reached_peer());
        assert!(!ApiError::from_status(409, "/sites", "{}").may_have_reached_peer());
        assert!(!ApiError::from_status(422, "/sites", "{}").may_have_reached_peer());
    }

    #[test]
    fn version_mismatch_names_minimum_release() {
        let err = ApiError::VersionMismatch {
            attribute: "appgate_oidc_identity_provider".to_string(),
            required: ApiRevision::V18,
            active: ApiRevision::V16,
        };
        assert_eq!(
            err.to_string(),
            "appgate_oidc_identity_provider requires Appgate SDP 6.2.0 (API v18) or newer, the collective runs API v16"
        );
    }
}
