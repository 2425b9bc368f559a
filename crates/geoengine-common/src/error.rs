//! Error types for Geo Engine client operations.

use thiserror::Error;

use crate::kind::ResultKind;

/// Result type alias using GeoEngineError.
pub type GeoEngineResult<T> = Result<T, GeoEngineError>;

/// Server error kind used for OGC `ServiceExceptionReport` bodies.
pub const OGC_SERVICE_EXCEPTION: &str = "OgcServiceException";

/// Primary error type for client operations.
///
/// Nothing in the client retries or swallows these. The classification helpers
/// tell a caller whether to fix the request, try again later, or log in again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoEngineError {
    // === Transport ===
    #[error("Connection error: {0}")]
    Connection(String),

    // === Session ===
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("You have to call `initialize` before using other functionality")]
    NotInitialized,

    // === Server ===
    #[error("{kind}: {message}")]
    Server {
        kind: String,
        message: String,
        status: Option<u16>,
    },

    // === Caller ===
    #[error("Expected a {expected} result but the workflow declares {actual}")]
    SchemaMismatch {
        expected: ResultKind,
        actual: ResultKind,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // === Local ===
    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl GeoEngineError {
    /// Build a server error from an `{error, message}` body.
    pub fn server(kind: impl Into<String>, message: impl Into<String>, status: Option<u16>) -> Self {
        GeoEngineError::Server {
            kind: kind.into(),
            message: message.into(),
            status,
        }
    }

    /// Short machine-readable name of the error class.
    pub fn error_kind(&self) -> &str {
        match self {
            GeoEngineError::Connection(_) => "Connection",
            GeoEngineError::Authentication(_) => "Authentication",
            GeoEngineError::SessionExpired(_) => "SessionExpired",
            GeoEngineError::NotInitialized => "NotInitialized",
            GeoEngineError::Server { kind, .. } => kind.as_str(),
            GeoEngineError::SchemaMismatch { .. } => "SchemaMismatch",
            GeoEngineError::InvalidInput(_) => "InvalidInput",
            GeoEngineError::Decode(_) => "Decode",
            GeoEngineError::Io(_) => "Io",
        }
    }

    /// "Try again later": transport failures and server-side (5xx) failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            GeoEngineError::Connection(_) | GeoEngineError::Io(_) => true,
            GeoEngineError::Server { status, .. } => matches!(status, Some(s) if *s >= 500),
            _ => false,
        }
    }

    /// "Re-authenticate": a new session is needed before anything else will work.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(
            self,
            GeoEngineError::Authentication(_)
                | GeoEngineError::SessionExpired(_)
                | GeoEngineError::NotInitialized
        )
    }

    /// "Fix your request": retrying the same call will fail the same way.
    pub fn is_caller_error(&self) -> bool {
        match self {
            GeoEngineError::SchemaMismatch { .. }
            | GeoEngineError::InvalidInput(_)
            | GeoEngineError::Decode(_) => true,
            GeoEngineError::Server { status, .. } => match status {
                Some(s) => (400..500).contains(s),
                // OGC exception reports and bodies without a status describe a bad query
                None => true,
            },
            _ => false,
        }
    }

    /// The server-assigned error kind, if this came from the server.
    pub fn server_kind(&self) -> Option<&str> {
        match self {
            GeoEngineError::Server { kind, .. } => Some(kind.as_str()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GeoEngineError {
    fn from(err: std::io::Error) -> Self {
        GeoEngineError::Io(err.to_string())
    }
}

impl From<crate::bbox::BboxParseError> for GeoEngineError {
    fn from(err: crate::bbox::BboxParseError) -> Self {
        GeoEngineError::InvalidInput(err.to_string())
    }
}

impl From<crate::time::TimeParseError> for GeoEngineError {
    fn from(err: crate::time::TimeParseError) -> Self {
        GeoEngineError::InvalidInput(err.to_string())
    }
}

impl From<serde_json::Error> for GeoEngineError {
    fn from(err: serde_json::Error) -> Self {
        GeoEngineError::Decode(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_display() {
        let err = GeoEngineError::server("NotFound", "Not Found", Some(404));
        assert_eq!(err.to_string(), "NotFound: Not Found");
        assert_eq!(err.error_kind(), "NotFound");
        assert!(err.is_caller_error());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classification_is_disjoint() {
        let errors = vec![
            GeoEngineError::Connection("refused".into()),
            GeoEngineError::Authentication("bad password".into()),
            GeoEngineError::SessionExpired("stale".into()),
            GeoEngineError::NotInitialized,
            GeoEngineError::server("Internal", "boom", Some(500)),
            GeoEngineError::server("Operator", "bad graph", Some(400)),
            GeoEngineError::SchemaMismatch {
                expected: ResultKind::Vector,
                actual: ResultKind::Raster,
            },
            GeoEngineError::InvalidInput("xmin > xmax".into()),
        ];

        for err in errors {
            let classes = [
                err.is_retryable(),
                err.requires_reauthentication(),
                err.is_caller_error(),
            ];
            assert_eq!(
                classes.iter().filter(|c| **c).count(),
                1,
                "{:?} should be in exactly one class",
                err
            );
        }
    }

    #[test]
    fn test_schema_mismatch_message() {
        let err = GeoEngineError::SchemaMismatch {
            expected: ResultKind::Vector,
            actual: ResultKind::Raster,
        };
        assert_eq!(
            err.to_string(),
            "Expected a Vector result but the workflow declares Raster"
        );
    }

    #[test]
    fn test_parse_errors_are_invalid_input() {
        fn bbox(s: &str) -> GeoEngineResult<crate::BoundingBox2D> {
            Ok(crate::BoundingBox2D::from_bbox_str(s)?)
        }
        fn time(s: &str) -> GeoEngineResult<crate::TimeInterval> {
            Ok(crate::TimeInterval::from_time_str(s)?)
        }

        let err = bbox("10,0,-10,5").unwrap_err();
        assert!(matches!(err, GeoEngineError::InvalidInput(_)), "{:?}", err);
        assert!(err.is_caller_error());

        let err = time("yesterday").unwrap_err();
        assert!(matches!(err, GeoEngineError::InvalidInput(_)), "{:?}", err);
    }
}
