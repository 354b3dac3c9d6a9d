//! Error types for external service and extractor boundaries.

use thiserror::Error;

/// Errors from the language-model text service.
///
/// These are fatal to a turn when raised by a task executor or the
/// planner's transport layer; decode problems inside the planner are
/// handled by its fallback and never reach this type.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request could not be sent or the connection failed.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with an error status.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The service answered successfully but with no usable content.
    #[error("empty response from service")]
    EmptyResponse,

    /// A structured request came back without a decodable JSON object.
    /// The planner degrades on this variant instead of failing the turn.
    #[error("malformed structured response: {0}")]
    Malformed(String),

    /// The client is misconfigured (missing key, bad URL, ...).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ServiceError {
    /// Whether a retry with backoff is worth attempting.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Network(_) | ServiceError::Timeout => true,
            ServiceError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Errors from content extractors.
///
/// Always recoverable at the dispatcher: the turn degrades to the raw
/// user text and continues.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file bytes could not be decoded as the expected format.
    #[error("unreadable {kind} data: {message}")]
    Unreadable { kind: &'static str, message: String },

    /// An upstream service call made by the extractor failed.
    #[error("extractor service call failed: {0}")]
    Service(#[from] ServiceError),

    /// The extraction backend is not available on this host.
    #[error("extraction backend unavailable: {0}")]
    Unavailable(String),
}

impl ExtractError {
    pub fn unreadable(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Unreadable {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(ServiceError::Timeout.is_retryable());
        assert!(ServiceError::Network("reset".into()).is_retryable());
        assert!(ServiceError::Api {
            status: 429,
            message: "rate limited".into()
        }
        .is_retryable());
        assert!(ServiceError::Api {
            status: 503,
            message: "overloaded".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_not_retryable() {
        assert!(!ServiceError::EmptyResponse.is_retryable());
        assert!(!ServiceError::Malformed("not json".into()).is_retryable());
        assert!(!ServiceError::Configuration("no key".into()).is_retryable());
        assert!(!ServiceError::Api {
            status: 401,
            message: "bad key".into()
        }
        .is_retryable());
        assert!(!ServiceError::Api {
            status: 400,
            message: "bad request".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_extract_error_from_service() {
        let e: ExtractError = ServiceError::Timeout.into();
        assert!(matches!(e, ExtractError::Service(ServiceError::Timeout)));
    }
}
