//! Error types for the anchorstream domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all anchorstream operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Transport errors ---
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // --- Coordinator errors ---
    #[error("Coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures raised by a messaging transport.
///
/// These never escape the coordinator except through
/// [`CoordinatorError::PlaceholderCreation`]: edit failures are logged and
/// published to the event bus, then swallowed.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Placeholder rejected by platform: {0}")]
    PlaceholderRejected(String),

    #[error("Edit failed for anchor {anchor}: {reason}")]
    EditFailed { anchor: String, reason: String },

    #[error("Rate limited by platform, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors surfaced by the streaming coordinator to its driving loop.
///
/// `PlaceholderCreation` means the anchor will never exist for this session;
/// the session keeps accumulating text without transport effect. The other
/// variants are caller-contract violations (callbacks invoked out of order).
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Placeholder creation failed: {0}")]
    PlaceholderCreation(TransportError),

    #[error("Placeholder already created for this session")]
    AlreadyAnchored,

    #[error("Session already reached a terminal outcome")]
    SessionFinished,

    #[error("Session is closed")]
    SessionClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_displays_correctly() {
        let err = Error::Transport(TransportError::RateLimited {
            retry_after_secs: 30,
        });
        assert!(err.to_string().contains("30"));
        assert!(err.to_string().contains("Rate limited"));
    }

    #[test]
    fn coordinator_error_wraps_transport_cause() {
        let err = CoordinatorError::PlaceholderCreation(TransportError::Unauthorized(
            "bot lacks send permission".into(),
        ));
        assert!(err.to_string().contains("Placeholder creation failed"));
        assert!(err.to_string().contains("send permission"));
    }

    #[test]
    fn edit_failed_names_the_anchor() {
        let err = TransportError::EditFailed {
            anchor: "msg-42".into(),
            reason: "message deleted".into(),
        };
        assert!(err.to_string().contains("msg-42"));
        assert!(err.to_string().contains("message deleted"));
    }
}
