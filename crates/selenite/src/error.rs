//
// error.rs
//
// Error taxonomy shared by the session layer
//

use thiserror::Error;

use crate::state::ServerState;

/// Failures produced by the session layer.
///
/// Only [`SessionError::StateViolation`] is ever reported to the client as a
/// protocol error. Every other variant is logged and turned into an empty
/// result by the request handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A position or edit range is not reachable in the current buffer.
    #[error("{0}")]
    OutOfRange(String),

    /// The file lies outside the project scope.
    #[error("file is not tracked by the project: {0}")]
    NotTracked(String),

    /// No cursor context can be resolved at the requested offset.
    #[error("no resolvable context at cursor")]
    Invalid,

    /// The document is not open in the store.
    #[error("document is not open: {0}")]
    CacheMiss(String),

    /// The request arrived outside the allowed server state.
    #[error("request not allowed while the server is {0}")]
    StateViolation(ServerState),
}

impl SessionError {
    /// Whether this error should surface to the client as a protocol error.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, SessionError::StateViolation(_))
    }
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_state_violation_is_protocol_error() {
        assert!(SessionError::StateViolation(ServerState::Created).is_protocol_error());
        assert!(!SessionError::Invalid.is_protocol_error());
        assert!(!SessionError::CacheMiss("a.lua".into()).is_protocol_error());
        assert!(!SessionError::NotTracked("a.txt".into()).is_protocol_error());
        assert!(!SessionError::OutOfRange("x".into()).is_protocol_error());
    }

    #[test]
    fn test_state_violation_message_names_state() {
        let err = SessionError::StateViolation(ServerState::ShutDown);
        assert_eq!(
            err.to_string(),
            "request not allowed while the server is shut down"
        );
    }
}
