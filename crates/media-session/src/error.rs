//! Failure taxonomy for the now-playing session
//!
//! None of these ever reach a caller of [`crate::NowPlayingSession`]: they are
//! logged and folded into a `false` return or a no-op.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The host does not expose a system media session service
    #[error("system media session service is not available on this host")]
    PlatformUnavailable,

    /// The service exists but the session or one of its sub-objects could not be obtained
    #[error("failed to acquire media session: {0}")]
    AcquisitionFailure(String),

    /// A field update or commit failed after the session was acquired
    #[error("failed to publish to media session: {0}")]
    PublishFailure(String),
}

impl SessionError {
    pub fn acquisition(err: impl std::fmt::Display) -> Self {
        SessionError::AcquisitionFailure(err.to_string())
    }

    pub fn publish(err: impl std::fmt::Display) -> Self {
        SessionError::PublishFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
