// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline errors.

use thiserror::Error;

/// Errors raised while decoding or validating a recorded session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session content is structurally invalid
    #[error("Malformed session: {0}")]
    Malformed(String),

    /// JSON decoding or encoding failed
    #[error("Session JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
