// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recorder error types.

use crate::controller::RecorderState;
use thiserror::Error;
use walkthrough_timeline::SessionError;

/// Errors reported by the audio collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// Microphone access was refused
    #[error("Audio permission denied: {0}")]
    PermissionDenied(String),

    /// No device or track is available
    #[error("Audio unavailable: {0}")]
    Unavailable(String),

    /// The playback position can no longer be trusted
    #[error("Audio playback desynchronized: {0}")]
    Desync(String),
}

/// Errors reported by the scene or document collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// Document asset lookup failed
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// No part with this name in the loaded model
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// Model could not be loaded
    #[error("Failed to load model {url}: {reason}")]
    ModelLoad {
        /// Model URL
        url: String,
        /// Failure reason
        reason: String,
    },

    /// No animation clip with this name
    #[error("Animation not found: {0}")]
    AnimationNotFound(String),
}

/// Errors surfaced to the shell
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Session content failed to decode or validate
    #[error("Malformed session: {0}")]
    MalformedSession(#[from] SessionError),

    /// Operation not allowed in the current state
    #[error("Recorder is busy ({0:?})")]
    Busy(RecorderState),

    /// Nothing has been recorded or loaded
    #[error("No recorded session")]
    NoSession,

    /// No session with this name in the store
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// Configuration could not be written
    #[error("Config serialization error: {0}")]
    ConfigWrite(#[from] ron::Error),

    /// Configuration values are out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for recorder operations
pub type Result<T> = std::result::Result<T, RecorderError>;
