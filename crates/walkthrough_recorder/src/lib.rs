// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recording and playback engine for narrated inspection walkthroughs.
//!
//! This crate provides:
//! - Collaborator traits for the scene, the document viewer and narration audio
//! - An instrumentation layer that reports user actions while recording
//! - Change-gated periodic sampling and discrete event logging
//! - A playback controller that replays sessions against audio or host time
//! - Session stores (in-memory and on-disk JSON)
//! - Headless collaborators for running without a renderer or audio device
//!
//! ## Driving the recorder
//!
//! The host owns the frame loop. It calls [`PlaybackController::tick`] at
//! roughly [`PlaybackController::tick_interval`] and routes shell operations
//! through [`PlaybackController::instruments_mut`].

pub mod collaborators;
pub mod config;
pub mod controller;
pub mod error;
pub mod event_log;
pub mod headless;
pub mod instrumentation;
pub mod replay;
pub mod sampler;
pub mod store;

pub use collaborators::{
    capture_snapshot, AudioCollaborator, CaptureStatus, DocumentCollaborator, SceneCollaborator,
};
pub use config::RecorderConfig;
pub use controller::{
    ControlAvailability, PlaybackController, PlaybackStats, RecorderState, TickOutcome, TimeSource,
};
pub use error::{AudioError, CollaboratorError, RecorderError, Result};
pub use event_log::EventLog;
pub use headless::{HeadlessDocument, HeadlessScene, NoAudio, ScriptedAudio};
pub use instrumentation::{InstrumentationAdapter, Notification, ReplayScope};
pub use sampler::StateSampler;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use walkthrough_timeline;
