// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline model for narrated inspection walkthroughs.
//!
//! This crate provides the data side of a walkthrough:
//! - Full state snapshots of the scene and document viewer
//! - Timestamped entries (initial, samples, discrete events)
//! - Recorded sessions and their JSON storage form
//! - Time-based interpolation for smooth replay
//! - Session-relative clocks
//!
//! ## Architecture
//!
//! Nothing here talks to a renderer or an audio device. The recorder crate
//! owns the collaborators and drives these types.

pub mod clock;
pub mod entry;
pub mod error;
pub mod interpolate;
pub mod session;
pub mod snapshot;

pub use clock::{HostClock, ManualClock, SessionClock, SystemClock};
pub use entry::{EntryKind, InspectAction, TimestampedEntry};
pub use error::SessionError;
pub use interpolate::{Interpolation, Interpolator, Resolved};
pub use session::{AudioHandle, RecordedSession, SerializedSession, SessionId};
pub use snapshot::{AnimationState, CameraPose, DocumentState, EffectAmounts, ModelRef, StateSnapshot};
