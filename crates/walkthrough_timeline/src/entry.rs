// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline entries and the actions a walkthrough can record.

use crate::snapshot::StateSnapshot;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Kind of timeline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    /// State at the moment recording started
    Initial,
    /// General state sample
    ContinuousState,
    /// Camera pose sample
    CameraState,
    /// Atomic user action
    DiscreteEvent,
}

impl EntryKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initial => "Initial",
            Self::ContinuousState => "State",
            Self::CameraState => "Camera",
            Self::DiscreteEvent => "Event",
        }
    }

    /// Whether entries of this kind take part in blending
    pub fn is_sample(&self) -> bool {
        !matches!(self, Self::DiscreteEvent)
    }
}

/// A user action on the scene or document viewer.
///
/// Most variants are discrete: they are logged as they happen and replayed
/// at their recorded instant. [`InspectAction::CameraMoved`] and
/// [`InspectAction::EffectsChanged`] describe continuous drags; they travel
/// through the same notification hook but the sampler owns their recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "eventType",
    content = "eventData",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum InspectAction {
    /// Focus a part by name
    FocusPart {
        /// Part name
        name: String,
    },
    /// Return from a focused part to the full view
    ClearFocus,
    /// Reset camera and effects
    ResetView,
    /// Load a model
    LoadModel {
        /// Model URL
        url: String,
        /// Display name
        name: String,
    },
    /// Replace part visibility
    SetVisibility {
        /// Visibility by part name
        visibility: IndexMap<String, bool>,
    },
    /// Select an animation clip
    SelectAnimation {
        /// Clip name
        name: String,
    },
    /// Play the selected clip
    PlayAnimation,
    /// Pause the selected clip
    PauseAnimation,
    /// Stop the selected clip
    StopAnimation,
    /// Change clip speed
    SetAnimationSpeed {
        /// Speed multiplier
        speed: f32,
    },
    /// Show another document asset
    SwitchAsset {
        /// Asset identifier
        asset_id: String,
    },
    /// Go to a document page
    SetPage {
        /// Page number (1-based)
        page: u32,
    },
    /// Change document zoom
    SetZoom {
        /// Zoom level
        zoom: f32,
    },
    /// Camera pose changed (continuous)
    CameraMoved,
    /// Effect amounts changed (continuous)
    EffectsChanged,
}

impl InspectAction {
    /// Stable event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::FocusPart { .. } => "focus_part",
            Self::ClearFocus => "clear_focus",
            Self::ResetView => "reset_view",
            Self::LoadModel { .. } => "load_model",
            Self::SetVisibility { .. } => "set_visibility",
            Self::SelectAnimation { .. } => "select_animation",
            Self::PlayAnimation => "play_animation",
            Self::PauseAnimation => "pause_animation",
            Self::StopAnimation => "stop_animation",
            Self::SetAnimationSpeed { .. } => "set_animation_speed",
            Self::SwitchAsset { .. } => "switch_asset",
            Self::SetPage { .. } => "set_page",
            Self::SetZoom { .. } => "set_zoom",
            Self::CameraMoved => "camera_moved",
            Self::EffectsChanged => "effects_changed",
        }
    }

    /// Whether this action is logged as a discrete event
    pub fn is_discrete(&self) -> bool {
        !matches!(self, Self::CameraMoved | Self::EffectsChanged)
    }
}

/// One entry of a recorded timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedEntry {
    /// Milliseconds since the recording origin
    pub timestamp: u64,
    /// Entry kind
    pub kind: EntryKind,
    /// Full state at `timestamp`
    pub snapshot: StateSnapshot,
    /// Action identity and payload, for discrete events only.
    /// Stored inline as `eventType` and `eventData`.
    #[serde(flatten)]
    pub event: Option<InspectAction>,
}

impl TimestampedEntry {
    /// The initial entry of a timeline
    pub fn initial(snapshot: StateSnapshot) -> Self {
        Self {
            timestamp: 0,
            kind: EntryKind::Initial,
            snapshot,
            event: None,
        }
    }

    /// A general state sample
    pub fn state(timestamp: u64, snapshot: StateSnapshot) -> Self {
        Self {
            timestamp,
            kind: EntryKind::ContinuousState,
            snapshot,
            event: None,
        }
    }

    /// A camera pose sample
    pub fn camera(timestamp: u64, snapshot: StateSnapshot) -> Self {
        Self {
            timestamp,
            kind: EntryKind::CameraState,
            snapshot,
            event: None,
        }
    }

    /// A discrete event
    pub fn discrete(timestamp: u64, action: InspectAction, snapshot: StateSnapshot) -> Self {
        Self {
            timestamp,
            kind: EntryKind::DiscreteEvent,
            snapshot,
            event: Some(action),
        }
    }

    /// Get the discrete action, if this entry is one
    pub fn action(&self) -> Option<&InspectAction> {
        match self.kind {
            EntryKind::DiscreteEvent => self.event.as_ref(),
            _ => None,
        }
    }
}
