// SPDX-License-Identifier: MIT OR Apache-2.0
//! Full captures of the inspectable state at one instant.
//!
//! A [`StateSnapshot`] is a plain value: it is cloned out of the live
//! collaborators when captured and cloned again when applied, so nothing in a
//! recorded timeline ever aliases renderer-owned data.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Camera position and orbit target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Camera position (x, y, z)
    pub position: [f32; 3],
    /// Orbit target (x, y, z)
    pub target: [f32; 3],
}

impl CameraPose {
    /// Create a new camera pose
    pub fn new(position: [f32; 3], target: [f32; 3]) -> Self {
        Self { position, target }
    }

    /// Whether any axis of position or target moved by more than `tolerance`
    pub fn differs(&self, other: &CameraPose, tolerance: f32) -> bool {
        exceeds_vec3(self.position, other.position, tolerance)
            || exceeds_vec3(self.target, other.target, tolerance)
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 5.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

/// Explode, slice and x-ray amounts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectAmounts {
    /// Explode amount (0 = assembled)
    pub explode: f32,
    /// Slice amount (1 = uncut)
    pub slice: f32,
    /// X-ray amount (1 = opaque)
    pub xray: f32,
}

impl EffectAmounts {
    /// Create new effect amounts
    pub fn new(explode: f32, slice: f32, xray: f32) -> Self {
        Self { explode, slice, xray }
    }

    /// Whether any amount moved by more than `tolerance`
    pub fn differs(&self, other: &EffectAmounts, tolerance: f32) -> bool {
        exceeds(self.explode, other.explode, tolerance)
            || exceeds(self.slice, other.slice, tolerance)
            || exceeds(self.xray, other.xray, tolerance)
    }
}

impl Default for EffectAmounts {
    fn default() -> Self {
        Self {
            explode: 0.0,
            slice: 1.0,
            xray: 1.0,
        }
    }
}

/// Animation playback state of the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    /// Selected clip name
    pub selected: Option<String>,
    /// Whether the clip is playing
    pub playing: bool,
    /// Whether the clip is paused
    pub paused: bool,
    /// Playback speed multiplier
    pub speed: f32,
    /// Clip time in seconds
    pub time: f32,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            selected: None,
            playing: false,
            paused: false,
            speed: 1.0,
            time: 0.0,
        }
    }
}

/// State of the paired document viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    /// Currently shown asset
    pub asset_id: Option<String>,
    /// Current page (1-based)
    pub page: u32,
    /// Zoom level
    pub zoom: f32,
}

impl Default for DocumentState {
    fn default() -> Self {
        Self {
            asset_id: None,
            page: 1,
            zoom: 1.0,
        }
    }
}

/// Reference to the model loaded into the scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    /// Model URL
    pub url: String,
    /// Display name
    pub name: String,
}

/// Full capture of everything a walkthrough can replay
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Camera pose
    pub camera: CameraPose,
    /// Effect amounts
    pub effects: EffectAmounts,
    /// Name of the focused part
    pub focused_part: Option<String>,
    /// Pose to return to when leaving the focused part
    #[serde(default)]
    pub previous_camera: Option<CameraPose>,
    /// Part visibility by name
    #[serde(default)]
    pub visibility: IndexMap<String, bool>,
    /// Animation state
    pub animation: AnimationState,
    /// Document viewer state
    pub document: DocumentState,
    /// Loaded model
    #[serde(default)]
    pub model: Option<ModelRef>,
}

impl StateSnapshot {
    /// Whether the general (non-camera) state changed beyond `tolerance`.
    ///
    /// Animation clock time is ignored: it advances on its own while a clip
    /// plays and would otherwise make every sampling tick a change.
    pub fn state_differs(&self, other: &StateSnapshot, tolerance: f32) -> bool {
        self.effects.differs(&other.effects, tolerance)
            || self.focused_part != other.focused_part
            || self.visibility != other.visibility
            || self.model != other.model
            || self.animation.selected != other.animation.selected
            || self.animation.playing != other.animation.playing
            || self.animation.paused != other.animation.paused
            || exceeds(self.animation.speed, other.animation.speed, tolerance)
            || self.document.asset_id != other.document.asset_id
            || self.document.page != other.document.page
            || exceeds(self.document.zoom, other.document.zoom, tolerance)
    }

    /// Whether the camera pose changed beyond `tolerance`
    pub fn camera_differs(&self, other: &StateSnapshot, tolerance: f32) -> bool {
        self.camera.differs(&other.camera, tolerance)
    }
}

fn exceeds(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() > tolerance
}

fn exceeds_vec3(a: [f32; 3], b: [f32; 3], tolerance: f32) -> bool {
    a.iter().zip(b.iter()).any(|(x, y)| exceeds(*x, *y, tolerance))
}
