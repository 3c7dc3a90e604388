// SPDX-License-Identifier: MIT OR Apache-2.0
//! Capability surfaces consumed from the scene, document and audio owners.
//!
//! The recorder never renders, decodes or captures anything itself. Hosts
//! implement these traits over their renderer, page viewer and audio stack
//! and inject them into the [`PlaybackController`](crate::PlaybackController).

use crate::error::{AudioError, CollaboratorError};
use indexmap::IndexMap;
use walkthrough_timeline::{
    AnimationState, AudioHandle, CameraPose, DocumentState, EffectAmounts, ModelRef, StateSnapshot,
};

/// The 3D scene: camera, effects, part focus, visibility, animation, model
pub trait SceneCollaborator {
    /// Current camera pose
    fn camera_pose(&self) -> CameraPose;

    /// Move the camera
    fn set_camera_pose(&mut self, pose: CameraPose);

    /// Current explode/slice/x-ray amounts
    fn effect_amounts(&self) -> EffectAmounts;

    /// Change explode/slice/x-ray amounts
    fn set_effect_amounts(&mut self, effects: EffectAmounts);

    /// Name of the focused part
    fn focused_part(&self) -> Option<String>;

    /// Focus a part by name
    fn focus_part(&mut self, name: &str) -> Result<(), CollaboratorError>;

    /// Return to the full view, moving the camera back to the previous pose
    fn clear_focus(&mut self);

    /// Pose saved when the current part was focused
    fn previous_camera(&self) -> Option<CameraPose>;

    /// Replace the saved pose used by [`clear_focus`](Self::clear_focus)
    fn set_previous_camera(&mut self, pose: Option<CameraPose>);

    /// Reset camera and effects to the model defaults
    fn reset_view(&mut self);

    /// Part visibility by name
    fn visibility(&self) -> IndexMap<String, bool>;

    /// Replace part visibility
    fn set_visibility(&mut self, visibility: &IndexMap<String, bool>);

    /// Current animation state
    fn animation_state(&self) -> AnimationState;

    /// Select a clip by name
    fn select_animation(&mut self, name: &str) -> Result<(), CollaboratorError>;

    /// Play the selected clip
    fn play_animation(&mut self);

    /// Pause the selected clip
    fn pause_animation(&mut self);

    /// Stop the selected clip
    fn stop_animation(&mut self);

    /// Change clip speed
    fn set_animation_speed(&mut self, speed: f32);

    /// Seek the selected clip
    fn set_animation_time(&mut self, time: f32);

    /// Currently loaded model
    fn current_model(&self) -> Option<ModelRef>;

    /// Load a model
    fn load_model(&mut self, url: &str, name: &str) -> Result<(), CollaboratorError>;
}

/// The paired document viewer
pub trait DocumentCollaborator {
    /// Current page (1-based)
    fn page(&self) -> u32;

    /// Go to a page
    fn set_page(&mut self, page: u32);

    /// Current zoom level
    fn zoom(&self) -> f32;

    /// Change zoom level
    fn set_zoom(&mut self, zoom: f32);

    /// Identifier of the shown asset
    fn current_asset_id(&self) -> Option<String>;

    /// Show an asset by identifier
    fn load_asset(&mut self, id: &str) -> Result<(), CollaboratorError>;
}

/// Result of finishing a narration capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStatus {
    /// Capture finished; `None` if nothing usable was captured
    Ready(Option<AudioHandle>),
    /// Encoding is still running; poll again later
    Pending,
}

/// Narration capture and playback
pub trait AudioCollaborator {
    /// Start capturing narration
    fn begin_capture(&mut self) -> Result<(), AudioError>;

    /// Stop capturing and start finalizing the track
    fn finish_capture(&mut self) -> CaptureStatus;

    /// Check on a capture that returned [`CaptureStatus::Pending`]
    fn poll_capture(&mut self) -> CaptureStatus;

    /// Prepare a track for playback from its start
    fn load(&mut self, track: &AudioHandle) -> Result<(), AudioError>;

    /// Start or continue playback
    fn play(&mut self) -> Result<(), AudioError>;

    /// Pause playback, keeping the position
    fn pause(&mut self);

    /// Stop playback and rewind
    fn stop(&mut self);

    /// Playback position in milliseconds
    fn position_millis(&self) -> Result<u64, AudioError>;

    /// Whether the loaded track has played to its end
    fn has_ended(&self) -> bool {
        false
    }
}

/// Capture a full snapshot from the live collaborators
pub fn capture_snapshot(
    scene: &dyn SceneCollaborator,
    document: &dyn DocumentCollaborator,
) -> StateSnapshot {
    StateSnapshot {
        camera: scene.camera_pose(),
        effects: scene.effect_amounts(),
        focused_part: scene.focused_part(),
        previous_camera: scene.previous_camera(),
        visibility: scene.visibility(),
        animation: scene.animation_state(),
        document: DocumentState {
            asset_id: document.current_asset_id(),
            page: document.page(),
            zoom: document.zoom(),
        },
        model: scene.current_model(),
    }
}
