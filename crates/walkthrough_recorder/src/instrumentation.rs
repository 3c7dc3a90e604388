// SPDX-License-Identifier: MIT OR Apache-2.0
//! Instrumented access to the scene and document collaborators.
//!
//! Every state-changing operation the shell performs goes through the
//! [`InstrumentationAdapter`]. After the collaborator call succeeds, the
//! adapter raises a notification for the recorder. Notifications are only
//! kept while a recording is armed and replay suppression is off, so
//! actions applied during playback never feed back into the timeline.

use crate::collaborators::{capture_snapshot, DocumentCollaborator, SceneCollaborator};
use crate::error::CollaboratorError;
use indexmap::IndexMap;
use std::ops::{Deref, DerefMut};
use walkthrough_timeline::{CameraPose, EffectAmounts, InspectAction, SessionClock, StateSnapshot};

/// A stamped action waiting to be logged
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Milliseconds since the recording origin
    pub timestamp: u64,
    /// The action that happened
    pub action: InspectAction,
    /// Full state right after the action
    pub snapshot: StateSnapshot,
}

/// Wraps the collaborators and reports user actions to the recorder
pub struct InstrumentationAdapter {
    scene: Box<dyn SceneCollaborator>,
    document: Box<dyn DocumentCollaborator>,
    clock: SessionClock,
    armed: bool,
    replay_suppressed: bool,
    pending: Vec<Notification>,
}

impl InstrumentationAdapter {
    /// Wrap a scene and a document collaborator
    pub fn new(
        scene: Box<dyn SceneCollaborator>,
        document: Box<dyn DocumentCollaborator>,
        clock: SessionClock,
    ) -> Self {
        Self {
            scene,
            document,
            clock,
            armed: false,
            replay_suppressed: false,
            pending: Vec::new(),
        }
    }

    /// Read access to the scene
    pub fn scene(&self) -> &dyn SceneCollaborator {
        self.scene.as_ref()
    }

    /// Read access to the document viewer
    pub fn document(&self) -> &dyn DocumentCollaborator {
        self.document.as_ref()
    }

    /// Capture the current full state
    pub fn capture(&self) -> StateSnapshot {
        capture_snapshot(self.scene.as_ref(), self.document.as_ref())
    }

    /// Start keeping notifications
    pub fn arm(&mut self) {
        self.armed = true;
        self.pending.clear();
    }

    /// Stop keeping notifications
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Whether notifications are being kept
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether replay suppression is engaged
    pub fn is_replay_suppressed(&self) -> bool {
        self.replay_suppressed
    }

    /// Engage replay suppression until the returned scope is dropped
    pub fn replay(&mut self) -> ReplayScope<'_> {
        let previous = self.replay_suppressed;
        self.replay_suppressed = true;
        ReplayScope {
            adapter: self,
            previous,
        }
    }

    /// Report an action that has already been applied to a collaborator
    pub fn notify(&mut self, action: InspectAction) {
        if !self.armed || self.replay_suppressed {
            return;
        }
        if !action.is_discrete() {
            // Continuous changes are picked up by the sampler
            tracing::trace!("Ignoring continuous notification: {}", action.event_type());
            return;
        }
        let notification = Notification {
            timestamp: self.clock.elapsed(),
            snapshot: self.capture(),
            action,
        };
        tracing::debug!(
            "Captured {} at {} ms",
            notification.action.event_type(),
            notification.timestamp
        );
        self.pending.push(notification);
    }

    /// Take all queued notifications in the order they were raised
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    /// Number of queued notifications
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // Instrumented operations

    /// Move the camera
    pub fn set_camera_pose(&mut self, pose: CameraPose) {
        self.scene.set_camera_pose(pose);
        self.notify(InspectAction::CameraMoved);
    }

    /// Change explode/slice/x-ray amounts
    pub fn set_effect_amounts(&mut self, effects: EffectAmounts) {
        self.scene.set_effect_amounts(effects);
        self.notify(InspectAction::EffectsChanged);
    }

    /// Focus a part
    pub fn focus_part(&mut self, name: &str) -> Result<(), CollaboratorError> {
        self.scene.focus_part(name)?;
        self.notify(InspectAction::FocusPart {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Return to the full view
    pub fn clear_focus(&mut self) {
        self.scene.clear_focus();
        self.notify(InspectAction::ClearFocus);
    }

    /// Reset camera and effects
    pub fn reset_view(&mut self) {
        self.scene.reset_view();
        self.notify(InspectAction::ResetView);
    }

    /// Load a model
    pub fn load_model(&mut self, url: &str, name: &str) -> Result<(), CollaboratorError> {
        self.scene.load_model(url, name)?;
        self.notify(InspectAction::LoadModel {
            url: url.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    /// Replace part visibility
    pub fn set_visibility(&mut self, visibility: IndexMap<String, bool>) {
        self.scene.set_visibility(&visibility);
        self.notify(InspectAction::SetVisibility { visibility });
    }

    /// Select an animation clip
    pub fn select_animation(&mut self, name: &str) -> Result<(), CollaboratorError> {
        self.scene.select_animation(name)?;
        self.notify(InspectAction::SelectAnimation {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Play the selected clip
    pub fn play_animation(&mut self) {
        self.scene.play_animation();
        self.notify(InspectAction::PlayAnimation);
    }

    /// Pause the selected clip
    pub fn pause_animation(&mut self) {
        self.scene.pause_animation();
        self.notify(InspectAction::PauseAnimation);
    }

    /// Stop the selected clip
    pub fn stop_animation(&mut self) {
        self.scene.stop_animation();
        self.notify(InspectAction::StopAnimation);
    }

    /// Change clip speed
    pub fn set_animation_speed(&mut self, speed: f32) {
        self.scene.set_animation_speed(speed);
        self.notify(InspectAction::SetAnimationSpeed { speed });
    }

    /// Show another document asset
    pub fn switch_asset(&mut self, asset_id: &str) -> Result<(), CollaboratorError> {
        self.document.load_asset(asset_id)?;
        self.notify(InspectAction::SwitchAsset {
            asset_id: asset_id.to_string(),
        });
        Ok(())
    }

    /// Go to a document page
    pub fn set_page(&mut self, page: u32) {
        self.document.set_page(page);
        self.notify(InspectAction::SetPage { page });
    }

    /// Change document zoom
    pub fn set_zoom(&mut self, zoom: f32) {
        self.document.set_zoom(zoom);
        self.notify(InspectAction::SetZoom { zoom });
    }

    /// Replace the saved back-navigation pose. Not reported.
    pub fn set_previous_camera(&mut self, pose: Option<CameraPose>) {
        self.scene.set_previous_camera(pose);
    }

    /// Seek the selected clip. Not reported; animation time is not recorded.
    pub fn set_animation_time(&mut self, time: f32) {
        self.scene.set_animation_time(time);
    }
}

impl std::fmt::Debug for InstrumentationAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentationAdapter")
            .field("armed", &self.armed)
            .field("replay_suppressed", &self.replay_suppressed)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

/// Replay suppression held for the lifetime of the scope
pub struct ReplayScope<'a> {
    adapter: &'a mut InstrumentationAdapter,
    previous: bool,
}

impl Deref for ReplayScope<'_> {
    type Target = InstrumentationAdapter;

    fn deref(&self) -> &Self::Target {
        self.adapter
    }
}

impl DerefMut for ReplayScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.adapter
    }
}

impl Drop for ReplayScope<'_> {
    fn drop(&mut self) {
        self.adapter.replay_suppressed = self.previous;
    }
}
