// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless collaborators.
//!
//! In-memory stand-ins for the renderer, document viewer and audio stack.
//! They keep plain state, journal every mutating call, and let hosts run the
//! recorder without a window or an audio device (batch conversion, previews,
//! tests). Clones share state, so a caller can keep a handle after boxing one
//! into the controller.

use crate::collaborators::{AudioCollaborator, CaptureStatus, DocumentCollaborator, SceneCollaborator};
use crate::error::{AudioError, CollaboratorError};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use walkthrough_timeline::{
    AnimationState, AudioHandle, CameraPose, EffectAmounts, HostClock, ModelRef,
};

#[derive(Debug, Default)]
struct SceneData {
    camera: CameraPose,
    effects: EffectAmounts,
    focused: Option<String>,
    previous_camera: Option<CameraPose>,
    visibility: IndexMap<String, bool>,
    animation: AnimationState,
    clips: Vec<String>,
    model: Option<ModelRef>,
    journal: Vec<String>,
}

/// In-memory 3D scene
#[derive(Debug, Clone, Default)]
pub struct HeadlessScene {
    inner: Arc<Mutex<SceneData>>,
}

impl HeadlessScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add visible parts
    pub fn with_parts<I, S>(self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut data = self.inner.lock();
            for part in parts {
                data.visibility.insert(part.into(), true);
            }
        }
        self
    }

    /// Add animation clips
    pub fn with_clips<I, S>(self, clips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.lock().clips.extend(clips.into_iter().map(Into::into));
        self
    }

    /// Mutating calls received so far, oldest first
    pub fn journal(&self) -> Vec<String> {
        self.inner.lock().journal.clone()
    }

    /// Forget the journal
    pub fn clear_journal(&self) {
        self.inner.lock().journal.clear();
    }
}

impl SceneCollaborator for HeadlessScene {
    fn camera_pose(&self) -> CameraPose {
        self.inner.lock().camera
    }

    fn set_camera_pose(&mut self, pose: CameraPose) {
        self.inner.lock().camera = pose;
    }

    fn effect_amounts(&self) -> EffectAmounts {
        self.inner.lock().effects
    }

    fn set_effect_amounts(&mut self, effects: EffectAmounts) {
        self.inner.lock().effects = effects;
    }

    fn focused_part(&self) -> Option<String> {
        self.inner.lock().focused.clone()
    }

    fn focus_part(&mut self, name: &str) -> Result<(), CollaboratorError> {
        let mut data = self.inner.lock();
        if !data.visibility.contains_key(name) {
            return Err(CollaboratorError::PartNotFound(name.to_string()));
        }
        data.previous_camera = Some(data.camera);
        data.focused = Some(name.to_string());
        data.journal.push(format!("focus_part:{name}"));
        Ok(())
    }

    fn clear_focus(&mut self) {
        let mut data = self.inner.lock();
        data.focused = None;
        if let Some(pose) = data.previous_camera.take() {
            data.camera = pose;
        }
        data.journal.push("clear_focus".to_string());
    }

    fn previous_camera(&self) -> Option<CameraPose> {
        self.inner.lock().previous_camera
    }

    fn set_previous_camera(&mut self, pose: Option<CameraPose>) {
        self.inner.lock().previous_camera = pose;
    }

    fn reset_view(&mut self) {
        let mut data = self.inner.lock();
        data.camera = CameraPose::default();
        data.effects = EffectAmounts::default();
        data.focused = None;
        data.previous_camera = None;
        data.journal.push("reset_view".to_string());
    }

    fn visibility(&self) -> IndexMap<String, bool> {
        self.inner.lock().visibility.clone()
    }

    fn set_visibility(&mut self, visibility: &IndexMap<String, bool>) {
        let mut data = self.inner.lock();
        data.visibility = visibility.clone();
        data.journal.push("set_visibility".to_string());
    }

    fn animation_state(&self) -> AnimationState {
        self.inner.lock().animation.clone()
    }

    fn select_animation(&mut self, name: &str) -> Result<(), CollaboratorError> {
        let mut data = self.inner.lock();
        if !data.clips.iter().any(|c| c == name) {
            return Err(CollaboratorError::AnimationNotFound(name.to_string()));
        }
        data.animation.selected = Some(name.to_string());
        data.animation.time = 0.0;
        data.journal.push(format!("select_animation:{name}"));
        Ok(())
    }

    fn play_animation(&mut self) {
        let mut data = self.inner.lock();
        data.animation.playing = true;
        data.animation.paused = false;
        data.journal.push("play_animation".to_string());
    }

    fn pause_animation(&mut self) {
        let mut data = self.inner.lock();
        data.animation.playing = false;
        data.animation.paused = true;
        data.journal.push("pause_animation".to_string());
    }

    fn stop_animation(&mut self) {
        let mut data = self.inner.lock();
        data.animation.playing = false;
        data.animation.paused = false;
        data.animation.time = 0.0;
        data.journal.push("stop_animation".to_string());
    }

    fn set_animation_speed(&mut self, speed: f32) {
        let mut data = self.inner.lock();
        data.animation.speed = speed;
        data.journal.push(format!("set_animation_speed:{speed}"));
    }

    fn set_animation_time(&mut self, time: f32) {
        self.inner.lock().animation.time = time;
    }

    fn current_model(&self) -> Option<ModelRef> {
        self.inner.lock().model.clone()
    }

    fn load_model(&mut self, url: &str, name: &str) -> Result<(), CollaboratorError> {
        if url.is_empty() {
            return Err(CollaboratorError::ModelLoad {
                url: url.to_string(),
                reason: "empty url".to_string(),
            });
        }
        let mut data = self.inner.lock();
        data.model = Some(ModelRef {
            url: url.to_string(),
            name: name.to_string(),
        });
        data.focused = None;
        data.journal.push(format!("load_model:{name}"));
        Ok(())
    }
}

#[derive(Debug)]
struct DocumentData {
    assets: Vec<String>,
    current: Option<String>,
    page: u32,
    zoom: f32,
    journal: Vec<String>,
}

impl Default for DocumentData {
    fn default() -> Self {
        Self {
            assets: Vec::new(),
            current: None,
            page: 1,
            zoom: 1.0,
            journal: Vec::new(),
        }
    }
}

/// In-memory document viewer
#[derive(Debug, Clone, Default)]
pub struct HeadlessDocument {
    inner: Arc<Mutex<DocumentData>>,
}

impl HeadlessDocument {
    /// Create a viewer with no assets
    pub fn new() -> Self {
        Self::default()
    }

    /// Register loadable assets
    pub fn with_assets<I, S>(self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.lock().assets.extend(assets.into_iter().map(Into::into));
        self
    }

    /// Unregister an asset, as if it were deleted from storage
    pub fn forget_asset(&self, id: &str) {
        self.inner.lock().assets.retain(|a| a != id);
    }

    /// Mutating calls received so far, oldest first
    pub fn journal(&self) -> Vec<String> {
        self.inner.lock().journal.clone()
    }
}

impl DocumentCollaborator for HeadlessDocument {
    fn page(&self) -> u32 {
        self.inner.lock().page
    }

    fn set_page(&mut self, page: u32) {
        let mut data = self.inner.lock();
        data.page = page.max(1);
        data.journal.push(format!("set_page:{page}"));
    }

    fn zoom(&self) -> f32 {
        self.inner.lock().zoom
    }

    fn set_zoom(&mut self, zoom: f32) {
        let mut data = self.inner.lock();
        data.zoom = zoom;
        data.journal.push(format!("set_zoom:{zoom}"));
    }

    fn current_asset_id(&self) -> Option<String> {
        self.inner.lock().current.clone()
    }

    fn load_asset(&mut self, id: &str) -> Result<(), CollaboratorError> {
        let mut data = self.inner.lock();
        if !data.assets.iter().any(|a| a == id) {
            return Err(CollaboratorError::AssetNotFound(id.to_string()));
        }
        data.current = Some(id.to_string());
        data.page = 1;
        data.journal.push(format!("load_asset:{id}"));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct AudioData {
    deny_capture: bool,
    capturing: bool,
    finish_pending: u32,
    takes: u32,
    loaded: Option<AudioHandle>,
    playing_since: Option<u64>,
    position: u64,
    length: Option<u64>,
    failing: bool,
}

/// Clock-driven audio stand-in.
///
/// Playback position advances with the host clock while playing and holds
/// still while paused, like a real media element.
#[derive(Clone)]
pub struct ScriptedAudio {
    clock: Arc<dyn HostClock>,
    inner: Arc<Mutex<AudioData>>,
}

impl ScriptedAudio {
    /// Create an audio stand-in over a host clock
    pub fn new(clock: Arc<dyn HostClock>) -> Self {
        Self {
            clock,
            inner: Arc::new(Mutex::new(AudioData::default())),
        }
    }

    /// Refuse microphone access on the next capture
    pub fn deny_permission(&self) {
        self.inner.lock().deny_capture = true;
    }

    /// Keep the next finalization pending for `polls` polls
    pub fn delay_finish(&self, polls: u32) {
        self.inner.lock().finish_pending = polls;
    }

    /// Make position queries fail from now on
    pub fn fail_position(&self) {
        self.inner.lock().failing = true;
    }

    /// End the track at this length
    pub fn set_length(&self, millis: u64) {
        self.inner.lock().length = Some(millis);
    }

    /// Whether a track is playing
    pub fn is_playing(&self) -> bool {
        self.inner.lock().playing_since.is_some()
    }

    /// Currently loaded track
    pub fn loaded(&self) -> Option<AudioHandle> {
        self.inner.lock().loaded.clone()
    }

    fn current_position(&self, data: &AudioData) -> u64 {
        let running = data
            .playing_since
            .map(|since| self.clock.now_millis().saturating_sub(since))
            .unwrap_or(0);
        let position = data.position + running;
        data.length.map_or(position, |length| position.min(length))
    }
}

impl AudioCollaborator for ScriptedAudio {
    fn begin_capture(&mut self) -> Result<(), AudioError> {
        let mut data = self.inner.lock();
        if data.deny_capture {
            return Err(AudioError::PermissionDenied("microphone access refused".to_string()));
        }
        data.capturing = true;
        Ok(())
    }

    fn finish_capture(&mut self) -> CaptureStatus {
        self.poll_capture()
    }

    fn poll_capture(&mut self) -> CaptureStatus {
        let mut data = self.inner.lock();
        if !data.capturing {
            return CaptureStatus::Ready(None);
        }
        if data.finish_pending > 0 {
            data.finish_pending -= 1;
            return CaptureStatus::Pending;
        }
        data.capturing = false;
        data.takes += 1;
        CaptureStatus::Ready(Some(AudioHandle::new(format!("take-{}", data.takes))))
    }

    fn load(&mut self, track: &AudioHandle) -> Result<(), AudioError> {
        let mut data = self.inner.lock();
        data.loaded = Some(track.clone());
        data.playing_since = None;
        data.position = 0;
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        let now = self.clock.now_millis();
        let mut data = self.inner.lock();
        if data.loaded.is_none() {
            return Err(AudioError::Unavailable("no track loaded".to_string()));
        }
        if data.playing_since.is_none() {
            data.playing_since = Some(now);
        }
        Ok(())
    }

    fn pause(&mut self) {
        let mut data = self.inner.lock();
        let position = self.current_position(&data);
        data.position = position;
        data.playing_since = None;
    }

    fn stop(&mut self) {
        let mut data = self.inner.lock();
        data.position = 0;
        data.playing_since = None;
    }

    fn position_millis(&self) -> Result<u64, AudioError> {
        let data = self.inner.lock();
        if data.failing {
            return Err(AudioError::Desync("position query failed".to_string()));
        }
        Ok(self.current_position(&data))
    }

    fn has_ended(&self) -> bool {
        let data = self.inner.lock();
        data.length
            .is_some_and(|length| self.current_position(&data) >= length)
    }
}

/// Audio collaborator for hosts without any audio stack.
///
/// Every capture and playback request reports the device as unavailable, so
/// sessions are recorded visual-only and replayed on the host clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAudio;

impl AudioCollaborator for NoAudio {
    fn begin_capture(&mut self) -> Result<(), AudioError> {
        Err(AudioError::Unavailable("no audio stack".to_string()))
    }

    fn finish_capture(&mut self) -> CaptureStatus {
        CaptureStatus::Ready(None)
    }

    fn poll_capture(&mut self) -> CaptureStatus {
        CaptureStatus::Ready(None)
    }

    fn load(&mut self, _track: &AudioHandle) -> Result<(), AudioError> {
        Err(AudioError::Unavailable("no audio stack".to_string()))
    }

    fn play(&mut self) -> Result<(), AudioError> {
        Err(AudioError::Unavailable("no audio stack".to_string()))
    }

    fn pause(&mut self) {}

    fn stop(&mut self) {}

    fn position_millis(&self) -> Result<u64, AudioError> {
        Err(AudioError::Unavailable("no audio stack".to_string()))
    }
}
