// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recording and playback state machine.
//!
//! The [`PlaybackController`] owns the collaborators, the current session
//! and both clocks. The host drives it by calling [`PlaybackController::tick`]
//! once per frame. Control operations return `true` when they changed the
//! state and are no-ops otherwise.

use crate::collaborators::{
    AudioCollaborator, CaptureStatus, DocumentCollaborator, SceneCollaborator,
};
use crate::config::RecorderConfig;
use crate::error::{AudioError, RecorderError, Result};
use crate::event_log::EventLog;
use crate::instrumentation::InstrumentationAdapter;
use crate::replay::{apply_action, apply_continuous, apply_discrete_fields, restore};
use crate::sampler::StateSampler;
use crate::store::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use walkthrough_timeline::{
    AudioHandle, HostClock, InspectAction, Interpolator, RecordedSession, SessionClock,
};

/// Recorder state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    /// Nothing recorded or loaded
    #[default]
    Idle,
    /// Capturing a walkthrough
    Recording,
    /// Waiting for the narration track to finalize
    Processing,
    /// A session is ready to play or save
    Stopped,
    /// Replaying a session
    Playing,
    /// Replay paused
    Paused,
}

impl RecorderState {
    /// Check if a recording is being captured or finalized
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording | Self::Processing)
    }

    /// Check if a playback is running or paused
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    /// Check if sessions may be loaded or cleared
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle | Self::Stopped)
    }
}

/// Clock driving playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSource {
    /// Narration playback position
    Audio,
    /// Host monotonic clock
    #[default]
    Host,
}

/// Which shell controls are usable in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlAvailability {
    /// Start a new recording
    pub record: bool,
    /// Stop recording or playback
    pub stop: bool,
    /// Start playback
    pub play: bool,
    /// Pause playback
    pub pause: bool,
    /// Resume playback
    pub resume: bool,
    /// Save or export the session
    pub save: bool,
    /// Discard the session
    pub clear: bool,
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to do in this state
    Idle,
    /// Recording tick; number of entries appended
    Recorded {
        /// Entries appended this tick
        appended: usize,
    },
    /// Still waiting for the narration track
    Finalizing,
    /// The session was finalized
    Finalized,
    /// Playback tick at this elapsed time
    Played {
        /// Milliseconds into the session
        elapsed: u64,
    },
    /// Playback reached the end and stopped
    Finished,
}

/// Counters for the current playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackStats {
    /// Playback ticks processed
    pub ticks: u64,
    /// Discrete events applied
    pub events_applied: usize,
    /// Discrete events skipped after a collaborator error
    pub events_skipped: usize,
    /// Switches from the audio clock to the host clock
    pub clock_fallbacks: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct PlaybackCursor {
    source: TimeSource,
    /// Source position corresponding to elapsed 0
    origin: u64,
    last_tick: Option<u64>,
    paused_at: u64,
    anchor: Option<usize>,
}

/// Records walkthroughs and plays them back
pub struct PlaybackController {
    config: RecorderConfig,
    state: RecorderState,
    adapter: InstrumentationAdapter,
    audio: Box<dyn AudioCollaborator>,
    clock: SessionClock,
    sampler: StateSampler,
    event_log: EventLog,
    session: Option<RecordedSession>,
    capturing_audio: bool,
    stop_elapsed: u64,
    cursor: PlaybackCursor,
    stats: PlaybackStats,
}

impl PlaybackController {
    /// Create a controller over the host's collaborators
    pub fn new(
        config: RecorderConfig,
        scene: Box<dyn SceneCollaborator>,
        document: Box<dyn DocumentCollaborator>,
        audio: Box<dyn AudioCollaborator>,
        host_clock: Arc<dyn HostClock>,
    ) -> Result<Self> {
        config.validate()?;
        let clock = SessionClock::new(host_clock);
        Ok(Self {
            sampler: StateSampler::new(&config),
            adapter: InstrumentationAdapter::new(scene, document, clock.clone()),
            config,
            state: RecorderState::Idle,
            audio,
            clock,
            event_log: EventLog::new(),
            session: None,
            capturing_audio: false,
            stop_elapsed: 0,
            cursor: PlaybackCursor::default(),
            stats: PlaybackStats::default(),
        })
    }

    /// Current state
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Active configuration
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Current session, if any
    pub fn session(&self) -> Option<&RecordedSession> {
        self.session.as_ref()
    }

    /// Counters for the current or last playback
    pub fn stats(&self) -> PlaybackStats {
        self.stats
    }

    /// Clock driving playback, while playing or paused
    pub fn time_source(&self) -> Option<TimeSource> {
        self.state.is_playing().then_some(self.cursor.source)
    }

    /// Instrumented collaborators, read-only
    pub fn instruments(&self) -> &InstrumentationAdapter {
        &self.adapter
    }

    /// Instrumented collaborators. Shell operations go through here so
    /// they are picked up by an active recording on the next tick.
    pub fn instruments_mut(&mut self) -> &mut InstrumentationAdapter {
        &mut self.adapter
    }

    /// Milliseconds into the current recording or playback
    pub fn elapsed(&self) -> u64 {
        match self.state {
            RecorderState::Recording => self.clock.elapsed(),
            RecorderState::Playing => self.cursor.last_tick.unwrap_or(0),
            RecorderState::Paused => self.cursor.paused_at,
            _ => 0,
        }
    }

    /// How often the host should call [`tick`](Self::tick), if at all
    pub fn tick_interval(&self) -> Option<Duration> {
        let millis = match self.state {
            RecorderState::Recording => self
                .config
                .state_interval_millis()
                .min(self.config.camera_interval_millis()),
            RecorderState::Processing | RecorderState::Playing => self.config.state_interval_millis(),
            _ => return None,
        };
        Some(Duration::from_millis(millis))
    }

    /// Controls usable in the current state
    pub fn controls(&self) -> ControlAvailability {
        let has_session = self.session.is_some();
        match self.state {
            RecorderState::Idle => ControlAvailability {
                record: true,
                ..Default::default()
            },
            RecorderState::Recording => ControlAvailability {
                stop: true,
                ..Default::default()
            },
            RecorderState::Processing => ControlAvailability::default(),
            RecorderState::Stopped => ControlAvailability {
                record: true,
                play: has_session,
                save: has_session,
                clear: true,
                ..Default::default()
            },
            RecorderState::Playing => ControlAvailability {
                stop: true,
                pause: true,
                save: has_session,
                ..Default::default()
            },
            RecorderState::Paused => ControlAvailability {
                stop: true,
                play: true,
                resume: true,
                save: has_session,
                ..Default::default()
            },
        }
    }

    /// Drive recording, finalization or playback by one step
    pub fn tick(&mut self) -> TickOutcome {
        match self.state {
            RecorderState::Recording => TickOutcome::Recorded {
                appended: self.record_tick(),
            },
            RecorderState::Processing => {
                let status = self.audio.poll_capture();
                self.handle_capture(status)
            }
            RecorderState::Playing => self.playback_tick(),
            RecorderState::Idle | RecorderState::Stopped | RecorderState::Paused => TickOutcome::Idle,
        }
    }

    // Recording

    /// Start a new recording, replacing any current session
    pub fn start(&mut self) -> bool {
        if !self.state.is_idle() {
            return false;
        }

        let initial = self.adapter.capture();
        self.clock.start();
        self.sampler.start(&initial);
        self.event_log.reset();
        self.session = Some(RecordedSession::new(initial));
        self.adapter.arm();

        self.capturing_audio = match self.audio.begin_capture() {
            Ok(()) => true,
            Err(AudioError::PermissionDenied(reason)) => {
                tracing::warn!("Microphone permission denied ({}), recording without narration", reason);
                false
            }
            Err(err) => {
                tracing::warn!("Narration capture unavailable: {}", err);
                false
            }
        };

        self.state = RecorderState::Recording;
        tracing::info!("Started recording");
        true
    }

    /// Log a discrete action that did not go through the instrumented
    /// operations. Only valid while recording.
    pub fn record_discrete_event(&mut self, action: InspectAction) -> bool {
        if self.state != RecorderState::Recording {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        self.event_log.drain(&mut self.adapter, session);
        let timestamp = self.clock.elapsed();
        let snapshot = self.adapter.capture();
        self.event_log
            .record_discrete_event(session, timestamp, action, snapshot)
    }

    fn record_tick(&mut self) -> usize {
        let Some(session) = self.session.as_mut() else {
            return 0;
        };
        let logged = self.event_log.drain(&mut self.adapter, session);
        let now = self.clock.elapsed();
        let adapter = &self.adapter;
        let sampled = self.sampler.poll(now, session, || adapter.capture());
        logged + sampled
    }

    fn stop_recording(&mut self) {
        let elapsed = self.clock.elapsed();
        if let Some(session) = self.session.as_mut() {
            self.event_log.drain(&mut self.adapter, session);
            let snapshot = self.adapter.capture();
            self.sampler.flush(elapsed, &snapshot, session);
        }
        self.sampler.stop();
        self.adapter.disarm();
        self.stop_elapsed = elapsed;
        self.state = RecorderState::Processing;
        tracing::info!("Stopped recording after {} ms", elapsed);

        let status = if self.capturing_audio {
            self.audio.finish_capture()
        } else {
            CaptureStatus::Ready(None)
        };
        self.handle_capture(status);
    }

    fn handle_capture(&mut self, status: CaptureStatus) -> TickOutcome {
        match status {
            CaptureStatus::Pending => TickOutcome::Finalizing,
            CaptureStatus::Ready(track) => {
                self.finish_session(track);
                TickOutcome::Finalized
            }
        }
    }

    fn finish_session(&mut self, track: Option<AudioHandle>) {
        self.capturing_audio = false;
        self.clock.reset();
        if let Some(session) = self.session.as_mut() {
            session.finalize(self.stop_elapsed, track);
            tracing::info!(
                "Finalized recording: {} entries, {} events, {} ms, narration: {}",
                session.len(),
                session.discrete_count(),
                session.duration_millis(),
                session.audio_track().is_some()
            );
        }
        self.state = RecorderState::Stopped;
    }

    // Playback

    /// Start playback from the beginning, or resume when paused
    pub fn play(&mut self) -> bool {
        match self.state {
            RecorderState::Paused => self.resume(),
            RecorderState::Stopped => self.start_playback(),
            _ => false,
        }
    }

    /// Pause playback
    pub fn pause(&mut self) -> bool {
        if self.state != RecorderState::Playing {
            return false;
        }
        let elapsed = self.playback_elapsed();
        if self.cursor.source == TimeSource::Audio {
            self.audio.pause();
        }
        self.cursor.paused_at = elapsed;
        self.state = RecorderState::Paused;
        tracing::info!("Paused playback at {} ms", elapsed);
        true
    }

    /// Resume a paused playback from where it paused
    pub fn resume(&mut self) -> bool {
        if self.state != RecorderState::Paused {
            return false;
        }
        let paused_at = self.cursor.paused_at;
        if self.cursor.source == TimeSource::Audio {
            if let Err(err) = self.audio.play() {
                self.switch_to_host(&err);
            }
        }
        let position = match self.cursor.source {
            TimeSource::Audio => match self.audio.position_millis() {
                Ok(position) => position,
                Err(err) => {
                    self.switch_to_host(&err);
                    self.clock.host_now()
                }
            },
            TimeSource::Host => self.clock.host_now(),
        };
        self.cursor.origin = position.saturating_sub(paused_at);
        self.state = RecorderState::Playing;
        tracing::info!("Resumed playback at {} ms", paused_at);
        true
    }

    /// Stop recording or playback
    pub fn stop(&mut self) -> bool {
        match self.state {
            RecorderState::Recording => {
                self.stop_recording();
                true
            }
            RecorderState::Playing | RecorderState::Paused => {
                self.stop_playback();
                true
            }
            _ => false,
        }
    }

    fn start_playback(&mut self) -> bool {
        let Some(session) = self.session.as_ref() else {
            tracing::warn!("No session to play");
            return false;
        };

        {
            let mut scope = self.adapter.replay();
            for err in restore(&mut scope, session.initial_state(), self.config.zoom_tolerance) {
                tracing::warn!("Initial state not fully restored: {}", err);
            }
        }

        let source = match session.audio_track() {
            Some(track) => match start_audio(self.audio.as_mut(), track) {
                Ok(()) => TimeSource::Audio,
                Err(err) => {
                    tracing::warn!("Narration unavailable ({}), playing on the host clock", err);
                    TimeSource::Host
                }
            },
            None => TimeSource::Host,
        };
        let origin = match source {
            TimeSource::Audio => 0,
            TimeSource::Host => self.clock.host_now(),
        };

        self.cursor = PlaybackCursor {
            source,
            origin,
            ..Default::default()
        };
        self.stats = PlaybackStats::default();
        self.state = RecorderState::Playing;
        tracing::info!(
            "Started playback of {} ms on the {:?} clock",
            session.duration_millis(),
            source
        );
        true
    }

    fn stop_playback(&mut self) {
        if self.cursor.source == TimeSource::Audio {
            self.audio.stop();
        }
        self.cursor = PlaybackCursor::default();
        self.state = RecorderState::Stopped;
        tracing::info!("Stopped playback");
    }

    fn playback_tick(&mut self) -> TickOutcome {
        let elapsed = self.playback_elapsed();
        let Some(session) = self.session.as_ref() else {
            self.state = RecorderState::Stopped;
            return TickOutcome::Idle;
        };

        let actions: Vec<(u64, InspectAction)> =
            Interpolator::discrete_events_between(session, self.cursor.last_tick, elapsed)
                .filter_map(|e| e.action().map(|a| (e.timestamp, a.clone())))
                .collect();
        let resolved = Interpolator::resolve(session, elapsed);
        let duration = session.duration_millis();

        {
            let mut scope = self.adapter.replay();
            for (timestamp, action) in &actions {
                match apply_action(&mut scope, action) {
                    Ok(()) => self.stats.events_applied += 1,
                    Err(err) => {
                        self.stats.events_skipped += 1;
                        tracing::warn!(
                            "Skipping {} at {} ms: {}",
                            action.event_type(),
                            timestamp,
                            err
                        );
                    }
                }
            }

            if resolved.anchor != self.cursor.anchor {
                for err in apply_discrete_fields(&mut scope, &resolved.snapshot, self.config.zoom_tolerance) {
                    tracing::debug!("Could not apply recorded state: {}", err);
                }
                self.cursor.anchor = resolved.anchor;
            }
            apply_continuous(&mut scope, &resolved.snapshot);
        }

        self.cursor.last_tick = Some(elapsed);
        self.stats.ticks += 1;

        if elapsed >= duration {
            tracing::info!("Playback finished at {} ms", elapsed);
            self.stop_playback();
            return TickOutcome::Finished;
        }
        TickOutcome::Played { elapsed }
    }

    fn playback_elapsed(&mut self) -> u64 {
        if self.cursor.source == TimeSource::Audio {
            match self.audio.position_millis() {
                Ok(position) => {
                    let elapsed = position.saturating_sub(self.cursor.origin);
                    if !self.audio.has_ended() || elapsed >= self.duration() {
                        return elapsed;
                    }
                    tracing::warn!("Narration ended at {} ms, continuing on the host clock", elapsed);
                    self.fall_back_to_host(elapsed);
                }
                Err(err) => {
                    tracing::warn!("Narration clock lost ({}), continuing on the host clock", err);
                    let resume_at = self.cursor.last_tick.unwrap_or(self.cursor.paused_at);
                    self.fall_back_to_host(resume_at);
                }
            }
        }
        self.clock.host_now().saturating_sub(self.cursor.origin)
    }

    fn fall_back_to_host(&mut self, resume_at: u64) {
        self.audio.stop();
        self.cursor.source = TimeSource::Host;
        self.cursor.origin = self.clock.host_now().saturating_sub(resume_at);
        self.stats.clock_fallbacks += 1;
    }

    fn switch_to_host(&mut self, err: &AudioError) {
        tracing::warn!("Narration clock lost ({}), continuing on the host clock", err);
        self.audio.stop();
        self.cursor.source = TimeSource::Host;
        self.stats.clock_fallbacks += 1;
    }

    fn duration(&self) -> u64 {
        self.session.as_ref().map_or(0, RecordedSession::duration_millis)
    }

    // Session management

    /// Replace the session with one decoded from JSON.
    ///
    /// On error the current session is left untouched.
    pub fn load_session(&mut self, json: &str) -> Result<()> {
        self.ensure_idle()?;
        let session = RecordedSession::from_json(json)?;
        self.install(session);
        Ok(())
    }

    /// Replace the session with one from a store
    pub fn load_saved(&mut self, store: &dyn SessionStore, name: &str) -> Result<()> {
        self.ensure_idle()?;
        let session = store.load(&self.config.storage_key(name))?;
        self.install(session);
        Ok(())
    }

    /// Encode the session as JSON
    pub fn export_session(&self) -> Result<String> {
        let session = self.finished_session()?;
        Ok(session.to_json()?)
    }

    /// Write the session to a store under a name
    pub fn save_session(&self, store: &mut dyn SessionStore, name: &str) -> Result<()> {
        let session = self.finished_session()?;
        let key = self.config.storage_key(name);
        store.save(&key, session)?;
        tracing::info!("Saved session as {}", key);
        Ok(())
    }

    /// Discard the session
    pub fn clear_session(&mut self) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        self.session = None;
        self.state = RecorderState::Idle;
        tracing::info!("Cleared session");
        true
    }

    fn install(&mut self, session: RecordedSession) {
        tracing::info!(
            "Loaded session {} ({} entries, {} ms)",
            session.id,
            session.len(),
            session.duration_millis()
        );
        self.session = Some(session);
        self.state = RecorderState::Stopped;
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state.is_idle() {
            Ok(())
        } else {
            Err(RecorderError::Busy(self.state))
        }
    }

    fn finished_session(&self) -> Result<&RecordedSession> {
        match &self.session {
            Some(session) if session.is_finalized() => Ok(session),
            Some(_) => Err(RecorderError::Busy(self.state)),
            None => Err(RecorderError::NoSession),
        }
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &self.state)
            .field("session", &self.session.as_ref().map(|s| s.id))
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

fn start_audio(audio: &mut dyn AudioCollaborator, track: &AudioHandle) -> std::result::Result<(), AudioError> {
    audio.load(track)?;
    audio.play()
}
