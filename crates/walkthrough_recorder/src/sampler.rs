// SPDX-License-Identifier: MIT OR Apache-2.0
//! Periodic state sampling during a recording.
//!
//! Two independent timers run on the recording clock: a general state
//! timer and a faster-or-slower camera timer. On each firing the sampler
//! compares the live state with the last snapshot it emitted for that
//! channel and appends an entry only if something moved beyond the
//! tolerance. Both baselines start at the initial snapshot.

use crate::config::RecorderConfig;
use walkthrough_timeline::{RecordedSession, StateSnapshot, TimestampedEntry};

/// Fixed-rate deadline on the recording clock.
///
/// Deadline `n` falls at `n * period` rounded to the millisecond, so rates
/// that do not divide 1000 keep their average (60 Hz alternates 17/16/17).
#[derive(Debug, Clone, Copy, PartialEq)]
struct SampleTimer {
    period: f64,
    next: u64,
}

impl SampleTimer {
    fn new(hz: f32) -> Self {
        Self {
            period: 1000.0 / f64::from(hz),
            next: 1,
        }
    }

    fn restart(&mut self) {
        self.next = 1;
    }

    fn due(&self, n: u64) -> u64 {
        (n as f64 * self.period).round() as u64
    }

    /// Fire at most once per poll; missed deadlines are skipped
    fn fire(&mut self, now: u64) -> bool {
        if now < self.due(self.next) {
            return false;
        }
        self.next = (now as f64 / self.period).floor() as u64 + 1;
        while self.due(self.next) <= now {
            self.next += 1;
        }
        true
    }
}

/// Emits change-gated state and camera samples
#[derive(Debug)]
pub struct StateSampler {
    state_timer: SampleTimer,
    camera_timer: SampleTimer,
    tolerance: f32,
    last_state: Option<StateSnapshot>,
    last_camera: Option<StateSnapshot>,
    emitted: usize,
}

impl StateSampler {
    /// Create a stopped sampler
    pub fn new(config: &RecorderConfig) -> Self {
        Self {
            state_timer: SampleTimer::new(config.state_sample_hz),
            camera_timer: SampleTimer::new(config.camera_sample_hz),
            tolerance: config.change_tolerance,
            last_state: None,
            last_camera: None,
            emitted: 0,
        }
    }

    /// Start sampling against an initial snapshot
    pub fn start(&mut self, baseline: &StateSnapshot) {
        self.state_timer.restart();
        self.camera_timer.restart();
        self.last_state = Some(baseline.clone());
        self.last_camera = Some(baseline.clone());
        self.emitted = 0;
    }

    /// Stop sampling
    pub fn stop(&mut self) {
        self.last_state = None;
        self.last_camera = None;
    }

    /// Whether the sampler has been started
    pub fn is_running(&self) -> bool {
        self.last_state.is_some()
    }

    /// Samples emitted since the last start
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Run due timers at `now` and append changed samples.
    ///
    /// `capture` is called at most once, and only if a timer fired.
    pub fn poll<F>(&mut self, now: u64, session: &mut RecordedSession, capture: F) -> usize
    where
        F: FnOnce() -> StateSnapshot,
    {
        if !self.is_running() {
            return 0;
        }
        let state_due = self.state_timer.fire(now);
        let camera_due = self.camera_timer.fire(now);
        if !state_due && !camera_due {
            return 0;
        }
        let snapshot = capture();
        let mut appended = 0;
        if state_due && self.sample_state(now, &snapshot, session) {
            appended += 1;
        }
        if camera_due && self.sample_camera(now, &snapshot, session) {
            appended += 1;
        }
        appended
    }

    /// Check both channels immediately, regardless of timers
    pub fn flush(&mut self, now: u64, snapshot: &StateSnapshot, session: &mut RecordedSession) -> usize {
        if !self.is_running() {
            return 0;
        }
        usize::from(self.sample_state(now, snapshot, session))
            + usize::from(self.sample_camera(now, snapshot, session))
    }

    fn sample_state(&mut self, now: u64, snapshot: &StateSnapshot, session: &mut RecordedSession) -> bool {
        let changed = self
            .last_state
            .as_ref()
            .map_or(true, |last| snapshot.state_differs(last, self.tolerance));
        if !changed || !session.append(TimestampedEntry::state(now, snapshot.clone())) {
            return false;
        }
        tracing::trace!("State sample at {} ms", now);
        self.last_state = Some(snapshot.clone());
        self.emitted += 1;
        true
    }

    fn sample_camera(&mut self, now: u64, snapshot: &StateSnapshot, session: &mut RecordedSession) -> bool {
        let changed = self
            .last_camera
            .as_ref()
            .map_or(true, |last| snapshot.camera_differs(last, self.tolerance));
        if !changed || !session.append(TimestampedEntry::camera(now, snapshot.clone())) {
            return false;
        }
        tracing::trace!("Camera sample at {} ms", now);
        self.last_camera = Some(snapshot.clone());
        self.emitted += 1;
        true
    }
}
