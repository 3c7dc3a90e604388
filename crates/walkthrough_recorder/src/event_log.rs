// SPDX-License-Identifier: MIT OR Apache-2.0
//! Discrete event logging.

use crate::instrumentation::{InstrumentationAdapter, Notification};
use walkthrough_timeline::{InspectAction, RecordedSession, StateSnapshot, TimestampedEntry};

/// Appends discrete user actions to the recording timeline
#[derive(Debug, Default)]
pub struct EventLog {
    recorded: usize,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the count of a previous recording
    pub fn reset(&mut self) {
        self.recorded = 0;
    }

    /// Number of events logged since the last reset
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    /// Append one discrete event with its post-action snapshot
    pub fn record_discrete_event(
        &mut self,
        session: &mut RecordedSession,
        timestamp: u64,
        action: InspectAction,
        snapshot: StateSnapshot,
    ) -> bool {
        if !action.is_discrete() {
            tracing::trace!("Not logging continuous action {}", action.event_type());
            return false;
        }
        let event_type = action.event_type();
        if !session.append(TimestampedEntry::discrete(timestamp, action, snapshot)) {
            tracing::warn!("Session refused event {} at {} ms", event_type, timestamp);
            return false;
        }
        self.recorded += 1;
        tracing::debug!("Logged {} at {} ms", event_type, timestamp);
        true
    }

    /// Move queued adapter notifications into the session
    pub fn drain(
        &mut self,
        adapter: &mut InstrumentationAdapter,
        session: &mut RecordedSession,
    ) -> usize {
        let mut logged = 0;
        for Notification {
            timestamp,
            action,
            snapshot,
        } in adapter.take_notifications()
        {
            if self.record_discrete_event(session, timestamp, action, snapshot) {
                logged += 1;
            }
        }
        logged
    }
}
