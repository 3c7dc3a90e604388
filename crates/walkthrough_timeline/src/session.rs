// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recorded sessions and their serialized form.

use crate::entry::{EntryKind, TimestampedEntry};
use crate::error::{Result, SessionError};
use crate::snapshot::StateSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a recorded session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque handle to a narration track held by the audio collaborator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioHandle(pub String);

impl AudioHandle {
    /// Create a handle
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Get the raw handle
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A narrated walkthrough: ordered timeline plus narration handle.
///
/// Entries are appended while recording and the session becomes read-only
/// once [`RecordedSession::finalize`] runs. Sessions decoded from JSON are
/// always finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSession {
    /// Unique session ID
    pub id: SessionId,
    /// Narration track, absent for visual-only sessions
    audio_track: Option<AudioHandle>,
    /// Ordered timeline
    events: Vec<TimestampedEntry>,
    /// Total length
    duration_millis: u64,
    /// State when recording started
    initial_state: StateSnapshot,
    /// Creation time
    created_at: DateTime<Utc>,
    /// Whether the session is read-only
    finalized: bool,
}

impl RecordedSession {
    /// Create an open session holding only the initial entry
    pub fn new(initial_state: StateSnapshot) -> Self {
        Self {
            id: SessionId::new(),
            audio_track: None,
            events: vec![TimestampedEntry::initial(initial_state.clone())],
            duration_millis: 0,
            initial_state,
            created_at: Utc::now(),
            finalized: false,
        }
    }

    /// Append an entry to an open session.
    ///
    /// Timestamps earlier than the last entry are raised to it so the
    /// timeline never goes backwards. Returns `false` when the session is
    /// finalized or the entry is a second initial entry.
    pub fn append(&mut self, mut entry: TimestampedEntry) -> bool {
        if self.finalized {
            tracing::warn!("Ignoring {} entry: session is finalized", entry.kind.name());
            return false;
        }
        if entry.kind == EntryKind::Initial {
            tracing::warn!("Ignoring extra initial entry");
            return false;
        }

        let last = self.last_timestamp();
        if entry.timestamp < last {
            tracing::debug!(
                "Raising {} entry timestamp {} to {}",
                entry.kind.name(),
                entry.timestamp,
                last
            );
            entry.timestamp = last;
        }

        self.events.push(entry);
        true
    }

    /// Finalize duration and narration; the session is read-only afterwards
    pub fn finalize(&mut self, duration_millis: u64, audio_track: Option<AudioHandle>) {
        if self.finalized {
            return;
        }
        self.duration_millis = duration_millis.max(self.last_timestamp());
        self.audio_track = audio_track;
        self.finalized = true;
    }

    /// Whether the session is read-only
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Ordered timeline
    pub fn events(&self) -> &[TimestampedEntry] {
        &self.events
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the timeline holds only the initial entry
    pub fn is_empty(&self) -> bool {
        self.events.len() <= 1
    }

    /// Narration handle
    pub fn audio_track(&self) -> Option<&AudioHandle> {
        self.audio_track.as_ref()
    }

    /// Total length in milliseconds
    pub fn duration_millis(&self) -> u64 {
        self.duration_millis
    }

    /// State when recording started
    pub fn initial_state(&self) -> &StateSnapshot {
        &self.initial_state
    }

    /// Creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Timestamp of the last entry
    pub fn last_timestamp(&self) -> u64 {
        self.events.last().map(|e| e.timestamp).unwrap_or(0)
    }

    /// Number of discrete events
    pub fn discrete_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.kind == EntryKind::DiscreteEvent)
            .count()
    }

    /// Convert into the storage form
    pub fn to_serialized(&self) -> SerializedSession {
        SerializedSession {
            id: self.id,
            audio: self.audio_track.clone(),
            states: self.events.clone(),
            duration: self.duration_millis,
            timestamp: self.created_at,
            initial_state: self.initial_state.clone(),
        }
    }

    /// Encode as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_serialized())?)
    }

    /// Decode and validate JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let serialized: SerializedSession = serde_json::from_str(json)?;
        Self::try_from(serialized)
    }
}

/// Storage form of a [`RecordedSession`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedSession {
    /// Session ID
    #[serde(default)]
    pub id: SessionId,
    /// Narration handle
    pub audio: Option<AudioHandle>,
    /// Ordered timeline
    pub states: Vec<TimestampedEntry>,
    /// Total length in milliseconds
    pub duration: u64,
    /// Creation time (ISO-8601)
    pub timestamp: DateTime<Utc>,
    /// State when recording started
    pub initial_state: StateSnapshot,
}

impl SerializedSession {
    /// Check the timeline invariants
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.states.first() else {
            return Err(SessionError::Malformed("timeline is empty".to_string()));
        };
        if first.kind != EntryKind::Initial || first.timestamp != 0 {
            return Err(SessionError::Malformed(
                "first entry must be the initial entry at 0 ms".to_string(),
            ));
        }

        let mut previous = 0;
        for (index, entry) in self.states.iter().enumerate().skip(1) {
            if entry.timestamp < previous {
                return Err(SessionError::Malformed(format!(
                    "entry {index} at {} ms precedes {previous} ms",
                    entry.timestamp
                )));
            }
            previous = entry.timestamp;

            match (entry.kind, &entry.event) {
                (EntryKind::Initial, _) => {
                    return Err(SessionError::Malformed(format!(
                        "entry {index} is a second initial entry"
                    )));
                }
                (EntryKind::DiscreteEvent, Some(action)) if action.is_discrete() => {}
                (EntryKind::DiscreteEvent, _) => {
                    return Err(SessionError::Malformed(format!(
                        "entry {index} is a discrete event without a discrete action"
                    )));
                }
                (_, Some(_)) => {
                    return Err(SessionError::Malformed(format!(
                        "sample entry {index} carries an action"
                    )));
                }
                (_, None) => {}
            }
        }

        if previous > self.duration {
            return Err(SessionError::Malformed(format!(
                "last entry at {previous} ms is past the duration of {} ms",
                self.duration
            )));
        }

        Ok(())
    }
}

impl TryFrom<SerializedSession> for RecordedSession {
    type Error = SessionError;

    fn try_from(serialized: SerializedSession) -> Result<Self> {
        serialized.validate()?;
        Ok(Self {
            id: serialized.id,
            audio_track: serialized.audio,
            events: serialized.states,
            duration_millis: serialized.duration,
            initial_state: serialized.initial_state,
            created_at: serialized.timestamp,
            finalized: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::InspectAction;

    fn sample_session() -> RecordedSession {
        let mut session = RecordedSession::new(StateSnapshot::default());
        let mut focused = StateSnapshot::default();
        focused.focused_part = Some("Rotor".to_string());
        session.append(TimestampedEntry::discrete(
            120,
            InspectAction::FocusPart { name: "Rotor".to_string() },
            focused.clone(),
        ));
        session.append(TimestampedEntry::state(180, focused));
        session.finalize(400, Some(AudioHandle::new("blob:narration")));
        session
    }

    #[test]
    fn test_new_session_has_initial_entry() {
        let session = RecordedSession::new(StateSnapshot::default());
        assert_eq!(session.len(), 1);
        assert_eq!(session.events()[0].kind, EntryKind::Initial);
        assert_eq!(session.events()[0].timestamp, 0);
        assert!(session.is_empty());
    }

    #[test]
    fn test_append_keeps_order() {
        let mut session = RecordedSession::new(StateSnapshot::default());
        session.append(TimestampedEntry::state(50, StateSnapshot::default()));
        session.append(TimestampedEntry::camera(30, StateSnapshot::default()));
        let stamps: Vec<u64> = session.events().iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![0, 50, 50]);
    }

    #[test]
    fn test_finalized_session_is_read_only() {
        let mut session = sample_session();
        assert!(!session.append(TimestampedEntry::state(500, StateSnapshot::default())));
        assert_eq!(session.len(), 3);
        assert_eq!(session.duration_millis(), 400);
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let session = sample_session();
        let json = session.to_json().unwrap();
        let loaded = RecordedSession::from_json(&json).unwrap();
        assert_eq!(loaded.events(), session.events());
        assert_eq!(loaded.audio_track(), session.audio_track());
        assert_eq!(loaded.duration_millis(), 400);
        assert!(loaded.is_finalized());
    }

    #[test]
    fn test_timestamp_is_iso8601() {
        let json = sample_session().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let stamp = value["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let err = RecordedSession::from_json(r#"{"audio": null, "duration": 10}"#).unwrap_err();
        assert!(matches!(err, SessionError::Json(_)));
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut serialized = sample_session().to_serialized();
        serialized.states.swap(1, 2);
        assert!(matches!(serialized.validate(), Err(SessionError::Malformed(_))));
    }

    #[test]
    fn test_missing_initial_rejected() {
        let mut serialized = sample_session().to_serialized();
        serialized.states.remove(0);
        assert!(matches!(serialized.validate(), Err(SessionError::Malformed(_))));
    }

    #[test]
    fn test_entry_past_duration_rejected() {
        let mut serialized = sample_session().to_serialized();
        serialized.duration = 100;
        assert!(matches!(serialized.validate(), Err(SessionError::Malformed(_))));
    }
}
