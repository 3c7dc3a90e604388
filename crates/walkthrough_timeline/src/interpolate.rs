// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time-based resolution of a recorded timeline.

use crate::entry::{EntryKind, TimestampedEntry};
use crate::session::RecordedSession;
use crate::snapshot::{CameraPose, EffectAmounts, StateSnapshot};

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Interpolate Vec3
    pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
        [
            Self::lerp(a[0], b[0], t),
            Self::lerp(a[1], b[1], t),
            Self::lerp(a[2], b[2], t),
        ]
    }

    /// Interpolate a camera pose axis by axis
    pub fn lerp_camera(a: &CameraPose, b: &CameraPose, t: f32) -> CameraPose {
        CameraPose {
            position: Self::lerp_vec3(a.position, b.position, t),
            target: Self::lerp_vec3(a.target, b.target, t),
        }
    }

    /// Interpolate effect amounts independently
    pub fn lerp_effects(a: &EffectAmounts, b: &EffectAmounts, t: f32) -> EffectAmounts {
        EffectAmounts {
            explode: Self::lerp(a.explode, b.explode, t),
            slice: Self::lerp(a.slice, b.slice, t),
            xray: Self::lerp(a.xray, b.xray, t),
        }
    }
}

/// State resolved for one playback instant
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Blended state
    pub snapshot: StateSnapshot,
    /// Whether the instant lies past the last entry
    pub end_of_timeline: bool,
    /// Index of the entry at or before the instant
    pub anchor: Option<usize>,
}

/// Resolves blended state and discrete windows from a session
pub struct Interpolator;

impl Interpolator {
    /// Resolve the state at `time` (ms since origin).
    ///
    /// Camera axes and effect amounts blend between the bracketing entries;
    /// everything else is taken from the earlier entry verbatim.
    pub fn resolve(session: &RecordedSession, time: u64) -> Resolved {
        let events = session.events();
        let split = events.partition_point(|e| e.timestamp <= time);
        let anchor = split.checked_sub(1);

        match (anchor.and_then(|i| events.get(i)), events.get(split)) {
            (None, _) => Resolved {
                snapshot: session.initial_state().clone(),
                end_of_timeline: false,
                anchor,
            },
            (Some(a), None) => Resolved {
                snapshot: a.snapshot.clone(),
                end_of_timeline: time > a.timestamp,
                anchor,
            },
            (Some(a), Some(b)) => {
                let span = (b.timestamp - a.timestamp) as f32;
                let factor = ((time - a.timestamp) as f32 / span).clamp(0.0, 1.0);
                Resolved {
                    snapshot: Self::blend(&a.snapshot, &b.snapshot, factor),
                    end_of_timeline: false,
                    anchor,
                }
            }
        }
    }

    /// Blend the numeric fields of `b` into `a`
    pub fn blend(a: &StateSnapshot, b: &StateSnapshot, factor: f32) -> StateSnapshot {
        let mut out = a.clone();
        out.camera = Interpolation::lerp_camera(&a.camera, &b.camera, factor);
        out.effects = Interpolation::lerp_effects(&a.effects, &b.effects, factor);
        out
    }

    /// Discrete events in `(after, upto]`, or `[0, upto]` when `after` is
    /// `None`, in timeline order
    pub fn discrete_events_between(
        session: &RecordedSession,
        after: Option<u64>,
        upto: u64,
    ) -> impl Iterator<Item = &TimestampedEntry> {
        session.events().iter().filter(move |e| {
            e.kind == EntryKind::DiscreteEvent
                && e.timestamp <= upto
                && after.map_or(true, |a| e.timestamp > a)
        })
    }
}
