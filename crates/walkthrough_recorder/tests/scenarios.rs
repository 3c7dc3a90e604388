// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end recording and playback scenarios.

mod support;

use approx::assert_relative_eq;
use support::Rig;
use walkthrough_recorder::{
    DocumentCollaborator, MemorySessionStore, RecorderError, RecorderState, SceneCollaborator,
    SessionStore, TickOutcome, TimeSource,
};
use walkthrough_timeline::{
    AudioHandle, CameraPose, EffectAmounts, InspectAction, RecordedSession, StateSnapshot, TimestampedEntry,
};

/// Record a short walkthrough touching camera, effects, focus and document
fn record_walkthrough(rig: &mut Rig) {
    assert!(rig.controller.start());
    rig.advance(100);
    rig.controller
        .instruments_mut()
        .set_effect_amounts(EffectAmounts::new(0.3, 1.0, 1.0));
    rig.advance(100);
    rig.controller.instruments_mut().focus_part("Rotor").unwrap();
    rig.advance(100);
    rig.controller.instruments_mut().switch_asset("manual").unwrap();
    rig.controller.instruments_mut().set_page(3);
    rig.advance(100);
    rig.controller
        .instruments_mut()
        .set_camera_pose(CameraPose::new([2.0, 1.0, 6.0], [0.0, 0.5, 0.0]));
    rig.advance(100);
    assert!(rig.controller.stop());
}

fn discrete_actions(session: &RecordedSession) -> Vec<InspectAction> {
    session
        .events()
        .iter()
        .filter_map(|e| e.action().cloned())
        .collect()
}

#[test]
fn records_discrete_events_in_order() {
    let mut rig = Rig::new();
    record_walkthrough(&mut rig);

    assert_eq!(rig.controller.state(), RecorderState::Stopped);
    let session = rig.controller.session().unwrap();
    assert_eq!(
        discrete_actions(session),
        vec![
            InspectAction::FocusPart {
                name: "Rotor".to_string()
            },
            InspectAction::SwitchAsset {
                asset_id: "manual".to_string()
            },
            InspectAction::SetPage { page: 3 },
        ]
    );
    assert_eq!(session.duration_millis(), 500);
    assert_eq!(session.audio_track(), Some(&AudioHandle::new("take-1")));

    let stamps: Vec<u64> = session.events().iter().map(|e| e.timestamp).collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    assert!(session.events().iter().any(|e| e.snapshot.effects.explode == 0.3));
    assert!(session
        .events()
        .iter()
        .any(|e| e.snapshot.camera.position == [2.0, 1.0, 6.0]));
}

#[test]
fn scenario_a_blends_continuous_and_steps_discrete() {
    let mut rig = Rig::with_parts(["X"]);

    let initial = rig.controller.instruments().capture();
    let mut session = RecordedSession::new(initial.clone());
    let mut focused = initial.clone();
    focused.effects.explode = 0.5;
    focused.focused_part = Some("X".to_string());
    session.append(TimestampedEntry::discrete(
        500,
        InspectAction::FocusPart {
            name: "X".to_string(),
        },
        focused.clone(),
    ));
    let mut end = focused;
    end.effects.explode = 1.0;
    session.append(TimestampedEntry::state(1000, end));
    session.finalize(1000, None);

    rig.controller.load_session(&session.to_json().unwrap()).unwrap();
    assert!(rig.controller.play());
    assert_eq!(rig.controller.time_source(), Some(TimeSource::Host));

    rig.host.advance(250);
    assert_eq!(rig.controller.tick(), TickOutcome::Played { elapsed: 250 });
    assert_relative_eq!(rig.scene.effect_amounts().explode, 0.25, epsilon = 1e-4);
    assert_eq!(rig.scene.focused_part(), None);

    rig.host.advance(350);
    assert_eq!(rig.controller.tick(), TickOutcome::Played { elapsed: 600 });
    assert_relative_eq!(rig.scene.effect_amounts().explode, 0.6, epsilon = 1e-4);
    assert_eq!(rig.scene.focused_part().as_deref(), Some("X"));
    assert_eq!(rig.controller.stats().events_applied, 1);
}

#[test]
fn scenario_b_pause_resume_keeps_position() {
    let mut rig = Rig::new();
    assert!(rig.controller.start());
    rig.advance(5_000);
    rig.controller.stop();

    assert!(rig.controller.play());
    assert_eq!(rig.controller.time_source(), Some(TimeSource::Audio));
    rig.advance(2_000);
    assert!(rig.controller.pause());
    assert_eq!(rig.controller.elapsed(), 2_000);

    rig.host.advance(5_000);
    assert_eq!(rig.controller.tick(), TickOutcome::Idle);

    assert!(rig.controller.resume());
    assert_eq!(rig.controller.tick(), TickOutcome::Played { elapsed: 2_000 });
    rig.host.advance(100);
    assert_eq!(rig.controller.tick(), TickOutcome::Played { elapsed: 2_100 });
}

#[test]
fn scenario_b_on_host_clock() {
    let mut rig = Rig::new();
    rig.audio.deny_permission();
    assert!(rig.controller.start());
    rig.advance(5_000);
    rig.controller.stop();

    assert!(rig.controller.play());
    assert_eq!(rig.controller.time_source(), Some(TimeSource::Host));
    rig.advance(2_000);
    assert!(rig.controller.pause());

    rig.host.advance(5_000);
    assert!(rig.controller.play());
    assert_eq!(rig.controller.tick(), TickOutcome::Played { elapsed: 2_000 });
}

#[test]
fn events_skipped_while_paused_apply_in_order_on_resume() {
    let mut rig = Rig::new();
    let initial = rig.controller.instruments().capture();
    let mut session = RecordedSession::new(initial.clone());
    for (timestamp, part) in [(100, "Housing"), (200, "Rotor"), (300, "Shaft")] {
        let mut focused = initial.clone();
        focused.focused_part = Some(part.to_string());
        session.append(TimestampedEntry::discrete(
            timestamp,
            InspectAction::FocusPart {
                name: part.to_string(),
            },
            focused,
        ));
    }
    session.finalize(1_000, None);

    rig.controller.load_session(&session.to_json().unwrap()).unwrap();
    assert!(rig.controller.play());
    rig.scene.clear_journal();
    rig.host.advance(50);
    assert_eq!(rig.controller.tick(), TickOutcome::Played { elapsed: 50 });
    assert!(rig.controller.pause());

    rig.host.advance(5_000);
    assert_eq!(rig.controller.tick(), TickOutcome::Idle);
    assert!(rig.scene.journal().is_empty());

    assert!(rig.controller.resume());
    rig.host.advance(400);
    assert_eq!(rig.controller.tick(), TickOutcome::Played { elapsed: 450 });
    assert_eq!(
        rig.scene.journal(),
        vec!["focus_part:Housing", "focus_part:Rotor", "focus_part:Shaft"]
    );
    assert_eq!(rig.controller.stats().events_applied, 3);
}

#[test]
fn repeated_events_are_all_recorded() {
    let mut rig = Rig::new();
    assert!(rig.controller.start());
    rig.advance(100);
    for _ in 0..5 {
        rig.controller.instruments_mut().focus_part("Rotor").unwrap();
    }
    rig.advance(10);
    assert!(rig.controller.stop());

    let session = rig.controller.session().unwrap();
    assert_eq!(session.discrete_count(), 5);
    let stamps: Vec<u64> = session
        .events()
        .iter()
        .filter(|e| e.action().is_some())
        .map(|e| e.timestamp)
        .collect();
    assert_eq!(stamps, vec![100; 5]);
}

#[test]
fn back_navigation_after_replayed_focus_returns_to_recorded_pose() {
    let mut rig = Rig::new();
    let overview = CameraPose::new([0.0, 4.0, 10.0], [0.0, 0.0, 0.0]);
    rig.controller.instruments_mut().set_camera_pose(overview);
    assert!(rig.controller.start());
    rig.advance(100);
    rig.controller.instruments_mut().focus_part("Rotor").unwrap();
    rig.controller
        .instruments_mut()
        .set_camera_pose(CameraPose::new([0.5, 0.5, 2.0], [0.0, 0.3, 0.0]));
    rig.advance(100);
    assert!(rig.controller.stop());

    let json = rig.controller.export_session().unwrap();
    let mut other = Rig::new();
    other.controller.load_session(&json).unwrap();
    assert!(other.controller.play());
    other.play_to_end();
    assert_eq!(other.scene.focused_part().as_deref(), Some("Rotor"));
    assert_eq!(other.scene.previous_camera(), Some(overview));

    other.controller.instruments_mut().clear_focus();
    assert_eq!(other.scene.camera_pose(), overview);
}

#[test]
fn scenario_c_empty_recording_finishes_immediately() {
    let mut rig = Rig::new();
    assert!(rig.controller.start());
    assert!(rig.controller.stop());

    let session = rig.controller.session().unwrap();
    assert_eq!(session.len(), 1);
    assert_eq!(session.duration_millis(), 0);

    assert!(rig.controller.play());
    assert_eq!(rig.controller.tick(), TickOutcome::Finished);
    assert_eq!(rig.controller.state(), RecorderState::Stopped);
}

#[test]
fn replay_of_loaded_session_matches_original() {
    let mut original = Rig::new();
    record_walkthrough(&mut original);
    let json = original.controller.export_session().unwrap();

    let mut loaded = Rig::new();
    loaded.controller.load_session(&json).unwrap();
    assert_eq!(
        loaded.controller.session().map(RecordedSession::events),
        original.controller.session().map(RecordedSession::events)
    );

    let mut journals = Vec::new();
    for rig in [&mut original, &mut loaded] {
        assert!(rig.controller.play());
        rig.scene.clear_journal();
        let document_before = rig.document.journal().len();
        rig.play_to_end();
        let document_calls = rig.document.journal()[document_before..].to_vec();
        journals.push((rig.scene.journal(), document_calls));
    }

    assert_eq!(journals[0], journals[1]);
    let (scene_calls, document_calls) = &journals[0];
    assert!(scene_calls.contains(&"focus_part:Rotor".to_string()));
    assert_eq!(document_calls, &vec!["load_asset:manual".to_string(), "set_page:3".to_string()]);
    assert_eq!(original.controller.stats(), loaded.controller.stats());
    assert_eq!(loaded.controller.stats().events_applied, 3);
}

#[test]
fn playback_ends_on_final_state() {
    let mut rig = Rig::new();
    record_walkthrough(&mut rig);
    let last = rig
        .controller
        .session()
        .and_then(|s| s.events().last())
        .map(|e| e.snapshot.clone())
        .unwrap();

    rig.controller.play();
    rig.play_to_end();
    let live = rig.controller.instruments().capture();
    assert_eq!(live.camera, last.camera);
    assert_eq!(live.effects, last.effects);
    assert_eq!(live.focused_part, last.focused_part);
    assert_eq!(live.document, last.document);
}

#[test]
fn playback_does_not_feed_back_into_recording() {
    let mut rig = Rig::new();
    record_walkthrough(&mut rig);
    let before = rig.controller.session().unwrap().clone();

    rig.controller.play();
    rig.advance(250);
    rig.controller.instruments_mut().set_page(7);
    rig.play_to_end();

    assert_eq!(rig.controller.instruments().pending_count(), 0);
    assert_eq!(rig.controller.session(), Some(&before));
}

#[test]
fn controls_are_idempotent() {
    let mut rig = Rig::new();
    assert!(!rig.controller.stop());
    assert!(rig.controller.start());
    assert!(!rig.controller.start());
    assert!(!rig.controller.play());
    assert!(rig.controller.stop());
    assert!(!rig.controller.stop());

    assert!(rig.controller.play());
    assert!(!rig.controller.play());
    assert!(!rig.controller.resume());
    assert!(rig.controller.pause());
    assert!(!rig.controller.pause());
    assert!(rig.controller.resume());
    assert!(!rig.controller.resume());
}

#[test]
fn permission_denied_records_visual_only() {
    let mut rig = Rig::new();
    rig.audio.deny_permission();
    record_walkthrough(&mut rig);

    let session = rig.controller.session().unwrap();
    assert!(session.audio_track().is_none());
    assert_eq!(session.discrete_count(), 3);

    rig.controller.play();
    assert_eq!(rig.controller.time_source(), Some(TimeSource::Host));
    assert!(rig.audio.loaded().is_none());
}

#[test]
fn pending_narration_keeps_processing() {
    let mut rig = Rig::new();
    rig.audio.delay_finish(2);
    assert!(rig.controller.start());
    rig.advance(300);
    assert!(rig.controller.stop());
    assert_eq!(rig.controller.state(), RecorderState::Processing);
    assert!(!rig.controller.play());

    rig.host.advance(1_000);
    assert_eq!(rig.controller.tick(), TickOutcome::Finalizing);
    assert_eq!(rig.controller.tick(), TickOutcome::Finalized);
    assert_eq!(rig.controller.state(), RecorderState::Stopped);

    let session = rig.controller.session().unwrap();
    assert_eq!(session.duration_millis(), 300);
    assert!(session.audio_track().is_some());
}

#[test]
fn audio_failure_falls_back_to_host_clock() {
    let mut rig = Rig::new();
    assert!(rig.controller.start());
    rig.advance(3_000);
    rig.controller.stop();

    rig.controller.play();
    rig.advance(1_000);
    assert_eq!(rig.controller.time_source(), Some(TimeSource::Audio));

    rig.audio.fail_position();
    rig.host.advance(500);
    assert_eq!(rig.controller.tick(), TickOutcome::Played { elapsed: 1_000 });
    assert_eq!(rig.controller.time_source(), Some(TimeSource::Host));
    assert_eq!(rig.controller.stats().clock_fallbacks, 1);
    assert!(!rig.audio.is_playing());

    rig.host.advance(200);
    assert_eq!(rig.controller.tick(), TickOutcome::Played { elapsed: 1_200 });
}

#[test]
fn narration_shorter_than_timeline_continues_on_host() {
    let mut rig = Rig::new();
    assert!(rig.controller.start());
    rig.advance(1_000);
    rig.controller.stop();

    rig.audio.set_length(400);
    rig.controller.play();
    rig.advance(390);
    assert_eq!(rig.controller.time_source(), Some(TimeSource::Audio));
    rig.host.advance(10);
    assert_eq!(rig.controller.tick(), TickOutcome::Played { elapsed: 400 });
    assert_eq!(rig.controller.time_source(), Some(TimeSource::Host));
    rig.play_to_end();
    assert_eq!(rig.controller.state(), RecorderState::Stopped);
}

#[test]
fn missing_asset_is_skipped() {
    let mut rig = Rig::new();
    record_walkthrough(&mut rig);
    rig.document.forget_asset("manual");

    rig.controller.play();
    rig.play_to_end();

    let stats = rig.controller.stats();
    assert_eq!(stats.events_skipped, 1);
    assert_eq!(stats.events_applied, 2);
    assert_eq!(rig.scene.focused_part().as_deref(), Some("Rotor"));
    assert_eq!(rig.controller.state(), RecorderState::Stopped);
}

#[test]
fn malformed_load_keeps_current_session() {
    let mut rig = Rig::new();
    record_walkthrough(&mut rig);
    let id = rig.controller.session().map(|s| s.id);

    let result = rig.controller.load_session("{ not json");
    assert!(matches!(result, Err(RecorderError::MalformedSession(_))));

    let mut broken: serde_json::Value =
        serde_json::from_str(&rig.controller.export_session().unwrap()).unwrap();
    broken["states"][1]["timestamp"] = serde_json::json!(999_999);
    let result = rig.controller.load_session(&broken.to_string());
    assert!(matches!(result, Err(RecorderError::MalformedSession(_))));

    assert_eq!(rig.controller.session().map(|s| s.id), id);
    assert_eq!(rig.controller.state(), RecorderState::Stopped);
}

#[test]
fn saved_session_loads_into_another_controller() {
    let mut rig = Rig::new();
    record_walkthrough(&mut rig);
    let mut store = MemorySessionStore::new();
    rig.controller.save_session(&mut store, "pump").unwrap();
    assert_eq!(store.list().unwrap(), vec!["recording_pump"]);

    let mut other = Rig::new();
    other.controller.load_saved(&store, "pump").unwrap();
    assert_eq!(
        other.controller.session().map(|s| s.id),
        rig.controller.session().map(|s| s.id)
    );
    assert!(matches!(
        other.controller.load_saved(&store, "missing"),
        Err(RecorderError::SessionNotFound(_))
    ));
}

#[test]
fn restore_applies_initial_state_before_playback() {
    let mut rig = Rig::new();
    rig.controller.instruments_mut().set_page(2);
    record_walkthrough(&mut rig);
    assert_eq!(rig.document.page(), 3);

    rig.controller.play();
    assert_eq!(rig.document.page(), 2);
    assert_eq!(rig.scene.focused_part(), None);
    assert_eq!(rig.scene.effect_amounts(), StateSnapshot::default().effects);
}
