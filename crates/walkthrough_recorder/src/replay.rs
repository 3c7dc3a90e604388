// SPDX-License-Identifier: MIT OR Apache-2.0
//! Applying recorded state back to the collaborators.
//!
//! All functions here go through the instrumented operations of the
//! adapter, so callers must hold a replay scope
//! ([`InstrumentationAdapter::replay`]) to keep playback out of the log.

use crate::error::CollaboratorError;
use crate::instrumentation::InstrumentationAdapter;
use walkthrough_timeline::{InspectAction, StateSnapshot};

/// Re-issue one discrete action
pub fn apply_action(
    adapter: &mut InstrumentationAdapter,
    action: &InspectAction,
) -> Result<(), CollaboratorError> {
    match action {
        InspectAction::FocusPart { name } => adapter.focus_part(name)?,
        InspectAction::ClearFocus => adapter.clear_focus(),
        InspectAction::ResetView => adapter.reset_view(),
        InspectAction::LoadModel { url, name } => adapter.load_model(url, name)?,
        InspectAction::SetVisibility { visibility } => adapter.set_visibility(visibility.clone()),
        InspectAction::SelectAnimation { name } => adapter.select_animation(name)?,
        InspectAction::PlayAnimation => adapter.play_animation(),
        InspectAction::PauseAnimation => adapter.pause_animation(),
        InspectAction::StopAnimation => adapter.stop_animation(),
        InspectAction::SetAnimationSpeed { speed } => adapter.set_animation_speed(*speed),
        InspectAction::SwitchAsset { asset_id } => adapter.switch_asset(asset_id)?,
        InspectAction::SetPage { page } => adapter.set_page(*page),
        InspectAction::SetZoom { zoom } => adapter.set_zoom(*zoom),
        InspectAction::CameraMoved | InspectAction::EffectsChanged => {}
    }
    Ok(())
}

/// Push the blended camera pose and effect amounts
pub fn apply_continuous(adapter: &mut InstrumentationAdapter, snapshot: &StateSnapshot) {
    adapter.set_camera_pose(snapshot.camera);
    adapter.set_effect_amounts(snapshot.effects);
}

/// Bring non-numeric fields in line with a snapshot.
///
/// Only fields that differ from the live state are touched. Every failure
/// is returned; the remaining fields are still applied.
pub fn apply_discrete_fields(
    adapter: &mut InstrumentationAdapter,
    snapshot: &StateSnapshot,
    zoom_tolerance: f32,
) -> Vec<CollaboratorError> {
    let mut failures = Vec::new();

    if let Some(model) = &snapshot.model {
        if adapter.scene().current_model().as_ref() != Some(model) {
            if let Err(err) = adapter.load_model(&model.url, &model.name) {
                failures.push(err);
            }
        }
    }

    if adapter.scene().visibility() != snapshot.visibility && !snapshot.visibility.is_empty() {
        adapter.set_visibility(snapshot.visibility.clone());
    }

    if adapter.scene().focused_part() != snapshot.focused_part {
        match &snapshot.focused_part {
            Some(name) => {
                if let Err(err) = adapter.focus_part(name) {
                    failures.push(err);
                }
            }
            None => adapter.clear_focus(),
        }
    }
    let previous = snapshot.previous_camera;
    if previous.is_some() && adapter.scene().previous_camera() != previous {
        adapter.set_previous_camera(previous);
    }

    failures.extend(apply_animation(adapter, snapshot));
    failures.extend(apply_document(adapter, snapshot, zoom_tolerance));
    failures
}

/// Restore a complete snapshot, as at the start of playback
pub fn restore(
    adapter: &mut InstrumentationAdapter,
    snapshot: &StateSnapshot,
    zoom_tolerance: f32,
) -> Vec<CollaboratorError> {
    let failures = apply_discrete_fields(adapter, snapshot, zoom_tolerance);
    adapter.set_previous_camera(snapshot.previous_camera);
    apply_continuous(adapter, snapshot);
    if snapshot.animation.selected.is_some() {
        adapter.set_animation_time(snapshot.animation.time);
    }
    failures
}

fn apply_animation(
    adapter: &mut InstrumentationAdapter,
    snapshot: &StateSnapshot,
) -> Option<CollaboratorError> {
    let wanted = &snapshot.animation;
    let live = adapter.scene().animation_state();

    if wanted.selected != live.selected {
        if let Some(name) = &wanted.selected {
            if let Err(err) = adapter.select_animation(name) {
                return Some(err);
            }
        }
    }
    if wanted.selected.is_none() {
        return None;
    }

    let live = adapter.scene().animation_state();
    if (wanted.speed - live.speed).abs() > f32::EPSILON {
        adapter.set_animation_speed(wanted.speed);
    }
    if (wanted.playing, wanted.paused) != (live.playing, live.paused) {
        if wanted.playing {
            adapter.play_animation();
        } else if wanted.paused {
            adapter.pause_animation();
        } else {
            adapter.stop_animation();
        }
    }
    None
}

fn apply_document(
    adapter: &mut InstrumentationAdapter,
    snapshot: &StateSnapshot,
    zoom_tolerance: f32,
) -> Option<CollaboratorError> {
    let wanted = &snapshot.document;
    let mut failure = None;

    if let Some(asset_id) = &wanted.asset_id {
        if adapter.document().current_asset_id().as_ref() != Some(asset_id) {
            if let Err(err) = adapter.switch_asset(asset_id) {
                failure = Some(err);
            }
        }
    }
    if failure.is_none() && adapter.document().page() != wanted.page {
        adapter.set_page(wanted.page);
    }
    if (adapter.document().zoom() - wanted.zoom).abs() > zoom_tolerance {
        adapter.set_zoom(wanted.zoom);
    }
    failure
}
