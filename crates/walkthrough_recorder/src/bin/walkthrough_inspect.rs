// SPDX-License-Identifier: MIT OR Apache-2.0
//! Inspect a saved walkthrough session.
//!
//! Usage: `walkthrough_inspect <session.json> [--replay] [--config <recorder.ron>]`
//!
//! Prints the timeline summary and, with `--replay`, plays the session
//! against headless collaborators to check that every event still applies.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use walkthrough_recorder::{
    HeadlessDocument, HeadlessScene, NoAudio, PlaybackController, RecorderConfig, RecorderError,
    TickOutcome,
};
use walkthrough_timeline::{InspectAction, ManualClock, RecordedSession};

/// Inspect a saved walkthrough session
#[derive(Parser, Debug)]
#[command(name = "walkthrough_inspect")]
#[command(version, about, long_about = None)]
struct Args {
    /// Session JSON file to inspect
    session: PathBuf,

    /// Replay the session against headless collaborators
    #[arg(long)]
    replay: bool,

    /// Recorder config (RON) used for the replay
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("walkthrough_recorder=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(&args) {
        tracing::error!("Inspection failed: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), RecorderError> {
    let config = match &args.config {
        Some(path) => RecorderConfig::load(path)?,
        None => RecorderConfig::default(),
    };
    let json = std::fs::read_to_string(&args.session)?;
    let session = RecordedSession::from_json(&json)?;
    print_summary(&session);

    if args.replay {
        replay(config, &session, &json)?;
    }
    Ok(())
}

fn print_summary(session: &RecordedSession) {
    println!("session   {}", session.id);
    println!("created   {}", session.created_at().to_rfc3339());
    println!("duration  {} ms", session.duration_millis());
    println!(
        "narration {}",
        session.audio_track().map_or("none", |t| t.as_str())
    );
    println!("entries   {} ({} events)", session.len(), session.discrete_count());
    for entry in session.events() {
        if let Some(action) = entry.action() {
            println!("  {:>8} ms  {}", entry.timestamp, action.event_type());
        }
    }
}

/// Headless collaborators that know every part, clip and asset the
/// session refers to
fn collaborators_for(session: &RecordedSession) -> (HeadlessScene, HeadlessDocument) {
    let initial = session.initial_state();
    let mut parts: Vec<String> = initial.visibility.keys().cloned().collect();
    let mut clips = Vec::new();
    let mut assets = Vec::new();
    for entry in session.events() {
        parts.extend(entry.snapshot.visibility.keys().cloned());
        parts.extend(entry.snapshot.focused_part.clone());
        clips.extend(entry.snapshot.animation.selected.clone());
        assets.extend(entry.snapshot.document.asset_id.clone());
        match entry.action() {
            Some(InspectAction::FocusPart { name }) => parts.push(name.clone()),
            Some(InspectAction::SelectAnimation { name }) => clips.push(name.clone()),
            Some(InspectAction::SwitchAsset { asset_id }) => assets.push(asset_id.clone()),
            _ => {}
        }
    }
    parts.sort();
    parts.dedup();
    (
        HeadlessScene::new().with_parts(parts).with_clips(clips),
        HeadlessDocument::new().with_assets(assets),
    )
}

fn replay(config: RecorderConfig, session: &RecordedSession, json: &str) -> Result<(), RecorderError> {
    let step = config.state_interval_millis();
    let host = ManualClock::new();
    let (scene, document) = collaborators_for(session);
    let mut controller = PlaybackController::new(
        config,
        Box::new(scene),
        Box::new(document),
        Box::new(NoAudio),
        Arc::new(host.clone()),
    )?;
    controller.load_session(json)?;
    controller.play();

    let limit = session.duration_millis() / step + 2;
    for _ in 0..limit {
        host.advance(step);
        if controller.tick() == TickOutcome::Finished {
            break;
        }
    }

    let stats = controller.stats();
    println!(
        "replay    {} ticks, {} events applied, {} skipped",
        stats.ticks, stats.events_applied, stats.events_skipped
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_parses_session_and_flags() {
        let args = Args::try_parse_from([
            "walkthrough_inspect",
            "tour.json",
            "--replay",
            "--config",
            "recorder.ron",
        ])
        .unwrap();
        assert_eq!(args.session, PathBuf::from("tour.json"));
        assert!(args.replay);
        assert_eq!(args.config, Some(PathBuf::from("recorder.ron")));
    }

    #[test]
    fn test_help_is_not_a_session_path() {
        let err = Args::try_parse_from(["walkthrough_inspect", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_config_requires_a_value() {
        let err = Args::try_parse_from(["walkthrough_inspect", "tour.json", "--config"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_session_is_required() {
        let err = Args::try_parse_from(["walkthrough_inspect", "--replay"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
