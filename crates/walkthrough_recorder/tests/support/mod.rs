// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared rig for recorder integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use walkthrough_recorder::{
    HeadlessDocument, HeadlessScene, PlaybackController, RecorderConfig, ScriptedAudio, TickOutcome,
};
use walkthrough_timeline::ManualClock;

/// Frame step used when advancing time
pub const FRAME_MILLIS: u64 = 10;

/// Parts every rig scene knows
pub const PARTS: [&str; 3] = ["Housing", "Rotor", "Shaft"];

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Controller wired to headless collaborators on a manual clock
pub struct Rig {
    pub host: ManualClock,
    pub scene: HeadlessScene,
    pub document: HeadlessDocument,
    pub audio: ScriptedAudio,
    pub controller: PlaybackController,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_parts([])
    }

    /// Rig whose scene also knows `extra` parts
    pub fn with_parts<const N: usize>(extra: [&str; N]) -> Self {
        init_tracing();
        let host = ManualClock::new();
        let scene = HeadlessScene::new()
            .with_parts(PARTS.into_iter().chain(extra))
            .with_clips(["Spin"]);
        let document = HeadlessDocument::new().with_assets(["manual", "datasheet"]);
        let audio = ScriptedAudio::new(Arc::new(host.clone()));
        let controller = PlaybackController::new(
            RecorderConfig::default(),
            Box::new(scene.clone()),
            Box::new(document.clone()),
            Box::new(audio.clone()),
            Arc::new(host.clone()),
        )
        .expect("default config is valid");
        Self {
            host,
            scene,
            document,
            audio,
            controller,
        }
    }

    /// Advance the clock frame by frame, ticking after each frame
    pub fn advance(&mut self, millis: u64) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();
        let mut remaining = millis;
        while remaining > 0 {
            let step = remaining.min(FRAME_MILLIS);
            self.host.advance(step);
            remaining -= step;
            outcomes.push(self.controller.tick());
        }
        outcomes
    }

    /// Tick until playback finishes, with an upper bound on frames
    pub fn play_to_end(&mut self) -> usize {
        for frame in 0..100_000 {
            self.host.advance(FRAME_MILLIS);
            if self.controller.tick() == TickOutcome::Finished {
                return frame + 1;
            }
        }
        panic!("playback did not finish");
    }
}
