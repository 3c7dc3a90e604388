// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recorder configuration.
//!
//! Sampling cadences and change tolerances default to the values the
//! viewer has always used. Settings live in a RON file next to the
//! recordings.

use crate::error::{RecorderError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "recorder.ron";

/// Recording and playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// General state samples per second
    pub state_sample_hz: f32,
    /// Camera pose samples per second
    pub camera_sample_hz: f32,
    /// Minimum change of a numeric field that counts as a change
    pub change_tolerance: f32,
    /// Minimum zoom difference pushed to the document viewer on replay
    pub zoom_tolerance: f32,
    /// Key prefix for stored sessions
    pub storage_prefix: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            state_sample_hz: 60.0,
            camera_sample_hz: 30.0,
            change_tolerance: 0.01,
            zoom_tolerance: 0.01,
            storage_prefix: "recording_".to_string(),
        }
    }
}

impl RecorderConfig {
    /// Interval between general state samples, rounded to whole
    /// milliseconds. The sampler itself keeps the exact rate.
    pub fn state_interval_millis(&self) -> u64 {
        interval_millis(self.state_sample_hz)
    }

    /// Interval between camera samples, rounded like
    /// [`state_interval_millis`](Self::state_interval_millis)
    pub fn camera_interval_millis(&self) -> u64 {
        interval_millis(self.camera_sample_hz)
    }

    /// Storage key for a session name
    pub fn storage_key(&self, name: &str) -> String {
        format!("{}{}", self.storage_prefix, name)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let positive = |hz: f32| hz.is_finite() && hz > 0.0;
        if !positive(self.state_sample_hz) || !positive(self.camera_sample_hz) {
            return Err(RecorderError::InvalidConfig(
                "sample rates must be positive".to_string(),
            ));
        }
        let non_negative = |t: f32| t.is_finite() && t >= 0.0;
        if !non_negative(self.change_tolerance) || !non_negative(self.zoom_tolerance) {
            return Err(RecorderError::InvalidConfig(
                "tolerances must be finite and not negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RecorderConfig = ron::from_str(&content)?;
        config.validate()?;
        tracing::debug!("Loaded recorder config from {:?}", path);
        Ok(config)
    }

    /// Save to a RON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let pretty = ron::ser::PrettyConfig::default()
            .depth_limit(2)
            .separate_tuple_members(true);
        let content = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Config file path inside a recordings directory
    pub fn file_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }
}

fn interval_millis(hz: f32) -> u64 {
    ((1000.0 / hz).round() as u64).max(1)
}
