//! Session metadata written alongside each session's frame log.
//!
//! A session directory holds `frames.jsonl` (one [`FrameRecord`] per line)
//! and `metadata.json` (one [`SessionMetadata`] document). Field names use
//! snake_case to match the recorder's encoder configuration.
//!
//! [`FrameRecord`]: crate::record::FrameRecord

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output resolution of the recorded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Shot-composer settings active while the session was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ComposerConfig {
    #[serde(default)]
    pub deadzone_threshold: f64,
    #[serde(default)]
    pub horizontal_padding: f64,
    #[serde(default)]
    pub smoothing_factor: f64,
    #[serde(default)]
    pub use_rule_of_thirds: bool,
}

/// Detector settings active while the session was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectorConfig {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default)]
    pub high_accuracy: bool,
    #[serde(default = "default_max_persons")]
    pub max_persons: u32,
}

fn default_confidence_threshold() -> f64 {
    0.5
}

fn default_max_persons() -> u32 {
    1
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            high_accuracy: false,
            max_persons: default_max_persons(),
        }
    }
}

/// Metadata document for one recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionMetadata {
    pub session_id: String,
    /// ISO 8601 recording start
    pub start_time: DateTime<Utc>,
    /// ISO 8601 recording end, absent for truncated recordings
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub total_frames: Option<u64>,
    /// Frames per second of the recording
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub resolution: Resolution,
    /// Camera or source-video name
    #[serde(default)]
    pub camera_name: String,
    /// Labeling provenance, e.g. "auto", "manual", or "youtube"
    #[serde(default)]
    pub label_source: String,
    #[serde(default)]
    pub composer_config: ComposerConfig,
    #[serde(default)]
    pub detector_config: DetectorConfig,
}

fn default_fps() -> u32 {
    30
}
