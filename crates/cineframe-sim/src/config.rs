//! Configuration for the framing simulation.

use serde::{Deserialize, Serialize};

/// Configuration shared by the canvas embedder and the episode engine.
///
/// The action limits mirror the on-device shot composer's crop clamping, so
/// a policy trained in this simulation transfers without retuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    // === Canvas Embedding ===
    /// Output aspect ratio width/height (default: 16/9)
    pub aspect_ratio: f64,

    /// Minimum virtual zoom assigned to a wide shot (default: 1.5)
    pub min_virtual_zoom: f64,

    /// Maximum virtual zoom assigned to a wide shot (default: 3.0)
    pub max_virtual_zoom: f64,

    /// Lower bound for the speaker's canvas-height occupancy draw (default: 0.12)
    pub min_target_occupancy: f64,

    /// Upper bound for the speaker's canvas-height occupancy draw (default: 0.22)
    pub max_target_occupancy: f64,

    /// Lower bound for the anchor X draw (default: 0.35)
    pub anchor_x_min: f64,

    /// Upper bound for the anchor X draw (default: 0.65)
    pub anchor_x_max: f64,

    /// Lower bound for the anchor Y draw (default: 0.30)
    pub anchor_y_min: f64,

    /// Upper bound for the anchor Y draw (default: 0.55)
    pub anchor_y_max: f64,

    // === Action Limits (per frame) ===
    /// Maximum pan speed as a fraction of canvas width (default: 0.02)
    pub max_pan_speed: f64,

    /// Maximum tilt speed as a fraction of canvas height (default: 0.02)
    pub max_tilt_speed: f64,

    /// Maximum zoom change per frame (default: 0.05)
    pub max_zoom_speed: f64,

    // === Crop Constraints ===
    /// Maximum zoom factor (default: 4.0)
    pub max_zoom: f64,

    /// Minimum crop height, 1.0 / max_zoom (default: 0.25)
    pub min_crop_h: f64,

    // === Episode Sampling ===
    /// Minimum episode length in frames (default: 60)
    pub min_episode_len: usize,

    /// Maximum episode length in frames (default: 900)
    pub max_episode_len: usize,

    /// Minimum frames a session needs to enter the pool (default: 30)
    pub min_session_frames: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // Canvas embedding - a speaker fills 12-22% of a realistic wide shot
            aspect_ratio: 16.0 / 9.0,
            min_virtual_zoom: 1.5,
            max_virtual_zoom: 3.0,
            min_target_occupancy: 0.12,
            max_target_occupancy: 0.22,
            anchor_x_min: 0.35,
            anchor_x_max: 0.65,
            anchor_y_min: 0.30,
            anchor_y_max: 0.55,

            // Action limits - 2% pan/tilt and 5% zoom per frame
            max_pan_speed: 0.02,
            max_tilt_speed: 0.02,
            max_zoom_speed: 0.05,

            // Crop constraints
            max_zoom: 4.0,
            min_crop_h: 0.25,

            // Episode sampling
            min_episode_len: 60,
            max_episode_len: 900,
            min_session_frames: 30,
        }
    }
}

impl SimConfig {
    /// Midpoint of the virtual zoom range, used for the person-less default crop.
    pub fn default_zoom(&self) -> f64 {
        (self.min_virtual_zoom + self.max_virtual_zoom) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_consistent() {
        let config = SimConfig::default();
        assert!((config.min_crop_h - 1.0 / config.max_zoom).abs() < 1e-9);
        assert!(config.min_virtual_zoom < config.max_virtual_zoom);
        assert!(config.min_episode_len <= config.max_episode_len);
        assert!((config.default_zoom() - 2.25).abs() < 1e-9);
    }
}
