//! Canonical per-frame record schema for session logs.
//!
//! One `FrameRecord` is serialized per line of a session's `frames.jsonl`.
//! All coordinates are in canvas space (bottom-left origin, Y-up, 0-1
//! normalized) and rounded to 6 decimals by the producer; `z` and `zoom` are
//! unbounded positive reals.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Canvas-space speaker summary for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpeakerData {
    /// Bounding-box center X (0-1)
    pub x: f64,
    /// Bounding-box center Y (0-1, Y-up)
    pub y: f64,
    /// Depth proxy = 1.0 / bbox height (0 when unavailable)
    pub z: f64,
    /// `[origin_x, origin_y, width, height]` in canvas coords
    pub bbox: [f64; 4],
    /// Detection confidence (0.0-1.0)
    pub confidence: f64,
}

/// Canvas-space head/waist keypoints for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeypointData {
    pub head_x: f64,
    /// Head Y in canvas coords (Y-up)
    pub head_y: f64,
    pub waist_x: f64,
    /// Waist Y in canvas coords (Y-up)
    pub waist_y: f64,
    /// Pose estimation confidence (0.0-1.0)
    pub pose_confidence: f64,
}

/// A crop rectangle within the canvas.
///
/// Invariants: `0 <= x <= 1-w`, `0 <= y <= 1-h`, `zoom = 1/h`, and
/// `w = h * 16/9` unless clamped to `w = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CropData {
    /// Crop origin X
    pub x: f64,
    /// Crop origin Y (canvas coords, Y-up)
    pub y: f64,
    /// Crop width
    pub w: f64,
    /// Crop height
    pub h: f64,
    /// Zoom factor, 1.0 / h
    pub zoom: f64,
}

impl CropData {
    /// Create a new crop rectangle.
    pub fn new(x: f64, y: f64, w: f64, h: f64, zoom: f64) -> Self {
        Self { x, y, w, h, zoom }
    }

    /// A full-canvas crop at zoom 1.
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0, 1.0)
    }

    /// Check that the crop lies within the canvas.
    pub fn is_valid(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.w > 0.0
            && self.h > 0.0
            && self.x + self.w <= 1.001 // Allow small epsilon for float precision
            && self.y + self.h <= 1.001
    }
}

/// Provenance of an ideal (ground-truth) crop label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CropSource {
    /// Produced by the on-device auto composer
    Auto,
    /// Hand-labeled by an operator
    Manual,
    /// Extracted from a reference YouTube clip
    Youtube,
}

/// Error returned when parsing a [`CropSource`] from a string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown crop source: {0}")]
pub struct ParseSourceError(pub String);

impl FromStr for CropSource {
    type Err = ParseSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(CropSource::Auto),
            "manual" => Ok(CropSource::Manual),
            "youtube" => Ok(CropSource::Youtube),
            other => Err(ParseSourceError(other.to_string())),
        }
    }
}

impl fmt::Display for CropSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CropSource::Auto => "auto",
            CropSource::Manual => "manual",
            CropSource::Youtube => "youtube",
        };
        write!(f, "{s}")
    }
}

/// A ground-truth crop label with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IdealCropData {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub zoom: f64,
    /// Where this label came from
    pub source: CropSource,
}

impl IdealCropData {
    /// Create an ideal crop from a crop rectangle and a provenance tag.
    pub fn from_crop(crop: CropData, source: CropSource) -> Self {
        Self {
            x: crop.x,
            y: crop.y,
            w: crop.w,
            h: crop.h,
            zoom: crop.zoom,
            source,
        }
    }

    /// The geometric part of the label.
    pub fn as_crop(&self) -> CropData {
        CropData::new(self.x, self.y, self.w, self.h, self.zoom)
    }
}

/// One timestamped sample of a session log.
///
/// This is the canonical unit consumed by both the episode engine and the
/// expert action derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameRecord {
    /// Timestamp in seconds from session start
    pub t: f64,
    /// Source frame index
    pub frame_idx: u64,
    /// Speaker summary, absent when no person was detected
    #[serde(default)]
    pub speaker: Option<SpeakerData>,
    /// Head/waist keypoints, absent without a pose estimate
    #[serde(default)]
    pub keypoints: Option<KeypointData>,
    /// The crop that was actually framed at this instant
    pub current_crop: CropData,
    /// The ground-truth crop label
    pub ideal_crop: IdealCropData,
    /// Whether this record was interpolated between real samples
    #[serde(default)]
    pub interpolating: bool,
}
