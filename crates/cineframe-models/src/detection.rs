//! Person detection handed over by the pose-detection collaborator.
//!
//! All coordinates are in source space: top-left origin, Y increases
//! downward, normalized to [0, 1]. The flip into canvas space (bottom-left
//! origin, Y-up) happens in the simulation crate.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::{NormalizedPoint, NormalizedRect};

/// One frame's person detection result.
///
/// Every field except `has_person` is optional: the detector may report a
/// person without pose keypoints, or nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PersonDetection {
    /// Whether a person was detected in this frame
    pub has_person: bool,
    /// Person bounding box
    pub bbox: Option<NormalizedRect>,
    /// Bounding-box center
    pub center: Option<NormalizedPoint>,
    /// Bounding-box height, used to size the virtual wide shot
    pub bbox_height: Option<f64>,
    /// Detection confidence (0.0-1.0)
    pub confidence: Option<f64>,
    /// Head keypoint
    pub head: Option<NormalizedPoint>,
    /// Waist keypoint
    pub waist: Option<NormalizedPoint>,
    /// Pose estimation confidence (0.0-1.0)
    pub pose_confidence: Option<f64>,
}

impl PersonDetection {
    /// An empty detection (no person in frame).
    pub fn none() -> Self {
        Self::default()
    }

    /// Detection with a bounding box; center and height are derived.
    pub fn from_bbox(bbox: NormalizedRect, confidence: f64) -> Self {
        Self {
            has_person: true,
            bbox: Some(bbox),
            center: Some(bbox.center()),
            bbox_height: Some(bbox.height),
            confidence: Some(confidence),
            head: None,
            waist: None,
            pose_confidence: None,
        }
    }

    /// Attach head/waist keypoints to an existing detection.
    pub fn with_pose(
        mut self,
        head: NormalizedPoint,
        waist: NormalizedPoint,
        pose_confidence: f64,
    ) -> Self {
        self.head = Some(head);
        self.waist = Some(waist);
        self.pose_confidence = Some(pose_confidence);
        self
    }
}
