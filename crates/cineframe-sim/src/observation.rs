//! The fixed-shape observation vector handed to a framing policy.

use cineframe_models::{CropData, FrameRecord};

use crate::config::SimConfig;

/// Number of elements in an observation.
pub const OBS_DIM: usize = 18;

/// An 18-element observation: speaker state + crop state + velocity.
///
/// Layout (order-significant):
/// `[has_person, speaker_x, speaker_y, speaker_z_norm, head_x, head_y,
/// waist_x, waist_y, crop_x, crop_y, crop_w, crop_h, zoom_norm, vel_x,
/// vel_y, head_rel_y, waist_rel_y, pose_confidence]`.
///
/// Every element is finite: NaN maps to 0, +∞ to 1, -∞ to -1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation(pub [f32; OBS_DIM]);

impl Observation {
    /// The raw element array.
    pub fn as_array(&self) -> &[f32; OBS_DIM] {
        &self.0
    }

    /// Whether a speaker was present when this observation was built.
    pub fn has_person(&self) -> bool {
        self.0[0] > 0.5
    }
}

impl AsRef<[f32]> for Observation {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Build the observation for one frame from the engine-held crop state and
/// the fps-scaled speaker velocity.
///
/// Mirrors the expert-pair extraction so both paths feed the policy
/// identically distributed inputs.
pub fn build_observation(
    frame: &FrameRecord,
    crop: &CropData,
    vel_x: f64,
    vel_y: f64,
    config: &SimConfig,
) -> Observation {
    let has_person = frame.speaker.is_some();

    let (sp_x, sp_y, sp_z) = match &frame.speaker {
        Some(speaker) => (speaker.x, speaker.y, (speaker.z / 10.0).min(1.0)),
        None => (0.0, 0.0, 0.0),
    };

    let (head_x, head_y, waist_x, waist_y, pose_conf) = match &frame.keypoints {
        Some(kp) => (kp.head_x, kp.head_y, kp.waist_x, kp.waist_y, kp.pose_confidence),
        None => (0.0, 0.0, 0.0, 0.0, 0.0),
    };

    let zoom_norm = (crop.zoom / config.max_zoom).min(1.0);

    // Relative vertical positions within the crop
    let (head_rel_y, waist_rel_y) = if crop.h > 0.01 && has_person {
        (
            ((head_y - crop.y) / crop.h).clamp(0.0, 1.0),
            ((waist_y - crop.y) / crop.h).clamp(0.0, 1.0),
        )
    } else {
        (0.0, 0.0)
    };

    let values = [
        if has_person { 1.0 } else { 0.0 },
        sp_x,
        sp_y,
        sp_z,
        head_x,
        head_y,
        waist_x,
        waist_y,
        crop.x,
        crop.y,
        crop.w,
        crop.h,
        zoom_norm,
        vel_x,
        vel_y,
        head_rel_y,
        waist_rel_y,
        pose_conf,
    ];

    let mut sanitized = [0.0f32; OBS_DIM];
    for (out, value) in sanitized.iter_mut().zip(values) {
        *out = sanitize(value as f32);
    }
    Observation(sanitized)
}

/// Replace non-finite values: NaN -> 0, +inf -> 1, -inf -> -1.
#[inline]
fn sanitize(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else if value == f32::INFINITY {
        1.0
    } else if value == f32::NEG_INFINITY {
        -1.0
    } else {
        value
    }
}
