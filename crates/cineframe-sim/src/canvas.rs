//! Virtual canvas embedding.
//!
//! Embeds a source frame as a crop within a virtual "wide shot" canvas
//! (normalized 1.0 x 1.0) and transforms all detection coordinates from
//! source-local space into canvas space (bottom-left origin, Y-up).
//!
//! Key properties:
//!   - Zoom level is locked per video (temporal consistency)
//!   - Speaker trajectories are smooth across frames
//!   - Y-flip from source (top-left, Y-down) to canvas (bottom-left, Y-up)

use rand::Rng;
use tracing::debug;

use cineframe_models::{
    CropData, CropSource, FrameRecord, IdealCropData, KeypointData, PersonDetection, SpeakerData,
};

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::geometry::{aspect_locked_size, clamp01, crop_height_to_zoom, flip_y, round6};

/// Persistent state across frames for a single video.
///
/// Owned by exactly one embedding pass; discard at video boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasState {
    /// Virtual zoom chosen at initialization, locked for the video
    pub zoom: f64,
    /// Crop height derived from the locked zoom
    pub crop_h: f64,
    /// Crop width derived from the locked zoom
    pub crop_w: f64,
    /// Canvas X position assigned to the first detected speaker
    pub anchor_x: f64,
    /// Canvas Y position assigned to the first detected speaker (source-space convention)
    pub anchor_y: f64,
    /// Speaker center X in the anchor frame (source space)
    pub first_sx: f64,
    /// Speaker center Y in the anchor frame (source space)
    pub first_sy: f64,
}

/// Result of embedding one frame's detection into the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasEmbedding {
    /// Canvas-space speaker summary, absent without a person
    pub speaker: Option<SpeakerData>,
    /// Canvas-space keypoints, absent without a pose
    pub keypoints: Option<KeypointData>,
    /// The crop in canvas coords
    pub crop: CropData,
    /// Ground-truth label; identical to `crop` for this offline path
    pub ideal_crop: IdealCropData,
    /// State to carry into the next frame. `None` until a person has been
    /// seen: the canvas is only locked in by a real sighting, so a
    /// person-less prefix yields default crops and no canonical state.
    pub state: Option<CanvasState>,
}

impl CanvasEmbedding {
    /// Assemble the canonical frame record for this embedding.
    pub fn into_record(self, t: f64, frame_idx: u64) -> FrameRecord {
        FrameRecord {
            t,
            frame_idx,
            speaker: self.speaker,
            keypoints: self.keypoints,
            current_crop: self.crop,
            ideal_crop: self.ideal_crop,
            interpolating: false,
        }
    }
}

/// Stateless embedder; per-video state travels through [`CanvasState`].
#[derive(Debug, Clone)]
pub struct CanvasEmbedder {
    config: SimConfig,
}

impl CanvasEmbedder {
    /// Create a new embedder.
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    /// Initialize canvas state on the first frame with a detected person.
    ///
    /// Draws the speaker's target canvas occupancy and anchor position from
    /// `rng`, then locks zoom and crop size for the rest of the video.
    pub fn initialize<R: Rng>(
        &self,
        detection: &PersonDetection,
        rng: &mut R,
    ) -> SimResult<CanvasState> {
        let bbox_height = detection
            .bbox_height
            .ok_or(SimError::MissingGeometry("a bounding-box height"))?;
        let center = detection
            .center
            .ok_or(SimError::MissingGeometry("a bounding-box center"))?;

        let target_occupancy = rng
            .random_range(self.config.min_target_occupancy..=self.config.max_target_occupancy);
        let zoom = (bbox_height / target_occupancy)
            .clamp(self.config.min_virtual_zoom, self.config.max_virtual_zoom);

        let (crop_w, crop_h) = aspect_locked_size(zoom, self.config.aspect_ratio);

        let anchor_x = rng.random_range(self.config.anchor_x_min..=self.config.anchor_x_max);
        let anchor_y = rng.random_range(self.config.anchor_y_min..=self.config.anchor_y_max);

        debug!(
            zoom,
            crop_w, crop_h, anchor_x, anchor_y, "canvas initialized on first sighting"
        );

        Ok(CanvasState {
            zoom,
            crop_h,
            crop_w,
            anchor_x,
            anchor_y,
            first_sx: center.x,
            first_sy: center.y,
        })
    }

    /// Embed a frame's detection into the virtual canvas.
    ///
    /// `state` is the previous frame's canvas state (`None` before the first
    /// sighting). Returns all coordinates in canvas space, clamped to [0, 1]
    /// and rounded to 6 decimals.
    pub fn embed<R: Rng>(
        &self,
        detection: &PersonDetection,
        state: Option<CanvasState>,
        rng: &mut R,
    ) -> SimResult<CanvasEmbedding> {
        // Lock in a canvas on the first sighting
        let state = match state {
            None if detection.has_person => Some(self.initialize(detection, rng)?),
            other => other,
        };

        // No person seen yet: centered default crop, no canonical state
        let Some(state) = state else {
            return Ok(self.default_embedding());
        };

        // Crop origin in source-space canvas coords
        let (crop_x, crop_y) = self.crop_position(detection, &state);

        let speaker = build_speaker(detection, &state, crop_x, crop_y);
        let keypoints = build_keypoints(detection, &state, crop_x, crop_y);

        let crop = CropData::new(
            round6(clamp01(crop_x)),
            round6(clamp01(flip_y(crop_y + state.crop_h))),
            round6(state.crop_w),
            round6(state.crop_h),
            round6(crop_height_to_zoom(state.crop_h)),
        );
        let ideal_crop = IdealCropData::from_crop(crop, CropSource::Youtube);

        Ok(CanvasEmbedding {
            speaker,
            keypoints,
            crop,
            ideal_crop,
            state: Some(state),
        })
    }

    /// Centered default crop from the midpoint of the zoom range, emitted
    /// while no person has ever been seen.
    fn default_embedding(&self) -> CanvasEmbedding {
        let (crop_w, crop_h) = aspect_locked_size(self.config.default_zoom(), self.config.aspect_ratio);

        let crop_x = (1.0 - crop_w) / 2.0;
        let crop_y = (1.0 - crop_h) / 2.0;

        let crop = CropData::new(
            round6(crop_x),
            round6(flip_y(crop_y + crop_h)),
            round6(crop_w),
            round6(crop_h),
            round6(crop_height_to_zoom(crop_h)),
        );

        CanvasEmbedding {
            speaker: None,
            keypoints: None,
            crop,
            ideal_crop: IdealCropData::from_crop(crop, CropSource::Youtube),
            state: None,
        }
    }

    /// Compute the crop origin in source-space canvas coords.
    ///
    /// The crop tracks the speaker's displacement since the anchor frame,
    /// scaled by crop size, so the crop always shows the source frame's
    /// content and camera pursuit stays smooth without re-deriving zoom.
    fn crop_position(&self, detection: &PersonDetection, state: &CanvasState) -> (f64, f64) {
        let Some(center) = detection.center.filter(|_| detection.has_person) else {
            // No person this frame: center the crop in the canvas
            return (
                (1.0 - state.crop_w) / 2.0,
                (1.0 - state.crop_h) / 2.0,
            );
        };

        let delta_sx = center.x - state.first_sx;
        let delta_sy = center.y - state.first_sy;

        // Speaker's canvas position shifts proportionally to crop size
        let canvas_speaker_x = state.anchor_x + delta_sx * state.crop_w;
        let canvas_speaker_y = state.anchor_y + delta_sy * state.crop_h;

        // Solve crop_x + sx * crop_w = canvas_speaker_x
        let crop_x = canvas_speaker_x - center.x * state.crop_w;
        let crop_y = canvas_speaker_y - center.y * state.crop_h;

        (
            crop_x.clamp(0.0, 1.0 - state.crop_w),
            crop_y.clamp(0.0, 1.0 - state.crop_h),
        )
    }
}

/// Transform the detection bbox into canvas coords and flip to Y-up.
fn build_speaker(
    detection: &PersonDetection,
    state: &CanvasState,
    crop_x: f64,
    crop_y: f64,
) -> Option<SpeakerData> {
    if !detection.has_person {
        return None;
    }
    let bbox = detection.bbox?;

    let canvas_bx = crop_x + bbox.x * state.crop_w;
    let canvas_by = crop_y + bbox.y * state.crop_h;
    let canvas_bw = bbox.width * state.crop_w;
    let canvas_bh = bbox.height * state.crop_h;

    let cx = canvas_bx + canvas_bw / 2.0;
    let cy = canvas_by + canvas_bh / 2.0;

    // Depth proxy from canvas-space bbox height
    let z = if canvas_bh > 0.01 { 1.0 / canvas_bh } else { 0.0 };

    Some(SpeakerData {
        x: round6(clamp01(cx)),
        y: round6(clamp01(flip_y(cy))),
        z: round6(z),
        bbox: [
            round6(clamp01(canvas_bx)),
            round6(clamp01(flip_y(canvas_by + canvas_bh))),
            round6(canvas_bw),
            round6(canvas_bh),
        ],
        confidence: round6(detection.confidence.unwrap_or(0.0)),
    })
}

/// Transform head/waist keypoints into canvas coords and flip to Y-up.
fn build_keypoints(
    detection: &PersonDetection,
    state: &CanvasState,
    crop_x: f64,
    crop_y: f64,
) -> Option<KeypointData> {
    if !detection.has_person {
        return None;
    }
    let head = detection.head?;
    let waist = detection.waist?;

    Some(KeypointData {
        head_x: round6(clamp01(crop_x + head.x * state.crop_w)),
        head_y: round6(clamp01(flip_y(crop_y + head.y * state.crop_h))),
        waist_x: round6(clamp01(crop_x + waist.x * state.crop_w)),
        waist_y: round6(clamp01(flip_y(crop_y + waist.y * state.crop_h))),
        pose_confidence: round6(detection.pose_confidence.unwrap_or(0.0)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cineframe_models::{NormalizedPoint, NormalizedRect};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn detection_at(cx: f64, cy: f64) -> PersonDetection {
        PersonDetection::from_bbox(
            NormalizedRect::new(cx - 0.1, cy - 0.2, 0.2, 0.4),
            0.95,
        )
        .with_pose(
            NormalizedPoint::new(cx, cy - 0.18),
            NormalizedPoint::new(cx, cy + 0.05),
            0.9,
        )
    }

    #[test]
    fn test_initialize_within_configured_ranges() {
        let embedder = CanvasEmbedder::new(SimConfig::default());
        let mut rng = StdRng::seed_from_u64(7);

        let state = embedder
            .initialize(&detection_at(0.5, 0.5), &mut rng)
            .unwrap();

        assert!(state.zoom >= 1.5 && state.zoom <= 3.0);
        assert!(state.anchor_x >= 0.35 && state.anchor_x <= 0.65);
        assert!(state.anchor_y >= 0.30 && state.anchor_y <= 0.55);
        assert!(state.crop_w <= 1.0);
        assert!((state.first_sx - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_initialize_is_seeded_deterministic() {
        let embedder = CanvasEmbedder::new(SimConfig::default());
        let det = detection_at(0.5, 0.5);

        let a = embedder
            .initialize(&det, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let b = embedder
            .initialize(&det, &mut StdRng::seed_from_u64(42))
            .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_initialize_requires_geometry() {
        let embedder = CanvasEmbedder::new(SimConfig::default());
        let mut rng = StdRng::seed_from_u64(0);

        let bare = PersonDetection {
            has_person: true,
            ..PersonDetection::none()
        };
        let err = embedder.initialize(&bare, &mut rng).unwrap_err();
        assert!(matches!(err, SimError::MissingGeometry(_)));
    }

    #[test]
    fn test_no_person_yields_default_crop_without_state() {
        let embedder = CanvasEmbedder::new(SimConfig::default());
        let mut rng = StdRng::seed_from_u64(0);

        let embedding = embedder
            .embed(&PersonDetection::none(), None, &mut rng)
            .unwrap();

        assert!(embedding.speaker.is_none());
        assert!(embedding.keypoints.is_none());
        assert!(embedding.state.is_none());

        // Centered at the midpoint of the zoom range
        let crop = embedding.crop;
        assert!((crop.zoom - 2.25).abs() < 1e-5);
        assert!((crop.x - (1.0 - crop.w) / 2.0).abs() < 1e-5);
        assert!(crop.is_valid());
    }

    #[test]
    fn test_first_sighting_after_prefix_initializes_fresh() {
        let embedder = CanvasEmbedder::new(SimConfig::default());
        let mut rng = StdRng::seed_from_u64(3);

        let prefix = embedder
            .embed(&PersonDetection::none(), None, &mut rng)
            .unwrap();
        let sighting = embedder
            .embed(&detection_at(0.5, 0.5), prefix.state, &mut rng)
            .unwrap();

        assert!(sighting.state.is_some());
        assert!(sighting.speaker.is_some());
        assert!(sighting.keypoints.is_some());
    }

    #[test]
    fn test_zoom_locked_across_frames() {
        let embedder = CanvasEmbedder::new(SimConfig::default());
        let mut rng = StdRng::seed_from_u64(11);

        let first = embedder
            .embed(&detection_at(0.5, 0.5), None, &mut rng)
            .unwrap();
        let locked = first.state.unwrap();

        let mut state = Some(locked);
        for i in 0..50 {
            let cx = 0.2 + 0.012 * i as f64;
            let embedding = embedder
                .embed(&detection_at(cx, 0.5), state, &mut rng)
                .unwrap();
            let next = embedding.state.unwrap();
            assert_eq!(next.zoom, locked.zoom);
            assert_eq!(next.crop_w, locked.crop_w);
            assert_eq!(next.crop_h, locked.crop_h);
            assert_eq!(embedding.crop.w, round6(locked.crop_w));
            assert_eq!(embedding.crop.h, round6(locked.crop_h));
            state = embedding.state;
        }
    }

    #[test]
    fn test_crop_stays_within_canvas() {
        let embedder = CanvasEmbedder::new(SimConfig::default());
        let mut rng = StdRng::seed_from_u64(5);

        let mut state = None;
        // Drive the speaker well past both canvas edges
        for i in 0..80 {
            let cx = -0.3 + 0.02 * i as f64;
            let embedding = embedder
                .embed(&detection_at(cx.clamp(0.0, 1.0), 0.5), state, &mut rng)
                .unwrap();
            assert!(embedding.crop.is_valid(), "crop escaped canvas: {:?}", embedding.crop);
            state = embedding.state;
        }
    }

    #[test]
    fn test_crop_mirrors_source_frame_while_unclamped() {
        let mut config = SimConfig::default();
        // High zoom keeps the crop small so mid-canvas motion never clamps
        config.min_virtual_zoom = 3.0;
        config.max_virtual_zoom = 3.0;
        let embedder = CanvasEmbedder::new(config);
        let mut rng = StdRng::seed_from_u64(23);

        let first = embedder
            .embed(&detection_at(0.5, 0.5), None, &mut rng)
            .unwrap();
        let state = first.state;

        // The crop is the source frame embedded in the canvas: the speaker's
        // relative offset within the crop equals its source-frame position.
        for cx in [0.45, 0.5, 0.55, 0.6] {
            let embedding = embedder
                .embed(&detection_at(cx, 0.5), state, &mut rng)
                .unwrap();
            let speaker = embedding.speaker.unwrap();
            let rel_x = (speaker.x - embedding.crop.x) / embedding.crop.w;
            assert!(
                (rel_x - cx).abs() < 1e-4,
                "in-crop offset {rel_x} diverged from source position {cx}"
            );
        }
    }

    #[test]
    fn test_y_flip_orients_head_above_waist() {
        let embedder = CanvasEmbedder::new(SimConfig::default());
        let mut rng = StdRng::seed_from_u64(2);

        // In source space the head has the smaller Y (Y-down)
        let embedding = embedder
            .embed(&detection_at(0.5, 0.5), None, &mut rng)
            .unwrap();
        let keypoints = embedding.keypoints.unwrap();

        // In canvas space (Y-up) the head must sit above the waist
        assert!(keypoints.head_y > keypoints.waist_y);
    }

    #[test]
    fn test_missing_person_mid_video_centers_crop() {
        let embedder = CanvasEmbedder::new(SimConfig::default());
        let mut rng = StdRng::seed_from_u64(17);

        let first = embedder
            .embed(&detection_at(0.5, 0.5), None, &mut rng)
            .unwrap();
        let state = first.state;

        let gap = embedder
            .embed(&PersonDetection::none(), state, &mut rng)
            .unwrap();

        assert!(gap.speaker.is_none());
        let locked = state.unwrap();
        let expected_x = (1.0 - locked.crop_w) / 2.0;
        assert!((gap.crop.x - expected_x).abs() < 1e-5);
        // State survives the gap unchanged
        assert_eq!(gap.state.unwrap(), locked);
    }

    #[test]
    fn test_ideal_crop_matches_current() {
        let embedder = CanvasEmbedder::new(SimConfig::default());
        let mut rng = StdRng::seed_from_u64(29);

        let embedding = embedder
            .embed(&detection_at(0.4, 0.6), None, &mut rng)
            .unwrap();

        assert_eq!(embedding.ideal_crop.as_crop(), embedding.crop);
        assert_eq!(embedding.ideal_crop.source, CropSource::Youtube);
    }
}
