//! Expert action derivation for imitation learning.
//!
//! Derives (observation, action) pairs from sessions that carry ideal-crop
//! labels: the expert action for frame `t` is the velocity needed to move
//! from `ideal_crop[t]` to `ideal_crop[t+1]` under the engine's speed
//! limits. Observations are built exactly like the episode engine's, so a
//! policy pre-trained on these pairs sees the same input distribution later.

use tracing::info;

use cineframe_models::{CropData, FrameRecord};

use crate::action::Action;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::observation::{build_observation, Observation};
use crate::session::Session;

/// One supervised training pair.
#[derive(Debug, Clone)]
pub struct ExpertSample {
    pub observation: Observation,
    pub action: Action,
}

/// Invert a crop transition into the velocity action that produces it.
///
/// The result is clamped to [-1, 1] per component; transitions faster than
/// the speed limits are truncated, not rejected.
pub fn derive_action(from: &CropData, to: &CropData, config: &SimConfig) -> Action {
    let pan = (to.x - from.x) / config.max_pan_speed;
    let tilt = (to.y - from.y) / config.max_tilt_speed;
    let zoom = (to.zoom - from.zoom) / config.max_zoom_speed;
    Action::new(pan as f32, tilt as f32, zoom as f32).clamped()
}

/// Expert demonstrations extracted from a session pool.
#[derive(Debug, Clone)]
pub struct ExpertDataset {
    samples: Vec<ExpertSample>,
}

impl ExpertDataset {
    /// Extract pairs from every consecutive ideal-crop transition.
    ///
    /// Zero extractable pairs is a configuration error: the sessions carry
    /// no usable demonstrations.
    pub fn from_sessions(sessions: &[Session], config: &SimConfig) -> SimResult<Self> {
        let mut samples = Vec::new();
        for session in sessions {
            extract_pairs(&session.frames, session.fps, config, &mut samples);
        }

        if samples.is_empty() {
            return Err(SimError::NoExpertPairs);
        }

        info!(
            samples = samples.len(),
            sessions = sessions.len(),
            "expert demonstrations extracted"
        );
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[ExpertSample] {
        &self.samples
    }

    pub fn get(&self, idx: usize) -> Option<&ExpertSample> {
        self.samples.get(idx)
    }
}

/// Extract (observation, action) pairs from consecutive frames.
///
/// The observation treats frame `t`'s ideal crop as the current state;
/// velocity comes from the speaker positions of frames `t-1` and `t` (zero
/// for the first frame or when either lacks a speaker).
fn extract_pairs(
    frames: &[FrameRecord],
    fps: u32,
    config: &SimConfig,
    out: &mut Vec<ExpertSample>,
) {
    for i in 0..frames.len().saturating_sub(1) {
        let frame = &frames[i];
        let next = &frames[i + 1];

        let crop = frame.ideal_crop.as_crop();
        let action = derive_action(&crop, &next.ideal_crop.as_crop(), config);

        let (vel_x, vel_y) = if i > 0 {
            match (&frames[i - 1].speaker, &frame.speaker) {
                (Some(prev), Some(curr)) => (
                    ((curr.x - prev.x) * fps as f64).clamp(-1.0, 1.0),
                    ((curr.y - prev.y) * fps as f64).clamp(-1.0, 1.0),
                ),
                _ => (0.0, 0.0),
            }
        } else {
            (0.0, 0.0)
        };

        let observation = build_observation(frame, &crop, vel_x, vel_y, config);
        out.push(ExpertSample {
            observation,
            action,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::apply_action;
    use crate::session::SessionSource;
    use cineframe_models::{CropSource, IdealCropData, SpeakerData};

    fn record(idx: u64, crop: CropData, speaker_x: f64) -> FrameRecord {
        FrameRecord {
            t: idx as f64 / 30.0,
            frame_idx: idx,
            speaker: Some(SpeakerData {
                x: speaker_x,
                y: 0.5,
                z: 2.0,
                bbox: [speaker_x - 0.1, 0.35, 0.2, 0.3],
                confidence: 0.9,
            }),
            keypoints: None,
            current_crop: crop,
            ideal_crop: IdealCropData::from_crop(crop, CropSource::Youtube),
            interpolating: false,
        }
    }

    #[test]
    fn test_derive_then_apply_reproduces_transition() {
        let config = SimConfig::default();
        let c0 = CropData::new(0.1, 0.2, 0.888889, 0.5, 2.0);
        let commanded = Action::new(0.5, -0.25, 0.8);

        let c1 = apply_action(&c0, commanded, &config);
        let derived = derive_action(&c0, &c1, &config);

        assert!((derived.pan - commanded.pan).abs() < 1e-4);
        assert!((derived.tilt - commanded.tilt).abs() < 1e-4);
        assert!((derived.zoom - commanded.zoom).abs() < 1e-4);

        let replayed = apply_action(&c0, derived, &config);
        assert!((replayed.x - c1.x).abs() < 1e-6);
        assert!((replayed.y - c1.y).abs() < 1e-6);
        assert!((replayed.zoom - c1.zoom).abs() < 1e-6);
    }

    #[test]
    fn test_derive_action_clamps_fast_transitions() {
        let config = SimConfig::default();
        let c0 = CropData::new(0.0, 0.0, 0.888889, 0.5, 2.0);
        let c1 = CropData::new(0.1, 0.1, 0.888889, 0.5, 2.0); // 5x the pan limit

        let action = derive_action(&c0, &c1, &config);
        assert_eq!(action.pan, 1.0);
        assert_eq!(action.tilt, 1.0);
        assert_eq!(action.zoom, 0.0);
    }

    #[test]
    fn test_first_sample_has_zero_velocity() {
        let config = SimConfig::default();
        let crop = CropData::new(0.1, 0.2, 0.888889, 0.5, 2.0);
        let frames: Vec<FrameRecord> = (0..5)
            .map(|i| record(i, crop, 0.3 + 0.01 * i as f64))
            .collect();
        let session = Session {
            session_id: "session_test".to_string(),
            frames,
            fps: 30,
            source: SessionSource::Youtube,
        };

        let dataset = ExpertDataset::from_sessions(&[session], &config).unwrap();
        assert_eq!(dataset.len(), 4);

        let first = dataset.get(0).unwrap();
        assert_eq!(first.observation.as_array()[13], 0.0);
        assert_eq!(first.observation.as_array()[14], 0.0);

        // Later samples see the fps-scaled speaker motion
        let second = dataset.get(1).unwrap();
        let vel_x = second.observation.as_array()[13] as f64;
        assert!((vel_x - 0.01 * 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_observation_uses_ideal_crop_as_state() {
        let config = SimConfig::default();
        let crop = CropData::new(0.15, 0.25, 0.888889, 0.5, 2.0);
        let frames: Vec<FrameRecord> = (0..2).map(|i| record(i, crop, 0.4)).collect();
        let session = Session {
            session_id: "session_test".to_string(),
            frames,
            fps: 30,
            source: SessionSource::Youtube,
        };

        let dataset = ExpertDataset::from_sessions(&[session], &config).unwrap();
        let obs = dataset.get(0).unwrap().observation;
        assert!((obs.as_array()[8] - 0.15).abs() < 1e-6);
        assert!((obs.as_array()[9] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_no_pairs_is_a_configuration_error() {
        let config = SimConfig::default();
        let err = ExpertDataset::from_sessions(&[], &config).unwrap_err();
        assert!(matches!(err, SimError::NoExpertPairs));

        // A single frame yields no transitions either
        let crop = CropData::new(0.1, 0.2, 0.888889, 0.5, 2.0);
        let session = Session {
            session_id: "session_one".to_string(),
            frames: vec![record(0, crop, 0.4)],
            fps: 30,
            source: SessionSource::Unknown,
        };
        let err = ExpertDataset::from_sessions(&[session], &config).unwrap_err();
        assert!(matches!(err, SimError::NoExpertPairs));
    }
}
