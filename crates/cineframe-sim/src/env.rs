//! Episode replay engine for framing control.
//!
//! Replays recorded sessions as a discrete-time control loop: a policy
//! observes speaker position + current crop and outputs pan/tilt/zoom
//! velocities. The engine is Idle until the first `reset` and Running until
//! an episode truncates; `reset` is the only way back in.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use cineframe_models::{CropData, FrameRecord};

use crate::action::Action;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::observation::{build_observation, Observation};
use crate::reward::{compute_reward, RewardContext};
use crate::session::{Session, SessionSource};

/// Episode-level details reported by `reset`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeInfo {
    pub session_id: String,
    pub episode_length: usize,
    pub source: SessionSource,
}

/// Frame-level details reported by `step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepInfo {
    pub frame_idx: u64,
    pub timestamp: f64,
}

/// Result of one control step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    /// Always false: episodes never end in failure
    pub terminated: bool,
    /// True once the sampled slice is exhausted
    pub truncated: bool,
    pub info: StepInfo,
}

/// Per-episode mutable state, fully replaced on every reset.
#[derive(Debug, Clone)]
struct EpisodeState {
    session_idx: usize,
    start: usize,
    len: usize,
    step_idx: usize,
    fps: u32,
    crop: CropData,
    prev_action: Option<Action>,
    prev_prev_action: Option<Action>,
    prev_speaker: Option<(f64, f64)>,
}

/// The framing control-loop engine.
///
/// Owns a pool of loaded sessions and a seedable RNG; every episode replays
/// a random contiguous slice of one session.
#[derive(Debug)]
pub struct FramingEnv {
    sessions: Vec<Session>,
    config: SimConfig,
    rng: StdRng,
    episode: Option<EpisodeState>,
}

impl FramingEnv {
    /// Create an engine over a pre-loaded session pool.
    ///
    /// An empty pool is a configuration error: there is nothing to replay.
    pub fn new(sessions: Vec<Session>, config: SimConfig) -> SimResult<Self> {
        if sessions.is_empty() {
            return Err(SimError::EmptySessionPool);
        }
        Ok(Self {
            sessions,
            config,
            rng: StdRng::from_os_rng(),
            episode: None,
        })
    }

    /// Create an engine by scanning `data_dirs` for sessions.
    pub fn from_dirs(data_dirs: &[std::path::PathBuf], config: SimConfig) -> SimResult<Self> {
        let sessions = crate::session::scan_sessions(data_dirs, config.min_session_frames)?;
        if sessions.is_empty() {
            return Err(SimError::NoSessionsFound(data_dirs.to_vec()));
        }
        Self::new(sessions, config)
    }

    /// The loaded session pool.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Start a new episode, replacing any episode in progress.
    ///
    /// Passing a seed reseeds the engine's RNG first, making the session,
    /// slice, and every later draw reproducible.
    pub fn reset(&mut self, seed: Option<u64>) -> (Observation, EpisodeInfo) {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        let session_idx = self.rng.random_range(0..self.sessions.len());
        let session = &self.sessions[session_idx];
        let total = session.frames.len();

        let min_len = self.config.min_episode_len.min(total);
        let max_len = total.min(self.config.max_episode_len);
        let len = self.rng.random_range(min_len..=max_len);
        let start = self.rng.random_range(0..=total - len);

        let first = &session.frames[start];
        let crop = first.current_crop;
        let prev_speaker = first.speaker.map(|s| (s.x, s.y));

        debug!(
            session = %session.session_id,
            start,
            len,
            "episode reset"
        );

        let observation = build_observation(first, &crop, 0.0, 0.0, &self.config);
        let info = EpisodeInfo {
            session_id: session.session_id.clone(),
            episode_length: len,
            source: session.source,
        };

        self.episode = Some(EpisodeState {
            session_idx,
            start,
            len,
            step_idx: 0,
            fps: session.fps,
            crop,
            prev_action: None,
            prev_prev_action: None,
            prev_speaker,
        });

        (observation, info)
    }

    /// Apply one velocity action and advance a frame.
    pub fn step(&mut self, action: Action) -> SimResult<StepOutcome> {
        let Self {
            sessions,
            config,
            episode,
            ..
        } = self;
        let ep = episode.as_mut().ok_or(SimError::NotRunning)?;
        let frames = &sessions[ep.session_idx].frames;

        let action = action.clamped();
        ep.crop = apply_action(&ep.crop, action, config);

        // Advance; the pointer saturates at the last frame of the slice
        ep.step_idx += 1;
        let truncated = ep.step_idx >= ep.len;
        if truncated {
            ep.step_idx = ep.len - 1;
        }

        let frame = &frames[ep.start + ep.step_idx];

        // Speaker velocity from consecutive positions, fps-scaled
        let (vel_x, vel_y) = match (&frame.speaker, ep.prev_speaker) {
            (Some(speaker), Some((px, py))) => (
                ((speaker.x - px) * ep.fps as f64).clamp(-1.0, 1.0),
                ((speaker.y - py) * ep.fps as f64).clamp(-1.0, 1.0),
            ),
            _ => (0.0, 0.0),
        };

        let observation = build_observation(frame, &ep.crop, vel_x, vel_y, config);
        let reward = compute_reward(&reward_context(frame, ep, action, vel_x, vel_y));

        // Shift history
        ep.prev_prev_action = ep.prev_action;
        ep.prev_action = Some(action);
        if let Some(speaker) = &frame.speaker {
            ep.prev_speaker = Some((speaker.x, speaker.y));
        }

        Ok(StepOutcome {
            observation,
            reward,
            terminated: false,
            truncated,
            info: StepInfo {
                frame_idx: frame.frame_idx,
                timestamp: frame.t,
            },
        })
    }
}

fn reward_context(
    frame: &FrameRecord,
    ep: &EpisodeState,
    action: Action,
    vel_x: f64,
    vel_y: f64,
) -> RewardContext {
    let (head_y, waist_y) = match &frame.keypoints {
        Some(kp) => (kp.head_y, kp.waist_y),
        None => (0.0, 0.0),
    };
    RewardContext {
        has_person: frame.speaker.is_some(),
        head_y,
        waist_y,
        speaker_x: frame.speaker.map_or(0.0, |s| s.x),
        crop: ep.crop,
        action,
        prev_action: ep.prev_action,
        prev_prev_action: ep.prev_prev_action,
        velocity_x: vel_x,
        velocity_y: vel_y,
    }
}

/// Apply a velocity action to a crop, enforcing zoom and canvas bounds.
///
/// Mirrors the embedder's aspect-locking rule: when the width would exceed
/// the canvas, the crop pins to `w = 1` and zoom is re-derived.
pub fn apply_action(crop: &CropData, action: Action, config: &SimConfig) -> CropData {
    let dx = action.pan as f64 * config.max_pan_speed;
    let dy = action.tilt as f64 * config.max_tilt_speed;
    let dz = action.zoom as f64 * config.max_zoom_speed;

    let mut zoom = (crop.zoom + dz).clamp(1.0, config.max_zoom);
    let mut crop_h = 1.0 / zoom;
    let mut crop_w = crop_h * config.aspect_ratio;
    if crop_w > 1.0 {
        crop_w = 1.0;
        crop_h = crop_w / config.aspect_ratio;
        zoom = 1.0 / crop_h;
    }

    let x = (crop.x + dx).clamp(0.0, 1.0 - crop_w);
    let y = (crop.y + dy).clamp(0.0, 1.0 - crop_h);

    CropData::new(x, y, crop_w, crop_h, zoom)
}
