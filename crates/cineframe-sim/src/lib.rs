//! Deterministic camera-framing simulation core.
//!
//! This crate turns recorded pose detections into a training signal for an
//! automatic framing controller:
//!
//! 1. The canvas embedder projects per-frame detections into a persistent,
//!    zoom-locked virtual "wide shot" canvas
//! 2. The episode engine replays the resulting frame records as a control
//!    loop with velocity actions, observations, and shaped rewards
//! 3. Expert action derivation inverts consecutive ground-truth crops into
//!    supervision pairs for imitation learning
//!
//! # Architecture
//!
//! ```text
//! Pose Detections (source space, Y-down)
//!     │
//!     ▼
//! ┌──────────────────┐
//! │  CanvasEmbedder  │ ← lock zoom/anchor, flip to Y-up canvas space
//! └────────┬─────────┘
//!          │  FrameRecord (canonical, serialized one per JSONL line)
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │   FramingEnv     │     │  ExpertDataset   │
//! │  reset / step    │     │  derive_action   │
//! └────────┬─────────┘     └────────┬─────────┘
//!          │                        │
//!          ▼                        ▼
//!   Observation + reward     (obs, action) pairs
//! ```
//!
//! Everything is single-threaded and synchronous; the only source of
//! non-determinism is a seedable RNG owned by the caller (embedding) or the
//! engine (episode sampling).

pub mod action;
pub mod canvas;
pub mod config;
pub mod env;
pub mod error;
pub mod expert;
pub mod geometry;
pub mod observation;
pub mod reward;
pub mod session;

pub use action::Action;
pub use canvas::{CanvasEmbedder, CanvasEmbedding, CanvasState};
pub use config::SimConfig;
pub use env::{apply_action, EpisodeInfo, FramingEnv, StepInfo, StepOutcome};
pub use error::{SimError, SimResult};
pub use expert::{derive_action, ExpertDataset, ExpertSample};
pub use observation::{build_observation, Observation, OBS_DIM};
pub use reward::{
    anticipation_bonus, compute_reward, framing_reward, head_cutoff_penalty, jitter_penalty,
    rule_of_thirds_bonus, RewardContext,
};
pub use session::{scan_sessions, Session, SessionSource};
