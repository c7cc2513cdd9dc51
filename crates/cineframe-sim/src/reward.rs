//! Reward shaping for the framing control loop.
//!
//! Five components:
//!   1. Framing reward (+1.0): head at upper third, waist at lower third
//!   2. Jitter penalty (-0.5): penalizes jerky acceleration changes
//!   3. Head cutoff penalty (-1.0): head outside crop bounds
//!   4. Rule of thirds bonus (+0.2): horizontal compositional quality
//!   5. Anticipation bonus (+0.1): camera moves in the speaker's direction
//!
//! All functions are pure for independent testing; the total is clipped to
//! [-2.0, 1.5].

use cineframe_models::CropData;

use crate::action::Action;

/// Gaussian width for vertical framing error.
const FRAMING_SIGMA: f64 = 0.1;
/// Gaussian width for horizontal thirds placement.
const THIRDS_SIGMA: f64 = 0.05;
/// Ideal head position as a fraction of crop height from the bottom.
const HEAD_TARGET: f64 = 0.667;
/// Ideal waist position as a fraction of crop height from the bottom.
const WAIST_TARGET: f64 = 0.333;
/// Soft-penalty margin near the crop edge.
const CUTOFF_MARGIN: f64 = 0.05;
/// Reward clipping bounds.
const REWARD_MIN: f64 = -2.0;
const REWARD_MAX: f64 = 1.5;

/// Everything the reward needs for one step.
#[derive(Debug, Clone, Copy)]
pub struct RewardContext {
    /// Whether a speaker is present this frame
    pub has_person: bool,
    /// Head Y in canvas coords
    pub head_y: f64,
    /// Waist Y in canvas coords
    pub waist_y: f64,
    /// Speaker center X in canvas coords
    pub speaker_x: f64,
    /// The crop after this step's action was applied
    pub crop: CropData,
    /// This step's action
    pub action: Action,
    /// Previous action, if any
    pub prev_action: Option<Action>,
    /// Action before the previous one, if any
    pub prev_prev_action: Option<Action>,
    /// Speaker velocity X, fps-scaled and clipped to [-1, 1]
    pub velocity_x: f64,
    /// Speaker velocity Y, fps-scaled and clipped to [-1, 1]
    pub velocity_y: f64,
}

/// Reward for rule-of-thirds vertical framing.
///
/// Ideal: head at 2/3 from crop bottom, waist at 1/3. Gaussian shaping
/// keeps the gradient smooth. Returns [0.0, 1.0].
pub fn framing_reward(
    head_y: f64,
    waist_y: f64,
    crop_y: f64,
    crop_h: f64,
    has_person: bool,
) -> f64 {
    if !has_person || crop_h < 0.01 {
        return 0.0;
    }

    let head_rel = (head_y - crop_y) / crop_h;
    let waist_rel = (waist_y - crop_y) / crop_h;

    let head_error = (head_rel - HEAD_TARGET).abs();
    let waist_error = (waist_rel - WAIST_TARGET).abs();
    let error = (head_error + waist_error) / 2.0;

    gaussian(error, FRAMING_SIGMA)
}

/// Penalty for jerky camera movement (high jerk = change in acceleration).
///
/// Zero until three actions of history exist. Returns [-0.5, 0.0].
pub fn jitter_penalty(
    action: Action,
    prev_action: Option<Action>,
    prev_prev_action: Option<Action>,
) -> f64 {
    let (Some(prev), Some(prev_prev)) = (prev_action, prev_prev_action) else {
        return 0.0;
    };

    let accel_now = action.sub(prev);
    let accel_prev = prev.sub(prev_prev);
    let jerk = accel_now.sub(accel_prev).norm();

    -0.5 * (jerk / 1.0).min(1.0)
}

/// Penalty when the speaker's head is cut off or near the crop edge.
///
/// Returns [-1.0, 0.0].
pub fn head_cutoff_penalty(head_y: f64, crop_y: f64, crop_h: f64, has_person: bool) -> f64 {
    if !has_person || crop_h < 0.01 {
        return 0.0;
    }

    let head_rel = (head_y - crop_y) / crop_h;

    // Head completely outside the crop
    if !(0.0..=1.0).contains(&head_rel) {
        return -1.0;
    }

    // Soft penalty close to either edge
    let margin = head_rel.min(1.0 - head_rel);
    if margin < CUTOFF_MARGIN {
        return -0.5;
    }

    0.0
}

/// Bonus for horizontal rule-of-thirds placement.
///
/// Rewards the speaker near the 1/3 or 2/3 vertical lines. Returns [0.0, 0.2].
pub fn rule_of_thirds_bonus(speaker_x: f64, crop_x: f64, crop_w: f64, has_person: bool) -> f64 {
    if !has_person || crop_w < 0.01 {
        return 0.0;
    }

    let speaker_rel_x = (speaker_x - crop_x) / crop_w;

    let dist_left = (speaker_rel_x - WAIST_TARGET).abs();
    let dist_right = (speaker_rel_x - HEAD_TARGET).abs();
    let min_dist = dist_left.min(dist_right);

    0.2 * gaussian(min_dist, THIRDS_SIGMA)
}

/// Bonus when camera movement aligns with speaker velocity.
///
/// Rewards anticipatory tracking (moving with the speaker). Returns [0.0, 0.1].
pub fn anticipation_bonus(
    action_dx: f64,
    action_dy: f64,
    velocity_x: f64,
    velocity_y: f64,
    has_person: bool,
) -> f64 {
    if !has_person {
        return 0.0;
    }

    let speed = (velocity_x * velocity_x + velocity_y * velocity_y).sqrt();
    if speed < 0.01 {
        return 0.0;
    }

    let move_norm = (action_dx * action_dx + action_dy * action_dy).sqrt();
    if move_norm < 1e-8 {
        return 0.0;
    }

    let alignment = (action_dx * velocity_x + action_dy * velocity_y) / (move_norm * speed);
    0.1 * alignment.max(0.0)
}

/// Total reward from all components, clipped to [-2.0, 1.5].
pub fn compute_reward(ctx: &RewardContext) -> f64 {
    let mut reward = 0.0;
    reward += framing_reward(ctx.head_y, ctx.waist_y, ctx.crop.y, ctx.crop.h, ctx.has_person);
    reward += jitter_penalty(ctx.action, ctx.prev_action, ctx.prev_prev_action);
    reward += head_cutoff_penalty(ctx.head_y, ctx.crop.y, ctx.crop.h, ctx.has_person);
    reward += rule_of_thirds_bonus(ctx.speaker_x, ctx.crop.x, ctx.crop.w, ctx.has_person);
    reward += anticipation_bonus(
        ctx.action.pan as f64,
        ctx.action.tilt as f64,
        ctx.velocity_x,
        ctx.velocity_y,
        ctx.has_person,
    );
    reward.clamp(REWARD_MIN, REWARD_MAX)
}

#[inline]
fn gaussian(error: f64, sigma: f64) -> f64 {
    (-(error * error) / (2.0 * sigma * sigma)).exp()
}
