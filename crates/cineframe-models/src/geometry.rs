use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A normalized point (0.0 to 1.0) within a frame or canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NormalizedPoint {
    /// X coordinate (0.0 = left, 1.0 = right)
    pub x: f64,
    /// Y coordinate; the owning coordinate space decides whether Y grows
    /// downward (source space) or upward (canvas space)
    pub y: f64,
}

impl NormalizedPoint {
    /// Create a new normalized point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A normalized rectangle (0.0 to 1.0) representing a relative region of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NormalizedRect {
    /// X coordinate of the origin corner
    pub x: f64,
    /// Y coordinate of the origin corner
    pub y: f64,
    /// Width of the rectangle (0.0 to 1.0)
    pub width: f64,
    /// Height of the rectangle (0.0 to 1.0)
    pub height: f64,
}

impl NormalizedRect {
    /// Create a new normalized rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Center x-coordinate.
    #[inline]
    pub fn cx(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Center y-coordinate.
    #[inline]
    pub fn cy(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Center of the rectangle.
    pub fn center(&self) -> NormalizedPoint {
        NormalizedPoint::new(self.cx(), self.cy())
    }

    /// Check if the rectangle is valid (within 0.0-1.0 range).
    pub fn is_valid(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= 1.001 // Allow small epsilon for float precision
            && self.y + self.height <= 1.001
    }
}
