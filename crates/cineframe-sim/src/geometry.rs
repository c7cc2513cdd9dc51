//! Coordinate math shared by the canvas embedder and the episode engine.
//!
//! Source detections arrive in top-left/Y-down space; the canvas and every
//! serialized record use bottom-left/Y-up space. The flip, the clamps, and
//! the zoom/height conversions all live here so both sides of the pipeline
//! agree on them.

/// Convert between Y-down (source) and Y-up (canvas) conventions.
#[inline]
pub fn flip_y(y: f64) -> f64 {
    1.0 - y
}

/// Clamp a value to [0, 1].
#[inline]
pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Round to 6 decimal digits for serialization stability.
#[inline]
pub fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Crop height for a zoom factor.
#[inline]
pub fn zoom_to_crop_height(zoom: f64) -> f64 {
    1.0 / zoom
}

/// Zoom factor for a crop height; degenerate heights map to zoom 1.
#[inline]
pub fn crop_height_to_zoom(crop_h: f64) -> f64 {
    if crop_h > 0.01 {
        1.0 / crop_h
    } else {
        1.0
    }
}

/// Crop size (width, height) for a zoom factor at a fixed aspect ratio.
///
/// The width is capped at the canvas; when that cap binds, the height is
/// re-derived from `w = 1` so the aspect ratio is preserved.
pub fn aspect_locked_size(zoom: f64, aspect_ratio: f64) -> (f64, f64) {
    let mut crop_h = zoom_to_crop_height(zoom);
    let mut crop_w = crop_h * aspect_ratio;
    if crop_w > 1.0 {
        crop_w = 1.0;
        crop_h = crop_w / aspect_ratio;
    }
    (crop_w, crop_h)
}
