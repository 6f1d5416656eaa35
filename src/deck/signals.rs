/// Visual feedback derived from the drag position
///
/// Every value here is a pure function of the horizontal offset, clamped
/// to its output range. Nothing is stored; the deck recomputes them on
/// every frame.

/// Linear interpolation of `value` from `[in_start, in_end]` onto
/// `[out_start, out_end]`, clamped to the output range
pub fn interpolate(value: f32, in_start: f32, in_end: f32, out_start: f32, out_end: f32) -> f32 {
    let span = in_end - in_start;
    if span.abs() <= f32::EPSILON || !value.is_finite() {
        return out_start;
    }
    let t = ((value - in_start) / span).clamp(0.0, 1.0);
    out_start + (out_end - out_start) * t
}

/// Card tilt in degrees: -max at one viewport width left, +max at one right
pub fn rotation_deg(dx: f32, viewport_width: f32, max_deg: f32) -> f32 {
    if dx >= 0.0 {
        interpolate(dx, 0.0, viewport_width, 0.0, max_deg)
    } else {
        -interpolate(-dx, 0.0, viewport_width, 0.0, max_deg)
    }
}

/// Scale of the card underneath, growing as the current card moves away
pub fn next_card_scale(dx: f32, viewport_width: f32, rest_scale: f32, focus_scale: f32) -> f32 {
    interpolate(dx.abs(), 0.0, viewport_width, rest_scale, focus_scale)
}

/// Opacity of the "keep" label: 0 at rest, 1 at the commit threshold
pub fn right_intent(dx: f32, threshold: f32) -> f32 {
    interpolate(dx, 0.0, threshold, 0.0, 1.0)
}

/// Opacity of the "delete" label: 0 at rest, 1 at the commit threshold
pub fn left_intent(dx: f32, threshold: f32) -> f32 {
    interpolate(-dx, 0.0, threshold, 0.0, 1.0)
}

/// Snapshot of all derived signals for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    pub rotation_deg: f32,
    pub next_card_scale: f32,
    pub left_opacity: f32,
    pub right_opacity: f32,
}
