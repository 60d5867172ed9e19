/// Symmetric quadratic ease-in-out over `[0, 1]`.
pub fn ease_in_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * 0.5
    }
}

/// Normalised position of `value` inside `[start, end]`, clamped.
pub fn window_progress(value: f32, start: f32, end: f32) -> f32 {
    if end <= start {
        return if value >= end { 1.0 } else { 0.0 };
    }
    ((value - start) / (end - start)).clamp(0.0, 1.0)
}

/// Scale bump that peaks mid-way and is exactly 1 at both ends.
pub fn pulse(t: f32, amount: f32) -> f32 {
    if t <= 0.0 || t >= 1.0 {
        return 1.0;
    }
    1.0 + amount * (std::f32::consts::PI * t).sin()
}
