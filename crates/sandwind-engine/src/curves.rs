//! Interpolation and easing helpers shared by the signal generator and quality controller

/// Clamp into [0, 1]
pub fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Fast start, gentle arrival
pub fn ease_out_cubic(t: f64) -> f64 {
    let inverse = 1.0 - t;
    1.0 - inverse * inverse * inverse
}

/// Gentle start and arrival, steepest in the middle
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let inverse = -2.0 * t + 2.0;
        1.0 - inverse * inverse * inverse / 2.0
    }
}

/// Map `value` from `[from_min, from_max]` onto `[to_min, to_max]`, clamped
pub fn remap_clamped(value: f64, from_min: f64, from_max: f64, to_min: f64, to_max: f64) -> f64 {
    let t = clamp01((value - from_min) / (from_max - from_min));
    to_min + (to_max - to_min) * t
}
