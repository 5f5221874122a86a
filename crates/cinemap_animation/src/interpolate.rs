//! Scalar and angular interpolation

/// Standard linear interpolation
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Wrap any angle in degrees into `[0, 360)`
#[inline]
pub fn normalize_bearing(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation from `from` to `to`, in `(-180, 180]`
#[inline]
pub fn bearing_delta(from: f64, to: f64) -> f64 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// Interpolate between two bearings along the shorter arc.
///
/// `lerp_bearing(350.0, 10.0, 0.5)` passes through north and returns `0.0`,
/// never `180.0`. The result is normalized into `[0, 360)`.
pub fn lerp_bearing(a: f64, b: f64, t: f64) -> f64 {
    normalize_bearing(a + bearing_delta(a, b) * t)
}
