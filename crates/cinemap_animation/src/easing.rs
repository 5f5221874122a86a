//! Easing curves for camera motion
//!
//! Every curve maps normalized progress `t` in `[0, 1]` to eased progress and
//! returns exactly `0.0` at `t = 0` and `1.0` at `t = 1`. Inputs outside the
//! range are clamped first.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// Smootherstep: zero velocity and acceleration at both ends
    #[default]
    CinematicEaseInOut,
    SineInOut,
    /// Fast descent that flares out gently before touchdown
    DroneLanding,
    /// Slow build-up, strong acceleration, long soft arrival
    DramaticReveal,
    /// Ease-out that overshoots by the given amplitude and settles back
    MoveAndSettle(f64),
    /// Near-linear with softened ends, for rotational motion
    OrbitCruise,
    EaseInOutCubic,
    CubicBezier(f64, f64, f64, f64),
}

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CinematicEaseInOut => cinematic_ease_in_out(t),
            Easing::SineInOut => sine_in_out(t),
            Easing::DroneLanding => drone_landing(t),
            Easing::DramaticReveal => dramatic_reveal(t),
            Easing::MoveAndSettle(overshoot) => move_and_settle(t, *overshoot),
            Easing::OrbitCruise => orbit_cruise(t),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, *x1, *y1, *x2, *y2),
        }
    }
}

pub fn cinematic_ease_in_out(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

pub fn sine_in_out(t: f64) -> f64 {
    -((PI * t).cos() - 1.0) / 2.0
}

/// Quartic ease-out blended with a short smoothstep lead-in so the first
/// frames do not lurch.
pub fn drone_landing(t: f64) -> f64 {
    let lead = t * t * (3.0 - 2.0 * t);
    let descent = 1.0 - (1.0 - t).powi(4);
    descent * 0.85 + lead * 0.15
}

pub fn dramatic_reveal(t: f64) -> f64 {
    if t < 0.5 {
        8.0 * t.powi(4)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
    }
}

/// Back-style ease-out. `overshoot` around `1.0` gives a subtle settle; `0.0`
/// degrades to a plain cubic ease-out.
pub fn move_and_settle(t: f64, overshoot: f64) -> f64 {
    let c3 = overshoot + 1.0;
    let u = t - 1.0;
    1.0 + c3 * u * u * u + overshoot * u * u
}

pub fn orbit_cruise(t: f64) -> f64 {
    t * 0.8 + sine_in_out(t) * 0.2
}

/// Zero-mean oscillator used for breathing and micro-variation.
///
/// Completes one full period over `t` in `[0, 1]`.
pub fn gentle_pulse(t: f64, amplitude: f64) -> f64 {
    amplitude * (t * 2.0 * PI).sin()
}

/// Cubic bezier easing, same curve as CSS `cubic-bezier()`
///
/// Uses Newton-Raphson with binary-search fallback for robustness.
fn cubic_bezier_ease(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    // Endpoints are always exact
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let mut p = t;
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - t;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2);
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = t;
    for _ in 0..20 {
        let val = bezier_sample(p, x1, x2);
        if (val - t).abs() < 1e-7 {
            break;
        }
        if val < t {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2)
}

/// B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 9] = [
        Easing::Linear,
        Easing::CinematicEaseInOut,
        Easing::SineInOut,
        Easing::DroneLanding,
        Easing::DramaticReveal,
        Easing::MoveAndSettle(1.2),
        Easing::OrbitCruise,
        Easing::EaseInOutCubic,
        Easing::CubicBezier(0.25, 0.1, 0.25, 1.0),
    ];

    #[test]
    fn test_endpoints_are_exact() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-9, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-9, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        for easing in ALL {
            assert_eq!(easing.apply(-0.5), easing.apply(0.0));
            assert_eq!(easing.apply(1.5), easing.apply(1.0));
        }
    }

    #[test]
    fn test_monotonic_curves() {
        for easing in [
            Easing::CinematicEaseInOut,
            Easing::SineInOut,
            Easing::DroneLanding,
            Easing::DramaticReveal,
            Easing::OrbitCruise,
        ] {
            let mut prev = 0.0;
            for i in 1..=100 {
                let v = easing.apply(i as f64 / 100.0);
                assert!(v >= prev - 1e-12, "{easing:?} decreased at step {i}");
                prev = v;
            }
        }
    }

    #[test]
    fn test_drone_landing_front_loaded() {
        // Most of the descent happens in the first half
        assert!(drone_landing(0.5) > 0.75);
    }

    #[test]
    fn test_move_and_settle_overshoots() {
        let peak = (1..100)
            .map(|i| move_and_settle(i as f64 / 100.0, 1.5))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0);
        assert!((move_and_settle(1.0, 1.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_gentle_pulse_bounds() {
        for i in 0..=200 {
            let v = gentle_pulse(i as f64 / 37.0, 0.3);
            assert!(v.abs() <= 0.3 + 1e-12);
        }
        assert!(gentle_pulse(0.0, 0.3).abs() < 1e-12);
        assert!((gentle_pulse(0.25, 0.3) - 0.3).abs() < 1e-12);
    }
}
