//! Camera path geometry
//!
//! Paths are ordered `(lng, lat)` waypoints treated as a planar polyline in
//! degrees. A path parameter `t` in `[0, 1]` indexes waypoints uniformly
//! (`t = 0.5` on a 5-point path is waypoint 2); [`reparameterize`] converts
//! time progress into a `t` that advances at constant traveled distance.
//!
//! Functions accept any slice. Fewer than two points degrade gracefully:
//! an empty path evaluates to the origin, a single point to itself.

use cinemap_core::{LngLat, METERS_PER_DEGREE};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::f64::consts::TAU;

use crate::interpolate::{bearing_delta, normalize_bearing};

/// Banking degrees per unit of curvature (radians turned per degree traveled)
pub const BANKING_SCALE: f64 = 0.01;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Which side of the travel direction an offset path lies on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetSide {
    #[default]
    Left,
    Right,
}

impl OffsetSide {
    fn sign(self) -> f64 {
        match self {
            OffsetSide::Left => 1.0,
            OffsetSide::Right => -1.0,
        }
    }
}

/// Cumulative distance at each waypoint
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArcLengthTable {
    cumulative: Vec<f64>,
}

impl ArcLengthTable {
    /// Total path length in degrees
    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Distance from the start to waypoint `index`
    pub fn at(&self, index: usize) -> Option<f64> {
        self.cumulative.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }
}

// ============================================================================
// Distance and bearing
// ============================================================================

/// Planar distance in degrees
pub fn calculate_distance(from: LngLat, to: LngLat) -> f64 {
    let dx = to.lng - from.lng;
    let dy = to.lat - from.lat;
    (dx * dx + dy * dy).sqrt()
}

/// Planar distance converted to meters for display
pub fn distance_meters(from: LngLat, to: LngLat) -> f64 {
    calculate_distance(from, to) * METERS_PER_DEGREE
}

/// Great-circle distance in meters
pub fn haversine_meters(from: LngLat, to: LngLat) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let d_phi = (to.lat - from.lat).to_radians();
    let d_lambda = (to.lng - from.lng).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial great-circle bearing from `from` to `to`, in `[0, 360)`
pub fn calculate_bearing(from: LngLat, to: LngLat) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let d_lambda = (to.lng - from.lng).to_radians();
    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
    normalize_bearing(y.atan2(x).to_degrees())
}

/// A point `radius` degrees from `center` in compass direction `bearing`.
///
/// Longitude is stretched by latitude so circles stay round on screen.
pub fn point_on_circle(center: LngLat, radius: f64, bearing: f64) -> LngLat {
    let b = bearing.to_radians();
    let lat_scale = center.lat.to_radians().cos().max(0.01);
    LngLat {
        lng: center.lng + radius * b.sin() / lat_scale,
        lat: center.lat + radius * b.cos(),
    }
}

// ============================================================================
// Simplification and offsetting
// ============================================================================

/// Perpendicular distance from `p` to the segment `a`–`b`
fn segment_distance(p: LngLat, a: LngLat, b: LngLat) -> f64 {
    let dx = b.lng - a.lng;
    let dy = b.lat - a.lat;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return calculate_distance(p, a);
    }
    let u = (((p.lng - a.lng) * dx + (p.lat - a.lat) * dy) / len_sq).clamp(0.0, 1.0);
    calculate_distance(p, LngLat::new(a.lng + u * dx, a.lat + u * dy))
}

/// Drop waypoints that lie within `tolerance` of the line through their kept
/// neighbours (Ramer–Douglas–Peucker).
///
/// The first and last points are always kept exactly, and every removed point
/// is within `tolerance` of the simplified polyline.
pub fn simplify_path(points: &[LngLat], tolerance: f64) -> Vec<LngLat> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack: SmallVec<[(usize, usize); 32]> = SmallVec::new();
    stack.push((0, last));

    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let mut worst = 0.0;
        let mut worst_index = start;
        for i in start + 1..end {
            let d = segment_distance(points[i], points[start], points[end]);
            if d > worst {
                worst = d;
                worst_index = i;
            }
        }
        if worst > tolerance {
            keep[worst_index] = true;
            stack.push((start, worst_index));
            stack.push((worst_index, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// A copy of `path` shifted sideways by `distance` degrees.
///
/// Each point moves along the normal of the direction between its neighbours,
/// so corners are mitred rather than split.
pub fn create_offset_path(path: &[LngLat], distance: f64, side: OffsetSide) -> Vec<LngLat> {
    if path.len() < 2 || distance == 0.0 {
        return path.to_vec();
    }
    let last = path.len() - 1;
    let sign = side.sign();

    (0..path.len())
        .map(|i| {
            let prev = path[i.saturating_sub(1)];
            let next = path[(i + 1).min(last)];
            let dx = next.lng - prev.lng;
            let dy = next.lat - prev.lat;
            let len = (dx * dx + dy * dy).sqrt();
            if len == 0.0 {
                return path[i];
            }
            // Left normal of (dx, dy)
            let nx = -dy / len;
            let ny = dx / len;
            LngLat {
                lng: path[i].lng + nx * distance * sign,
                lat: path[i].lat + ny * distance * sign,
            }
        })
        .collect()
}

// ============================================================================
// Arc length
// ============================================================================

pub fn create_arc_length_table(path: &[LngLat]) -> ArcLengthTable {
    let mut cumulative = Vec::with_capacity(path.len());
    let mut total = 0.0;
    for (i, point) in path.iter().enumerate() {
        if i > 0 {
            total += calculate_distance(path[i - 1], *point);
        }
        cumulative.push(total);
    }
    ArcLengthTable { cumulative }
}

pub fn get_arc_length(path: &[LngLat]) -> f64 {
    path.windows(2)
        .map(|w| calculate_distance(w[0], w[1]))
        .sum()
}

/// Map time progress to the path parameter that has covered the same
/// fraction of the path's length.
///
/// Monotonic non-decreasing in `progress`. A zero-length path falls back to
/// index parameterization.
pub fn reparameterize(table: &ArcLengthTable, progress: f64) -> f64 {
    let progress = progress.clamp(0.0, 1.0);
    let total = table.total();
    let n = table.cumulative.len();
    if n < 2 || total <= 0.0 {
        return progress;
    }

    let target = progress * total;
    let idx = table.cumulative.partition_point(|&d| d < target);
    if idx == 0 {
        return 0.0;
    }
    if idx >= n {
        return 1.0;
    }

    let seg = idx - 1;
    let seg_start = table.cumulative[seg];
    let seg_len = table.cumulative[idx] - seg_start;
    let frac = if seg_len > 0.0 {
        (target - seg_start) / seg_len
    } else {
        0.0
    };
    (seg as f64 + frac) / (n - 1) as f64
}

/// The leading part of `path` that covers `fraction` of its length.
///
/// Ends on an interpolated point, so the slice grows smoothly frame to frame.
/// `table` must have been built from `path`.
pub fn slice_by_length(path: &[LngLat], table: &ArcLengthTable, fraction: f64) -> Vec<LngLat> {
    if path.len() < 2 {
        return path.to_vec();
    }
    let target = fraction.clamp(0.0, 1.0) * table.total();
    let mut slice = Vec::with_capacity(path.len());
    for (i, (point, &distance)) in path.iter().zip(&table.cumulative).enumerate() {
        if distance <= target {
            slice.push(*point);
            continue;
        }
        if i == 0 {
            // Only reachable with a non-finite table
            break;
        }
        let prev = table.cumulative[i - 1];
        let frac = (target - prev) / (distance - prev);
        slice.push(path[i - 1].lerp(*point, frac));
        break;
    }
    slice
}

// ============================================================================
// Evaluation
// ============================================================================

/// Segment index and local fraction for parameter `t`
fn locate(len: usize, t: f64) -> (usize, f64) {
    let s = t.clamp(0.0, 1.0) * (len - 1) as f64;
    let i = (s.floor() as usize).min(len - 2);
    (i, s - i as f64)
}

pub fn evaluate_at(path: &[LngLat], t: f64) -> LngLat {
    match path.len() {
        0 => LngLat::default(),
        1 => path[0],
        len => {
            let (i, frac) = locate(len, t);
            path[i].lerp(path[i + 1], frac)
        }
    }
}

/// Compass heading of a planar step, in `[0, 360)`
fn planar_heading(from: LngLat, to: LngLat) -> f64 {
    normalize_bearing((to.lng - from.lng).atan2(to.lat - from.lat).to_degrees())
}

/// Forward-facing bearing at parameter `t`
pub fn get_bearing_at(path: &[LngLat], t: f64) -> f64 {
    if path.len() < 2 {
        return 0.0;
    }
    let (mut i, _) = locate(path.len(), t);
    // Skip forward over duplicate waypoints so the heading is defined
    while i + 2 < path.len() && calculate_distance(path[i], path[i + 1]) == 0.0 {
        i += 1;
    }
    calculate_bearing(path[i], path[i + 1])
}

/// Signed curvature near `t`: turning angle (radians, right turns positive)
/// over the local arc length in degrees.
pub fn get_curvature_at(path: &[LngLat], t: f64) -> f64 {
    if path.len() < 3 {
        return 0.0;
    }
    let s = t.clamp(0.0, 1.0) * (path.len() - 1) as f64;
    let i = (s.round() as usize).clamp(1, path.len() - 2);
    let window: SmallVec<[LngLat; 3]> = SmallVec::from_slice(&path[i - 1..=i + 1]);

    let first = calculate_distance(window[0], window[1]);
    let second = calculate_distance(window[1], window[2]);
    let arc = (first + second) / 2.0;
    if first == 0.0 || second == 0.0 || arc == 0.0 {
        return 0.0;
    }

    let turn = bearing_delta(
        planar_heading(window[0], window[1]),
        planar_heading(window[1], window[2]),
    );
    turn.to_radians() / arc
}

/// Bank angle for the curve at `t`, clamped to `±max_banking` degrees
pub fn calculate_banking(path: &[LngLat], t: f64, max_banking: f64) -> f64 {
    let max = max_banking.abs();
    (get_curvature_at(path, t) * BANKING_SCALE).clamp(-max, max)
}

// ============================================================================
// Spirals
// ============================================================================

/// A path winding around `center` from `start_radius` to `end_radius`
/// (degrees) over `turns` revolutions, with `segments + 1` points.
pub fn create_spiral_path(
    center: LngLat,
    start_radius: f64,
    end_radius: f64,
    turns: f64,
    segments: usize,
) -> Vec<LngLat> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let f = i as f64 / segments as f64;
            let radius = start_radius + (end_radius - start_radius) * f;
            let bearing = (f * turns * TAU).to_degrees();
            point_on_circle(center, radius, bearing)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lng: f64, lat: f64) -> LngLat {
        LngLat::new(lng, lat)
    }

    fn uneven_path() -> Vec<LngLat> {
        vec![
            p(0.0, 0.0),
            p(0.001, 0.0),
            p(0.0015, 0.0),
            p(0.01, 0.0),
            p(0.01, 0.0005),
            p(0.01, 0.02),
        ]
    }

    #[test]
    fn test_simplify_keeps_endpoints() {
        let path = vec![p(0.0, 0.0), p(1.0, 0.01), p(2.0, -0.01), p(3.0, 0.0)];
        let simplified = simplify_path(&path, 0.1);
        assert_eq!(simplified, vec![p(0.0, 0.0), p(3.0, 0.0)]);
    }

    #[test]
    fn test_simplify_respects_tolerance() {
        let path: Vec<LngLat> = (0..50)
            .map(|i| {
                let x = i as f64 * 0.1;
                p(x, (x * 1.7).sin() * 0.3)
            })
            .collect();
        let tolerance = 0.02;
        let simplified = simplify_path(&path, tolerance);

        assert_eq!(simplified.first(), path.first());
        assert_eq!(simplified.last(), path.last());
        assert!(simplified.len() < path.len());

        for point in &path {
            let nearest = simplified
                .windows(2)
                .map(|w| segment_distance(*point, w[0], w[1]))
                .fold(f64::MAX, f64::min);
            assert!(nearest <= tolerance + 1e-12);
        }
    }

    #[test]
    fn test_simplify_short_inputs() {
        assert!(simplify_path(&[], 1.0).is_empty());
        assert_eq!(simplify_path(&[p(1.0, 1.0)], 1.0), vec![p(1.0, 1.0)]);
    }

    #[test]
    fn test_offset_path_sides() {
        let path = vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)];
        let left = create_offset_path(&path, 0.5, OffsetSide::Left);
        let right = create_offset_path(&path, 0.5, OffsetSide::Right);
        for (l, r) in left.iter().zip(&right) {
            assert!((l.lat - 0.5).abs() < 1e-12);
            assert!((r.lat + 0.5).abs() < 1e-12);
        }
        assert_eq!(left.len(), path.len());
    }

    #[test]
    fn test_arc_length_table() {
        let path = vec![p(0.0, 0.0), p(3.0, 4.0), p(3.0, 10.0)];
        let table = create_arc_length_table(&path);
        assert_eq!(table.len(), 3);
        assert!((table.at(1).unwrap() - 5.0).abs() < 1e-12);
        assert!((table.total() - 11.0).abs() < 1e-12);
        assert!((get_arc_length(&path) - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_reparameterize_is_monotonic() {
        let table = create_arc_length_table(&uneven_path());
        let mut prev = 0.0;
        for i in 0..=1000 {
            let t = reparameterize(&table, i as f64 / 1000.0);
            assert!(t >= prev);
            prev = t;
        }
        assert_eq!(reparameterize(&table, 0.0), 0.0);
        assert!((reparameterize(&table, 1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reparameterize_gives_constant_speed() {
        let path = uneven_path();
        let table = create_arc_length_table(&path);
        let steps = 200;
        let expected = table.total() / steps as f64;

        let mut prev = evaluate_at(&path, reparameterize(&table, 0.0));
        for i in 1..=steps {
            let t = reparameterize(&table, i as f64 / steps as f64);
            let here = evaluate_at(&path, t);
            let step = calculate_distance(prev, here);
            // Corners cut a little distance; straight runs are exact
            assert!(
                (step - expected).abs() <= expected * 0.35,
                "step {i}: {step} vs {expected}"
            );
            prev = here;
        }
    }

    #[test]
    fn test_index_parameterization_is_uneven() {
        // Without reparameterization the same path advances at wildly
        // different speeds, which is what the table exists to fix.
        let path = uneven_path();
        let a = calculate_distance(evaluate_at(&path, 0.0), evaluate_at(&path, 0.2));
        let b = calculate_distance(evaluate_at(&path, 0.8), evaluate_at(&path, 1.0));
        assert!(b > a * 5.0);
    }

    #[test]
    fn test_evaluate_at_endpoints() {
        let path = uneven_path();
        assert_eq!(evaluate_at(&path, 0.0), path[0]);
        assert_eq!(evaluate_at(&path, 1.0), *path.last().unwrap());
        assert_eq!(evaluate_at(&[], 0.5), LngLat::default());
    }

    #[test]
    fn test_calculate_bearing_cardinals() {
        let origin = p(0.0, 0.0);
        assert!((calculate_bearing(origin, p(0.0, 1.0)) - 0.0).abs() < 1e-9);
        assert!((calculate_bearing(origin, p(1.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!((calculate_bearing(origin, p(0.0, -1.0)) - 180.0).abs() < 1e-9);
        assert!((calculate_bearing(origin, p(-1.0, 0.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_along_path() {
        let path = vec![p(0.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)];
        assert!(get_bearing_at(&path, 0.1).abs() < 1e-9);
        assert!((get_bearing_at(&path, 0.9) - 90.0).abs() < 0.1);
    }

    #[test]
    fn test_haversine_one_degree_at_equator() {
        let d = haversine_meters(p(0.0, 0.0), p(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 100.0);
        assert!((distance_meters(p(0.0, 0.0), p(1.0, 0.0)) - METERS_PER_DEGREE).abs() < 1e-6);
    }

    #[test]
    fn test_curvature_sign_and_banking_clamp() {
        // North then east: a right turn
        let right = vec![p(0.0, 0.0), p(0.0, 0.001), p(0.001, 0.001)];
        let left = vec![p(0.0, 0.0), p(0.0, 0.001), p(-0.001, 0.001)];
        assert!(get_curvature_at(&right, 0.5) > 0.0);
        assert!(get_curvature_at(&left, 0.5) < 0.0);

        assert_eq!(calculate_banking(&right, 0.5, 8.0), 8.0);
        assert_eq!(calculate_banking(&left, 0.5, 8.0), -8.0);

        let straight = vec![p(0.0, 0.0), p(0.0, 1.0), p(0.0, 2.0)];
        assert_eq!(calculate_banking(&straight, 0.5, 8.0), 0.0);
    }

    #[test]
    fn test_spiral_winds_outward() {
        let center = p(0.0, 0.0);
        let spiral = create_spiral_path(center, 0.001, 0.004, 2.0, 64);
        assert_eq!(spiral.len(), 65);

        let first = calculate_distance(center, spiral[0]);
        let last = calculate_distance(center, *spiral.last().unwrap());
        assert!((first - 0.001).abs() < 1e-9);
        assert!((last - 0.004).abs() < 1e-9);

        let mut prev = 0.0;
        for point in &spiral {
            let r = calculate_distance(center, *point);
            assert!(r >= prev - 1e-12);
            prev = r;
        }
    }

    #[test]
    fn test_slice_by_length() {
        let path = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 3.0)];
        let table = create_arc_length_table(&path);

        let half = slice_by_length(&path, &table, 0.5);
        assert_eq!(half.len(), 3);
        assert_eq!(half[1], p(1.0, 0.0));
        assert!((half[2].lat - 1.0).abs() < 1e-12);

        assert_eq!(slice_by_length(&path, &table, 1.0), path);
        assert_eq!(slice_by_length(&path, &table, 0.0), vec![p(0.0, 0.0)]);
    }

    #[test]
    fn test_slice_by_length_with_non_finite_path() {
        let path = vec![p(f64::NAN, 0.0), p(1.0, 1.0)];
        let table = create_arc_length_table(&path);
        assert!(table.total().is_nan());
        assert!(slice_by_length(&path, &table, 0.5).is_empty());
    }
}
