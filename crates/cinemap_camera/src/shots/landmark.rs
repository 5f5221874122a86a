use std::f64::consts::PI;

use cinemap_animation::path::{calculate_bearing, point_on_circle};
use cinemap_animation::{gentle_pulse, lerp, lerp_bearing, normalize_bearing, Easing};
use cinemap_core::{CameraState, LngLat, ShotType};
use serde::{Deserialize, Serialize};

use super::TravelCallback;
use crate::config::LandmarkHighlightConfig;
use crate::driver::{FrameContext, Segment, ShotProgram};

/// Which part of a landmark highlight is running
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightPhase {
    Approach,
    Transition,
    Orbit,
}

/// Reported to the travel callback every frame of a landmark highlight
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TravelProgress {
    /// Eased progress of the current phase
    pub progress: f64,
    pub bearing: f64,
    pub phase: HighlightPhase,
}

/// Fraction of the approach over which the bearing turns onto the tangent
const TANGENT_BLEND: f64 = 0.2;

/// Curved approach, a short move onto the orbit circle, then a full orbit
pub(crate) struct LandmarkHighlightShot {
    target: LngLat,
    config: LandmarkHighlightConfig,
    on_travel: Option<TravelCallback>,
    phase: HighlightPhase,
    from: CameraState,
    control: LngLat,
    orbit_start: f64,
}

impl LandmarkHighlightShot {
    pub(crate) fn new(
        target: LngLat,
        config: LandmarkHighlightConfig,
        on_travel: Option<TravelCallback>,
    ) -> Self {
        Self {
            target,
            config,
            on_travel,
            phase: HighlightPhase::Approach,
            from: CameraState::default(),
            control: target,
            orbit_start: 0.0,
        }
    }

    /// Quadratic bezier control point, pushed off the straight line
    fn control_point(start: LngLat, end: LngLat, intensity: f64) -> LngLat {
        let mid = start.lerp(end, 0.5);
        let dx = end.lng - start.lng;
        let dy = end.lat - start.lat;
        LngLat::new(mid.lng - dy * intensity, mid.lat + dx * intensity)
    }

    fn bezier(&self, t: f64) -> (LngLat, LngLat) {
        let (p0, p1, p2) = (self.from.center, self.control, self.target);
        let u = 1.0 - t;
        let position = LngLat::new(
            u * u * p0.lng + 2.0 * u * t * p1.lng + t * t * p2.lng,
            u * u * p0.lat + 2.0 * u * t * p1.lat + t * t * p2.lat,
        );
        let tangent = LngLat::new(
            2.0 * u * (p1.lng - p0.lng) + 2.0 * t * (p2.lng - p1.lng),
            2.0 * u * (p1.lat - p0.lat) + 2.0 * t * (p2.lat - p1.lat),
        );
        (position, tangent)
    }

    fn approach(&self, e: f64, camera: &mut CameraState) {
        let cfg = &self.config;
        let (position, tangent) = self.bezier(e);

        let heading = if tangent.lng == 0.0 && tangent.lat == 0.0 {
            self.from.bearing
        } else {
            calculate_bearing(
                position,
                LngLat::new(position.lng + tangent.lng, position.lat + tangent.lat),
            )
        };

        let arc = (PI * e).sin();
        camera.center = position;
        camera.zoom = lerp(self.from.zoom, cfg.zoom, e) - cfg.parallax_zoom_out * arc;
        camera.pitch = lerp(self.from.pitch, cfg.pitch, e);
        camera.bearing = lerp_bearing(self.from.bearing, heading, (e / TANGENT_BLEND).min(1.0));
    }

    fn transition(&self, e: f64, camera: &mut CameraState) {
        let cfg = &self.config;
        let entry = point_on_circle(self.target, cfg.orbit_radius, self.orbit_start);
        camera.center = self.from.center.lerp(entry, e);
        camera.zoom = lerp(self.from.zoom, cfg.zoom, e);
        camera.pitch = lerp(self.from.pitch, cfg.orbit_pitch, e);
        camera.bearing = lerp_bearing(self.from.bearing, self.orbit_start + 180.0, e);
    }

    fn orbit(&self, frame: &FrameContext, camera: &mut CameraState) {
        let cfg = &self.config;
        let angle = self.orbit_start + cfg.orbit_angle * frame.eased;
        let position = point_on_circle(self.target, cfg.orbit_radius, angle);
        camera.center = position;
        camera.bearing = calculate_bearing(position, self.target);
        camera.zoom = cfg.zoom + gentle_pulse(frame.raw * 2.0, cfg.orbit_zoom_breath);
        camera.pitch = cfg.orbit_pitch + gentle_pulse(frame.raw * 1.5, cfg.orbit_pitch_breath);
    }
}

impl ShotProgram for LandmarkHighlightShot {
    fn shot_type(&self) -> ShotType {
        ShotType::LandmarkHighlight
    }

    fn begin_segment(&mut self, index: usize, camera: &mut CameraState) -> Option<Segment> {
        self.from = *camera;
        let cfg = &self.config;
        match index {
            0 => {
                self.phase = HighlightPhase::Approach;
                self.control =
                    Self::control_point(camera.center, self.target, cfg.curve_intensity);
                Some(Segment::new(cfg.approach_duration_ms, Easing::CinematicEaseInOut))
            }
            1 => {
                self.phase = HighlightPhase::Transition;
                // Enter the circle on the far side of the current view direction
                self.orbit_start = normalize_bearing(camera.bearing + 180.0);
                Some(Segment::new(cfg.transition_duration_ms, Easing::SineInOut))
            }
            2 => {
                self.phase = HighlightPhase::Orbit;
                Some(Segment::new(cfg.orbit_duration_ms, Easing::OrbitCruise))
            }
            _ => None,
        }
    }

    fn update(&mut self, frame: &FrameContext, camera: &mut CameraState) -> bool {
        match self.phase {
            HighlightPhase::Approach => self.approach(frame.eased, camera),
            HighlightPhase::Transition => self.transition(frame.eased, camera),
            HighlightPhase::Orbit => self.orbit(frame, camera),
        }
        let progress = TravelProgress {
            progress: frame.eased,
            bearing: camera.bearing,
            phase: self.phase,
        };
        if let Some(on_travel) = self.on_travel.as_mut() {
            on_travel(progress);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinemap_animation::path::calculate_distance;

    fn frame(p: f64) -> FrameContext {
        FrameContext {
            eased: p,
            raw: p,
            ..Default::default()
        }
    }

    #[test]
    fn test_approach_curves_off_the_straight_line() {
        let target = LngLat::new(0.01, 0.0);
        let mut shot = LandmarkHighlightShot::new(target, Default::default(), None);
        let mut camera = CameraState::new(LngLat::new(0.0, 0.0), 12.0, 30.0, 90.0);
        shot.begin_segment(0, &mut camera).unwrap();

        shot.update(&frame(0.5), &mut camera);
        assert!(camera.center.lat > 0.0);
        // Parallax dip at the midpoint
        assert!(camera.zoom < lerp(12.0, 16.5, 0.5));

        shot.update(&frame(1.0), &mut camera);
        assert!(calculate_distance(camera.center, target) < 1e-12);
        assert!((camera.zoom - 16.5).abs() < 1e-9);
    }

    #[test]
    fn test_orbit_stays_on_circle_and_faces_target() {
        let target = LngLat::new(0.0, 0.0);
        let config = LandmarkHighlightConfig::default();
        let radius = config.orbit_radius;
        let mut shot = LandmarkHighlightShot::new(target, config, None);
        let mut camera = CameraState::new(target, 16.5, 60.0, 0.0);
        for index in 0..3 {
            shot.begin_segment(index, &mut camera).unwrap();
            shot.update(&frame(1.0), &mut camera);
        }

        for p in [0.1, 0.4, 0.8] {
            shot.update(&frame(p), &mut camera);
            assert!((calculate_distance(camera.center, target) - radius).abs() < 1e-9);
            let facing = calculate_bearing(camera.center, target);
            assert!((camera.bearing - facing).abs() < 1e-9);
        }
        assert!(shot.begin_segment(3, &mut camera).is_none());
    }

    #[test]
    fn test_reports_every_phase() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut shot = LandmarkHighlightShot::new(
            LngLat::new(0.001, 0.001),
            Default::default(),
            Some(Box::new(move |p: TravelProgress| sink.borrow_mut().push(p.phase))),
        );
        let mut camera = CameraState::default();
        for index in 0..3 {
            shot.begin_segment(index, &mut camera).unwrap();
            shot.update(&frame(0.5), &mut camera);
        }
        assert_eq!(
            *seen.borrow(),
            vec![
                HighlightPhase::Approach,
                HighlightPhase::Transition,
                HighlightPhase::Orbit
            ]
        );
    }
}
