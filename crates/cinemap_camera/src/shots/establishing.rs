use cinemap_animation::{easing, lerp, normalize_bearing, Easing};
use cinemap_core::{CameraState, LngLat, ShotType};

use crate::config::EstablishingConfig;
use crate::driver::{FrameContext, Segment, ShotProgram};

/// Jump high above the target, hold, then descend while drifting in bearing
pub(crate) struct EstablishingShot {
    target: LngLat,
    config: EstablishingConfig,
    start_bearing: f64,
    segment: usize,
}

impl EstablishingShot {
    pub(crate) fn new(target: LngLat, config: EstablishingConfig) -> Self {
        Self {
            target,
            config,
            start_bearing: 0.0,
            segment: 0,
        }
    }
}

impl ShotProgram for EstablishingShot {
    fn shot_type(&self) -> ShotType {
        ShotType::Establishing
    }

    fn begin_segment(&mut self, index: usize, camera: &mut CameraState) -> Option<Segment> {
        self.segment = index;
        match index {
            0 => {
                camera.center = self.target;
                camera.zoom = self.config.start_zoom;
                camera.pitch = self.config.start_pitch;
                self.start_bearing = camera.bearing;
                Some(Segment::hold(self.config.setup_pause_ms))
            }
            1 => Some(Segment::new(self.config.duration_ms, Easing::DroneLanding)),
            _ => None,
        }
    }

    fn update(&mut self, frame: &FrameContext, camera: &mut CameraState) -> bool {
        if self.segment == 0 {
            return true;
        }
        let cfg = &self.config;
        camera.center = self.target;
        camera.zoom = lerp(cfg.start_zoom, cfg.end_zoom, frame.eased);
        camera.pitch = lerp(cfg.start_pitch, cfg.end_pitch, easing::sine_in_out(frame.raw));
        camera.bearing =
            normalize_bearing(self.start_bearing + cfg.orbit_angle * easing::orbit_cruise(frame.raw));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jumps_then_descends() {
        let target = LngLat::new(2.35, 48.85);
        let mut shot = EstablishingShot::new(target, EstablishingConfig::default());
        let mut camera = CameraState::default();

        let hold = shot.begin_segment(0, &mut camera).unwrap();
        assert_eq!(hold.easing, Easing::Linear);
        assert_eq!(camera.center, target);
        assert_eq!(camera.zoom, 3.5);

        shot.begin_segment(1, &mut camera).unwrap();
        let end = FrameContext {
            eased: 1.0,
            raw: 1.0,
            ..Default::default()
        };
        shot.update(&end, &mut camera);
        assert!((camera.zoom - 12.5).abs() < 1e-9);
        assert!((camera.pitch - 45.0).abs() < 1e-9);
        assert!((camera.bearing - 30.0).abs() < 1e-9);

        assert!(shot.begin_segment(2, &mut camera).is_none());
    }
}
