use cinemap_animation::{easing, gentle_pulse, lerp, lerp_bearing, normalize_bearing, Easing};
use cinemap_core::{CameraState, LngLat, ShotType};

use crate::config::RevealConfig;
use crate::driver::{FrameContext, Segment, ShotProgram};

/// Approach a destination, then settle with a slow drift and a zoom pulse.
///
/// Both phases share one segment; the boundary sits at the ratio of the
/// configured approach and settle durations.
pub(crate) struct RevealShot {
    destination: LngLat,
    config: RevealConfig,
    start: CameraState,
    boundary: f64,
}

impl RevealShot {
    pub(crate) fn new(destination: LngLat, config: RevealConfig) -> Self {
        let approach = f64::from(config.approach_duration_ms);
        let total = approach + f64::from(config.settle_duration_ms);
        let boundary = if total > 0.0 { approach / total } else { 1.0 };
        Self {
            destination,
            config,
            start: CameraState::default(),
            boundary,
        }
    }

    fn target_bearing(&self) -> f64 {
        self.config.bearing.unwrap_or(self.start.bearing)
    }
}

impl ShotProgram for RevealShot {
    fn shot_type(&self) -> ShotType {
        ShotType::Reveal
    }

    fn begin_segment(&mut self, index: usize, camera: &mut CameraState) -> Option<Segment> {
        if index > 0 {
            return None;
        }
        self.start = *camera;
        let total = self.config.approach_duration_ms + self.config.settle_duration_ms;
        Some(Segment::new(total, Easing::Linear))
    }

    fn update(&mut self, frame: &FrameContext, camera: &mut CameraState) -> bool {
        let cfg = &self.config;
        let target_bearing = self.target_bearing();

        if frame.raw < self.boundary {
            let e = easing::dramatic_reveal(frame.raw / self.boundary);
            camera.center = self.start.center.lerp(self.destination, e);
            camera.zoom = lerp(self.start.zoom, cfg.zoom, e);
            camera.pitch = lerp(self.start.pitch, cfg.pitch, e);
            camera.bearing = lerp_bearing(self.start.bearing, target_bearing, e);
        } else {
            let p = if self.boundary < 1.0 {
                (frame.raw - self.boundary) / (1.0 - self.boundary)
            } else {
                1.0
            };
            camera.center = self.destination;
            camera.zoom = cfg.zoom + gentle_pulse(p, cfg.zoom_pulse);
            camera.pitch = cfg.pitch;
            camera.bearing =
                normalize_bearing(target_bearing + cfg.settle_orbit * easing::sine_in_out(p));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(raw: f64) -> FrameContext {
        FrameContext {
            eased: raw,
            raw,
            ..Default::default()
        }
    }

    #[test]
    fn test_phase_boundary_from_durations() {
        let shot = RevealShot::new(LngLat::new(1.0, 1.0), RevealConfig::default());
        assert!((shot.boundary - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_arrives_at_boundary_then_settles() {
        let dest = LngLat::new(1.0, 1.0);
        let mut shot = RevealShot::new(dest, RevealConfig::default());
        let mut camera = CameraState::new(LngLat::new(0.0, 0.0), 10.0, 0.0, 20.0);
        shot.begin_segment(0, &mut camera).unwrap();

        shot.update(&frame(0.0), &mut camera);
        assert_eq!(camera.center, LngLat::new(0.0, 0.0));

        shot.update(&frame(0.7), &mut camera);
        assert_eq!(camera.center, dest);
        assert!((camera.zoom - 16.0).abs() < 1e-9);
        assert!((camera.bearing - 20.0).abs() < 1e-9);

        shot.update(&frame(1.0), &mut camera);
        assert!((camera.zoom - 16.0).abs() < 1e-9);
        assert!((camera.bearing - 32.0).abs() < 1e-9);
    }
}
