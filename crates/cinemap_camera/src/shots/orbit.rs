use cinemap_animation::path::{
    calculate_bearing, create_arc_length_table, create_spiral_path, evaluate_at, reparameterize,
};
use cinemap_animation::{gentle_pulse, ArcLengthTable, Easing};
use cinemap_core::{CameraState, LngLat, ShotType};

use super::LabelRevealCallback;
use crate::config::ContextualOrbitConfig;
use crate::driver::{FrameContext, Segment, ShotProgram};

/// Spiral outwards around a point, always facing it
pub(crate) struct ContextualOrbitShot {
    center: LngLat,
    config: ContextualOrbitConfig,
    spiral: Vec<LngLat>,
    table: ArcLengthTable,
    on_label_reveal: Option<LabelRevealCallback>,
}

impl ContextualOrbitShot {
    pub(crate) fn new(
        center: LngLat,
        config: ContextualOrbitConfig,
        on_label_reveal: Option<LabelRevealCallback>,
    ) -> Self {
        let spiral = create_spiral_path(
            center,
            config.start_radius,
            config.end_radius,
            config.turns,
            config.segments,
        );
        let table = create_arc_length_table(&spiral);
        Self {
            center,
            config,
            spiral,
            table,
            on_label_reveal,
        }
    }
}

impl ShotProgram for ContextualOrbitShot {
    fn shot_type(&self) -> ShotType {
        ShotType::ContextualOrbit
    }

    fn begin_segment(&mut self, index: usize, _camera: &mut CameraState) -> Option<Segment> {
        (index == 0).then(|| Segment::new(self.config.duration_ms, Easing::OrbitCruise))
    }

    fn update(&mut self, frame: &FrameContext, camera: &mut CameraState) -> bool {
        let t = reparameterize(&self.table, frame.eased);
        let position = evaluate_at(&self.spiral, t);

        camera.center = position;
        if position != self.center {
            camera.bearing = calculate_bearing(position, self.center);
        }
        camera.zoom = self.config.zoom + gentle_pulse(frame.raw, self.config.zoom_pulse);
        camera.pitch = self.config.pitch;

        if let Some(reveal) = self.on_label_reveal.as_mut() {
            reveal(frame.eased * 360.0);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinemap_animation::path::calculate_distance;

    #[test]
    fn test_faces_center_while_widening() {
        let center = LngLat::new(0.0, 0.0);
        let mut shot = ContextualOrbitShot::new(center, ContextualOrbitConfig::default(), None);
        let mut camera = CameraState::default();
        shot.begin_segment(0, &mut camera).unwrap();

        let mut last_radius = 0.0;
        for i in 0..=10 {
            let p = i as f64 / 10.0;
            let frame = FrameContext {
                eased: p,
                raw: p,
                ..Default::default()
            };
            shot.update(&frame, &mut camera);
            let radius = calculate_distance(camera.center, center);
            assert!(radius >= last_radius - 1e-9);
            last_radius = radius;
            assert!((camera.bearing - calculate_bearing(camera.center, center)).abs() < 1e-9);
        }
        assert!((last_radius - 0.004).abs() < 1e-9);
    }

    #[test]
    fn test_label_reveal_reports_degrees() {
        use std::cell::Cell;
        use std::rc::Rc;

        let degrees = Rc::new(Cell::new(0.0));
        let sink = degrees.clone();
        let mut shot = ContextualOrbitShot::new(
            LngLat::new(5.0, 5.0),
            ContextualOrbitConfig::default(),
            Some(Box::new(move |d: f64| sink.set(d))),
        );
        let mut camera = CameraState::default();
        shot.begin_segment(0, &mut camera).unwrap();
        let frame = FrameContext {
            eased: 0.25,
            raw: 0.25,
            ..Default::default()
        };
        shot.update(&frame, &mut camera);
        assert!((degrees.get() - 90.0).abs() < 1e-9);
    }
}
