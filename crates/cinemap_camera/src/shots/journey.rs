use cinemap_animation::path::{
    calculate_banking, create_arc_length_table, create_offset_path, evaluate_at, get_bearing_at,
    reparameterize, simplify_path, slice_by_length,
};
use cinemap_animation::{lerp_bearing, ArcLengthTable};
use cinemap_core::{CameraState, LngLat, ShotType, METERS_PER_DEGREE};

use super::RouteDrawCallback;
use crate::config::JourneyConfig;
use crate::driver::{FrameContext, Segment, ShotProgram};

/// Constant-speed flight along an offset copy of a route
pub(crate) struct JourneyShot {
    route: Vec<LngLat>,
    route_table: ArcLengthTable,
    camera_path: Vec<LngLat>,
    camera_table: ArcLengthTable,
    config: JourneyConfig,
    duration_ms: f64,
    bearing: Option<f64>,
    on_draw_route: Option<RouteDrawCallback>,
}

impl JourneyShot {
    /// `None` when the route has fewer than two coordinates or any
    /// non-finite one
    pub(crate) fn new(
        route: &[LngLat],
        config: JourneyConfig,
        on_draw_route: Option<RouteDrawCallback>,
    ) -> Option<Self> {
        if route.len() < 2 || !route.iter().all(LngLat::is_finite) {
            return None;
        }

        let simplified = simplify_path(route, config.simplify_tolerance);
        let camera_path =
            create_offset_path(&simplified, config.offset_distance, config.offset_side);
        let camera_table = create_arc_length_table(&camera_path);

        let km = camera_table.total() * METERS_PER_DEGREE / 1000.0;
        let min = f64::from(config.min_duration_ms);
        let max = f64::from(config.max_duration_ms).max(min);
        let duration_ms = (km * config.ms_per_km).clamp(min, max);

        tracing::debug!(
            waypoints = route.len(),
            simplified = simplified.len(),
            km,
            duration_ms,
            "journey path built"
        );

        Some(Self {
            route: route.to_vec(),
            route_table: create_arc_length_table(route),
            camera_path,
            camera_table,
            config,
            duration_ms,
            bearing: None,
            on_draw_route,
        })
    }

    pub(crate) fn duration_ms(&self) -> f64 {
        self.duration_ms
    }
}

impl ShotProgram for JourneyShot {
    fn shot_type(&self) -> ShotType {
        ShotType::Journey
    }

    fn begin_segment(&mut self, index: usize, _camera: &mut CameraState) -> Option<Segment> {
        (index == 0).then(|| Segment::new(self.duration_ms, self.config.easing))
    }

    fn update(&mut self, frame: &FrameContext, camera: &mut CameraState) -> bool {
        let cfg = &self.config;
        let t = reparameterize(&self.camera_table, frame.eased);

        let heading = get_bearing_at(&self.camera_path, t);
        let bearing = match self.bearing {
            Some(previous) => lerp_bearing(previous, heading, cfg.bearing_smoothing),
            None => heading,
        };
        self.bearing = Some(bearing);

        let banking = calculate_banking(&self.camera_path, t, cfg.max_banking);

        camera.center = evaluate_at(&self.camera_path, t);
        camera.zoom = cfg.zoom;
        camera.pitch = cfg.pitch - banking.abs() * cfg.banking_pitch_factor;
        camera.bearing = bearing;

        if let Some(draw) = self.on_draw_route.as_mut() {
            let ahead = (frame.eased + cfg.route_draw_ahead).min(1.0);
            draw(&slice_by_length(&self.route, &self.route_table, ahead));
        }
        true
    }
}
