//! Headless cinematic tour
//!
//! Plays the full sequence a map page opens with: establishing shot on the
//! first landmark, a journey and highlight for every following landmark, a
//! contextual orbit around the last one, then idle breathing.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Result};
use cinemap_animation::path::{calculate_bearing, calculate_distance, haversine_meters, point_on_circle};
use cinemap_camera::{CinematicCamera, HighlightPhase, ShotHandle, TravelCallback, TravelProgress};
use cinemap_core::{CameraState, LngLat, ManualScheduler, ShotOutcome, ShotType};
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::config::CinemapConfig;
use crate::surface::SimulatedSurface;

/// A shot still running after this much simulated time is abandoned
const MAX_SHOT_MS: f64 = 120_000.0;

/// Sideways bow of generated routes, as a fraction of the leg length
const ROUTE_BOW: f64 = 0.2;
const ROUTE_POINTS: usize = 12;

#[derive(Clone, Debug)]
pub struct TourOptions {
    pub fps: u32,
    /// Pace frames with the wall clock instead of running flat out
    pub realtime: bool,
    /// Idle breathing to show after the last shot
    pub breathing_ms: u64,
}

impl Default for TourOptions {
    fn default() -> Self {
        Self {
            fps: 60,
            realtime: false,
            breathing_ms: 3000,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ShotSummary {
    pub shot: ShotType,
    pub label: String,
    pub outcome: ShotOutcome,
    pub frames: u64,
    pub duration_ms: f64,
    pub distance_m: f64,
}

#[derive(Clone, Debug)]
pub struct TourReport {
    pub shots: Vec<ShotSummary>,
    pub frames: u64,
    /// Camera writes that reached the surface
    pub applied: usize,
    pub final_camera: CameraState,
}

impl TourReport {
    pub fn distance_m(&self) -> f64 {
        self.shots.iter().map(|s| s.distance_m).sum()
    }
}

/// Feeds frames to the scheduler at a fixed simulated rate
struct FrameDriver {
    scheduler: Rc<ManualScheduler>,
    now: f64,
    frame_ms: f64,
    frames: u64,
    ticker: Option<Interval>,
}

impl FrameDriver {
    fn new(scheduler: Rc<ManualScheduler>, fps: u32, realtime: bool) -> Self {
        let frame_ms = 1000.0 / f64::from(fps.max(1));
        let ticker = realtime.then(|| {
            let mut ticker = interval(Duration::from_secs_f64(frame_ms / 1000.0));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        Self {
            scheduler,
            now: 0.0,
            frame_ms,
            frames: 0,
            ticker,
        }
    }

    async fn step(&mut self) {
        if let Some(ticker) = self.ticker.as_mut() {
            ticker.tick().await;
        }
        self.now += self.frame_ms;
        self.frames += 1;
        self.scheduler.run_frame(self.now);
    }

    async fn run_for(&mut self, duration_ms: f64) {
        let end = self.now + duration_ms;
        while self.now < end {
            self.step().await;
        }
    }

    async fn run_shot(
        &mut self,
        camera: &CinematicCamera,
        shot: ShotType,
        label: String,
        handle: ShotHandle,
    ) -> Result<ShotSummary> {
        let start = self.now;
        let start_frames = self.frames;
        let outcome = loop {
            if let Some(outcome) = handle.outcome() {
                break outcome;
            }
            if self.now - start > MAX_SHOT_MS {
                handle.cancel();
                bail!("{label} still running after {} s", MAX_SHOT_MS / 1000.0);
            }
            self.step().await;
        };

        let summary = ShotSummary {
            shot,
            label,
            outcome,
            frames: self.frames - start_frames,
            duration_ms: self.now - start,
            distance_m: camera.telemetry().distance_m,
        };
        tracing::info!(
            shot = %summary.shot,
            outcome = ?summary.outcome,
            frames = summary.frames,
            "{} finished in {:.1} s",
            summary.label,
            summary.duration_ms / 1000.0
        );
        Ok(summary)
    }
}

/// A gently curved route from `from` to `to`
pub fn scenic_route(from: LngLat, to: LngLat) -> Vec<LngLat> {
    let length = calculate_distance(from, to);
    let bearing = calculate_bearing(from, to);
    let control = point_on_circle(from.lerp(to, 0.5), length * ROUTE_BOW, bearing + 90.0);

    (0..ROUTE_POINTS)
        .map(|i| {
            let t = i as f64 / (ROUTE_POINTS - 1) as f64;
            let a = from.lerp(control, t);
            let b = control.lerp(to, t);
            a.lerp(b, t)
        })
        .collect()
}

pub async fn run_tour(config: &CinemapConfig, options: &TourOptions) -> Result<TourReport> {
    let scheduler = Rc::new(ManualScheduler::new());
    let surface = SimulatedSurface::new(config.map.camera());
    let camera = CinematicCamera::with_config(
        surface.clone(),
        scheduler.clone(),
        config.cinematic.clone(),
    );
    camera.on_progress(|progress, shot| tracing::trace!(%shot, progress, "frame"));

    let mut driver = FrameDriver::new(scheduler, options.fps, options.realtime);
    let mut shots = Vec::new();

    let stops: Vec<_> = config
        .landmarks
        .iter()
        .filter_map(|landmark| match landmark.coordinates {
            Some(target) => Some((landmark, target)),
            None => {
                tracing::warn!(landmark = %landmark.id, "landmark has no coordinates, skipping");
                None
            }
        })
        .collect();

    let opening = stops.first().map_or(config.map.center, |&(_, target)| target);
    let handle = camera.establishing_shot(opening, config.shots.establishing.clone());
    shots.push(
        driver
            .run_shot(&camera, ShotType::Establishing, "establishing".into(), handle)
            .await?,
    );

    let mut here = opening;
    for (landmark, target) in stops {
        if calculate_distance(here, target) > f64::EPSILON {
            tracing::info!(
                km = haversine_meters(here, target) / 1000.0,
                "travelling to {}",
                landmark.title
            );
            let drawn = Rc::new(Cell::new(0usize));
            let drawn_in_frame = drawn.clone();
            let handle = camera.journey_shot(
                &scenic_route(here, target),
                config.shots.journey.clone(),
                Some(Box::new(move |slice: &[LngLat]| drawn_in_frame.set(slice.len()))),
            );
            let label = format!("journey to {}", landmark.title);
            shots.push(driver.run_shot(&camera, ShotType::Journey, label, handle).await?);
            tracing::debug!(points = drawn.get(), "route drawn");
        }

        let phase = Rc::new(Cell::new(None::<HighlightPhase>));
        let on_travel: TravelCallback = Box::new(move |travel: TravelProgress| {
            if phase.get() != Some(travel.phase) {
                tracing::debug!(phase = ?travel.phase, bearing = travel.bearing, "highlight phase");
                phase.set(Some(travel.phase));
            }
        });
        let handle = camera.landmark_highlight(landmark, config.shots.landmark.clone(), Some(on_travel));
        let label = format!("highlight {}", landmark.title);
        shots.push(
            driver
                .run_shot(&camera, ShotType::LandmarkHighlight, label, handle)
                .await?,
        );
        here = target;
    }

    let revealed = Rc::new(Cell::new(0.0));
    let revealed_in_frame = revealed.clone();
    let handle = camera.contextual_orbit(
        here,
        config.shots.orbit.clone(),
        Some(Box::new(move |degrees: f64| revealed_in_frame.set(degrees))),
    );
    shots.push(
        driver
            .run_shot(&camera, ShotType::ContextualOrbit, "orbit".into(), handle)
            .await?,
    );
    tracing::debug!(degrees = revealed.get(), "labels revealed");

    if options.breathing_ms > 0 && camera.start_breathing() {
        driver.run_for(options.breathing_ms as f64).await;
        camera.stop_breathing();
    }

    let final_camera = camera.camera();
    camera.destroy();

    Ok(TourReport {
        shots,
        frames: driver.frames,
        applied: surface.applied(),
        final_camera,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinemap_core::Landmark;

    fn short_config() -> CinemapConfig {
        let mut config = CinemapConfig::new("test");
        config.shots.establishing.duration_ms = 1000;
        config.shots.establishing.setup_pause_ms = 100;
        config.shots.landmark.approach_duration_ms = 500;
        config.shots.landmark.transition_duration_ms = 200;
        config.shots.landmark.orbit_duration_ms = 500;
        config.shots.orbit.duration_ms = 800;
        config.landmarks = vec![
            Landmark::new("a", "Alpha", LngLat::new(126.97, 37.57)),
            Landmark::new("b", "Bravo", LngLat::new(126.99, 37.55)),
        ];
        config
    }

    #[test]
    fn test_scenic_route_keeps_endpoints() {
        let from = LngLat::new(126.97, 37.57);
        let to = LngLat::new(126.99, 37.55);
        let route = scenic_route(from, to);
        assert_eq!(route.len(), ROUTE_POINTS);
        assert_eq!(route[0], from);
        assert!(calculate_distance(route[ROUTE_POINTS - 1], to) < 1e-12);
        assert!(calculate_distance(route[ROUTE_POINTS / 2], from.lerp(to, 0.5)) > 1e-4);
    }

    #[tokio::test]
    async fn test_tour_completes_every_shot() {
        let options = TourOptions {
            fps: 30,
            realtime: false,
            breathing_ms: 500,
        };
        let report = run_tour(&short_config(), &options).await.unwrap();

        let kinds: Vec<ShotType> = report.shots.iter().map(|s| s.shot).collect();
        assert_eq!(
            kinds,
            vec![
                ShotType::Establishing,
                ShotType::LandmarkHighlight,
                ShotType::Journey,
                ShotType::LandmarkHighlight,
                ShotType::ContextualOrbit,
            ]
        );
        assert!(report.shots.iter().all(|s| s.outcome == ShotOutcome::Completed));
        assert!(report.applied > 0);
        assert!(report.distance_m() > 0.0);
        assert!(report.final_camera.is_valid());
    }

    #[tokio::test]
    async fn test_tour_without_landmarks_orbits_map_center() {
        let mut config = short_config();
        config.landmarks.clear();
        let report = run_tour(&config, &TourOptions::default()).await.unwrap();
        assert_eq!(report.shots.len(), 2);
        assert_eq!(report.shots[1].shot, ShotType::ContextualOrbit);
    }
}
