//! Multi-viewer sync demo
//!
//! One receiver and N controllers share an in-process bus and a manual clock.
//! The receiver runs the camera engine (startup establishing shot, landmark
//! reveals, remote cameras applied while idle). The first controller pans its
//! camera continuously; the last one selects a landmark and changes the view
//! mode partway through. The report shows what every guard held back.

use std::rc::Rc;
use std::sync::Arc;

use anyhow::Result;
use cinemap_camera::CinematicCamera;
use cinemap_core::{CameraState, ManualClock, ManualScheduler};
use cinemap_sync::{
    DropReason, FilterState, LocalBus, LocalEndpoint, RouteAnimationGate, SessionOptions, SyncRole,
    SyncSession, SyncStats,
};

use crate::config::CinemapConfig;
use crate::surface::SimulatedSurface;

const FILTER_AT_MS: u64 = 12_000;
const SELECT_AT_MS: u64 = 16_000;
const VIEW_MODE_AT_MS: u64 = 26_000;

/// Controller viewport; differs from the receiver's on purpose
const CONTROLLER_VIEWPORT: (f64, f64) = (1280.0, 800.0);

const REASONS: [DropReason; 9] = [
    DropReason::InitialBlock,
    DropReason::Cooldown,
    DropReason::RouteAnimation,
    DropReason::InvalidZoom,
    DropReason::InvalidCamera,
    DropReason::Echo,
    DropReason::Malformed,
    DropReason::UnknownEvent,
    DropReason::WrongRole,
];

#[derive(Clone, Debug)]
pub struct SyncDemoOptions {
    pub controllers: usize,
    pub duration_ms: u64,
    /// Simulated time between steps
    pub step_ms: u64,
}

impl Default for SyncDemoOptions {
    fn default() -> Self {
        Self {
            controllers: 2,
            duration_ms: 30_000,
            step_ms: 100,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PeerReport {
    pub label: String,
    pub role: SyncRole,
    pub stats: SyncStats,
    pub aspect_ratio: Option<f64>,
}

impl PeerReport {
    fn new(session: &SyncSession<LocalEndpoint>) -> Self {
        Self {
            label: session.session_id().to_string(),
            role: session.role(),
            stats: session.stats().clone(),
            aspect_ratio: session.effective_aspect_ratio(),
        }
    }

    /// Non-zero counters as `reason=count` pairs
    pub fn breakdown(&self, count: impl Fn(&SyncStats, DropReason) -> u64) -> String {
        let parts: Vec<String> = REASONS
            .iter()
            .filter_map(|&reason| {
                let n = count(&self.stats, reason);
                (n > 0).then(|| format!("{reason:?}={n}"))
            })
            .collect();
        if parts.is_empty() {
            "-".to_string()
        } else {
            parts.join(" ")
        }
    }
}

#[derive(Clone, Debug)]
pub struct SyncDemoReport {
    /// Receiver first, then controllers in order
    pub peers: Vec<PeerReport>,
    pub receiver_camera: CameraState,
}

fn controller(
    bus: &LocalBus,
    clock: &Arc<ManualClock>,
    config: &CinemapConfig,
    index: usize,
) -> SyncSession<LocalEndpoint> {
    let (width, height) = CONTROLLER_VIEWPORT;
    let options = SessionOptions::controller()
        .with_session_id(format!("controller-{}", index + 1))
        .with_timings(config.sync.clone())
        .with_viewport(width, height);
    let mut session = SyncSession::new(bus.connect(), options, clock.clone(), RouteAnimationGate::new());
    let id = session.session_id().to_string();
    session.on_aspect_ratio(move |aspect| {
        tracing::debug!(peer = %id, ratio = aspect.ratio, "receiver aspect ratio");
    });
    session
}

pub fn run_sync_demo(config: &CinemapConfig, options: &SyncDemoOptions) -> Result<SyncDemoReport> {
    let bus = LocalBus::new();
    let clock = Arc::new(ManualClock::new(0));
    let scheduler = Rc::new(ManualScheduler::new());
    let camera = CinematicCamera::with_config(
        SimulatedSurface::new(config.map.camera()),
        scheduler.clone(),
        config.cinematic.clone(),
    );

    let (width, height) = config.map.viewport();
    let receiver_options = SessionOptions::receiver()
        .with_session_id("receiver")
        .with_timings(config.sync.clone())
        .with_viewport(width, height);
    let mut receiver = SyncSession::new(
        bus.connect(),
        receiver_options,
        clock.clone(),
        RouteAnimationGate::new(),
    );

    let source = camera.clone();
    receiver.set_camera_source(move || source.camera());
    let target = camera.clone();
    receiver.on_camera_update(move |state| {
        if !target.apply_external(&state) {
            tracing::debug!("receiver is animating, remote camera not applied");
        }
    });
    let target = camera.clone();
    let reveal = config.shots.reveal.clone();
    receiver.on_landmark_select(move |selection| match selection.coordinates {
        Some(destination) => {
            tracing::info!(landmark = %selection.landmark_id, "receiver revealing landmark");
            target.reveal_shot(destination, reveal.clone());
        }
        None => tracing::debug!(landmark = %selection.landmark_id, "selection without coordinates"),
    });
    receiver.on_filter_change(|filters| {
        tracing::info!(categories = ?filters.categories, "receiver applied filters");
    });
    receiver.on_view_mode(|mode| tracing::info!(%mode, "receiver switched view mode"));

    let mut controllers: Vec<_> = (0..options.controllers)
        .map(|index| controller(&bus, &clock, config, index))
        .collect();

    // Startup cinematic, protected by everyone's initial block
    let opening = config
        .landmarks
        .iter()
        .find_map(|landmark| landmark.coordinates)
        .unwrap_or(config.map.center);
    camera.establishing_shot(opening, config.shots.establishing.clone());
    for session in &mut controllers {
        session.announce();
    }

    let selection = config.landmarks.iter().find(|l| l.coordinates.is_some());
    let categories: Vec<String> = config
        .landmarks
        .iter()
        .filter_map(|l| l.category_name.clone())
        .collect();
    let mut panning = config.map.camera();
    let step = options.step_ms.max(1);
    let mut now = 0;

    while now <= options.duration_ms {
        clock.set(now);
        scheduler.run_frame(now as f64);
        let due = |at: u64| (now..now + step).contains(&at);

        receiver.pump();
        for session in &mut controllers {
            session.pump();
        }

        if let Some(driver) = controllers.first_mut() {
            panning.bearing = (panning.bearing + 0.5).rem_euclid(360.0);
            driver.sync_camera(panning);
            if due(FILTER_AT_MS) {
                let filters = FilterState {
                    categories: categories.clone(),
                    search: None,
                };
                driver.sync_filters(&filters);
            }
        }
        if let Some(selector) = controllers.last_mut() {
            if let Some(landmark) = selection.filter(|_| due(SELECT_AT_MS)) {
                tracing::info!(peer = %selector.session_id(), "selecting {}", landmark.title);
                selector.sync_landmark_select(landmark);
            }
            if due(VIEW_MODE_AT_MS) {
                selector.sync_view_mode("3d");
            }
        }

        receiver.tick();
        for session in &mut controllers {
            session.tick();
        }
        now += step;
    }

    let mut peers = vec![PeerReport::new(&receiver)];
    peers.extend(controllers.iter().map(PeerReport::new));
    let receiver_camera = camera.camera();
    camera.destroy();

    Ok(SyncDemoReport {
        peers,
        receiver_camera,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinemap_core::{Landmark, LngLat};

    fn demo_config() -> CinemapConfig {
        let mut config = CinemapConfig::new("demo");
        config.landmarks = vec![
            Landmark::new("palace", "Palace", LngLat::new(126.977, 37.579)).with_category("palace")
        ];
        config
    }

    #[test]
    fn test_guards_show_up_in_report() {
        let report = run_sync_demo(&demo_config(), &SyncDemoOptions::default()).unwrap();
        assert_eq!(report.peers.len(), 3);

        let receiver = &report.peers[0];
        assert_eq!(receiver.role, SyncRole::Receiver);
        assert!(receiver.stats.applied > 0);

        let driver = &report.peers[1];
        assert_eq!(driver.label, "controller-1");
        assert!(driver.stats.sent > 0);
        assert!(driver.stats.suppressed(DropReason::InitialBlock) > 0);
        assert!(driver.stats.suppressed(DropReason::RouteAnimation) > 0);
        assert!(driver.stats.dropped(DropReason::Echo) > 0);
        assert!(driver.breakdown(SyncStats::suppressed).contains("InitialBlock="));

        for peer in &report.peers[1..] {
            assert_eq!(peer.aspect_ratio, Some(1920.0 / 1080.0));
        }
        assert!(report.receiver_camera.is_valid());
    }

    #[test]
    fn test_no_controllers() {
        let options = SyncDemoOptions {
            controllers: 0,
            duration_ms: 1000,
            step_ms: 100,
        };
        let report = run_sync_demo(&demo_config(), &options).unwrap();
        assert_eq!(report.peers.len(), 1);
        assert!(report.peers[0].stats.sent > 0);
    }
}
