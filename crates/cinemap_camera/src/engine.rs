//! The cinematic camera engine
//!
//! [`CinematicCamera`] owns the single [`CameraState`] and at most one running
//! shot. Every frame of a shot runs in three steps:
//!
//! 1. With the engine borrowed: check the shot is still current and not
//!    cancelled, tick its clock, compute progress, take the program out.
//! 2. With no borrow held: run the program's `update`. User callbacks fire
//!    here and may call back into the engine (even start another shot).
//! 3. Borrow again: if the shot was superseded or stopped meanwhile, drop the
//!    frame. Otherwise blend breathing into the tail, sanitize, apply, and
//!    advance to the next frame or segment.
//!
//! Because a superseded shot loses its slot synchronously in
//! [`CinematicCamera`]'s shot methods, a frame from the old shot can never
//! apply after the new shot has started.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use cinemap_animation::breathing_motion;
use cinemap_animation::path::distance_meters;
use cinemap_animation::Easing;
use cinemap_core::{
    CameraHandle, CameraState, FrameHandle, FrameScheduler, Landmark, LngLat, ShotOutcome,
    ShotType,
};

use crate::config::{
    CinematicConfig, ContextualOrbitConfig, EstablishingConfig, JourneyConfig,
    LandmarkHighlightConfig, RevealConfig,
};
use crate::driver::{CustomShot, FrameContext, LoopClock, Segment, ShotProgram};
use crate::handle::{CancelToken, Completion, ShotHandle};
use crate::shots::{
    ContextualOrbitShot, EstablishingShot, JourneyShot, LabelRevealCallback,
    LandmarkHighlightShot, RevealShot, RouteDrawCallback, TravelCallback,
};

/// Called after every shot frame with `(raw_progress, shot)`
pub type ProgressCallback = Box<dyn FnMut(f64, ShotType)>;

/// What the engine is doing with the camera
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnginePhase {
    Idle,
    /// Idle with the breathing loop running
    Breathing,
    /// A shot owns the camera
    Animating,
}

/// Snapshot for display overlays
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTelemetry {
    pub camera: CameraState,
    pub phase: EnginePhase,
    pub paused: bool,
    pub shot: Option<ShotType>,
    /// Raw progress of the last shot frame
    pub progress: f64,
    /// Ground covered by the current or last shot, meters
    pub distance_m: f64,
}

struct ActiveShot {
    id: u64,
    shot_type: ShotType,
    program: Option<Box<dyn ShotProgram>>,
    segment_index: usize,
    segment: Segment,
    clock: LoopClock,
    /// Program output before tail breathing; the next frame starts from this
    base: CameraState,
    token: CancelToken,
    completion: Rc<Completion>,
    frame: Option<FrameHandle>,
}

struct BreathingLoop {
    id: u64,
    baseline: CameraState,
    clock: LoopClock,
    frame: Option<FrameHandle>,
}

struct Engine {
    this: Weak<RefCell<Engine>>,
    scheduler: Rc<dyn FrameScheduler>,
    handle: Option<Box<dyn CameraHandle>>,
    camera: CameraState,
    config: CinematicConfig,
    paused: bool,
    next_id: u64,
    active: Option<ActiveShot>,
    breathing: Option<BreathingLoop>,
    on_progress: Option<ProgressCallback>,
    last_shot: Option<ShotType>,
    last_progress: f64,
    distance_m: f64,
}

impl Engine {
    fn phase(&self) -> EnginePhase {
        if self.active.is_some() {
            EnginePhase::Animating
        } else if self.breathing.is_some() {
            EnginePhase::Breathing
        } else {
            EnginePhase::Idle
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Current camera as the surface reports it, falling back to our copy
    fn read_surface(&self) -> CameraState {
        self.handle
            .as_ref()
            .and_then(|handle| handle.camera().sanitized())
            .unwrap_or(self.camera)
    }

    /// Sanitize, store and apply. Returns `false` for a non-finite state,
    /// which is never applied.
    fn commit(&mut self, state: CameraState) -> bool {
        let Some(clean) = state.sanitized() else {
            tracing::warn!(?state, "discarding non-finite camera state");
            return false;
        };
        self.camera = clean;
        if let Some(handle) = self.handle.as_mut() {
            if let Err(err) = handle.apply(&clean) {
                tracing::warn!(%err, "camera apply failed");
            }
        }
        true
    }

    fn schedule_shot_frame(&mut self, id: u64) {
        let weak = self.this.clone();
        let frame = self
            .scheduler
            .schedule_frame(Box::new(move |ts| run_shot_frame(&weak, id, ts)));
        if let Some(active) = self.active.as_mut() {
            active.frame = Some(frame);
        }
    }

    fn schedule_breathing_frame(&mut self, id: u64) {
        let weak = self.this.clone();
        let frame = self
            .scheduler
            .schedule_frame(Box::new(move |ts| run_breathing_frame(&weak, id, ts)));
        if let Some(breathing) = self.breathing.as_mut() {
            breathing.frame = Some(frame);
        }
    }

    /// End the running shot, if any, and resolve its handle
    fn finish_active(&mut self, outcome: ShotOutcome) {
        let Some(active) = self.active.take() else {
            return;
        };
        if let Some(frame) = active.frame {
            self.scheduler.cancel_frame(frame);
        }
        if outcome.is_cancelled() {
            active.token.cancel();
        }
        self.paused = false;
        active.completion.resolve(outcome);
        tracing::debug!(shot = %active.shot_type, id = active.id, ?outcome, "shot finished");
    }

    fn stop_breathing(&mut self) {
        if let Some(breathing) = self.breathing.take() {
            if let Some(frame) = breathing.frame {
                self.scheduler.cancel_frame(frame);
            }
            tracing::trace!("breathing stopped");
        }
    }

    fn start_shot(&mut self, mut program: Box<dyn ShotProgram>) -> ShotHandle {
        let shot_type = program.shot_type();
        if self.handle.is_none() {
            tracing::debug!(shot = %shot_type, "no camera handle, shot rejected");
            return ShotHandle::resolved(ShotOutcome::Cancelled);
        }

        // The previous writer must be gone before this one touches the camera
        self.finish_active(ShotOutcome::Cancelled);
        self.stop_breathing();

        let mut camera = self.read_surface();
        let Some(segment) = program.begin_segment(0, &mut camera) else {
            tracing::debug!(shot = %shot_type, "shot has no segments");
            return ShotHandle::resolved(ShotOutcome::Completed);
        };
        self.camera = camera;

        let id = self.next_id();
        let token = CancelToken::new();
        let completion = Rc::new(Completion::default());
        self.active = Some(ActiveShot {
            id,
            shot_type,
            program: Some(program),
            segment_index: 0,
            segment,
            clock: LoopClock::default(),
            base: camera,
            token: token.clone(),
            completion: completion.clone(),
            frame: None,
        });
        self.last_shot = Some(shot_type);
        self.last_progress = 0.0;
        self.distance_m = 0.0;
        self.schedule_shot_frame(id);

        tracing::debug!(shot = %shot_type, id, "shot started");
        ShotHandle::new(token, completion)
    }
}

/// Steps 1 and 2 of a shot frame; step 3 is [`finish_shot_frame`]
fn run_shot_frame(weak: &Weak<RefCell<Engine>>, id: u64, timestamp: f64) {
    let Some(cell) = weak.upgrade() else {
        return;
    };

    let (mut program, frame, mut camera, shot_type) = {
        let mut engine = cell.borrow_mut();
        let paused = engine.paused;
        let Some(active) = engine.active.as_mut().filter(|active| active.id == id) else {
            return;
        };
        active.frame = None;
        if active.token.is_cancelled() {
            engine.finish_active(ShotOutcome::Cancelled);
            return;
        }

        let delta_ms = active.clock.tick(timestamp, paused);
        if paused {
            engine.schedule_shot_frame(id);
            return;
        }

        let elapsed_ms = active.clock.elapsed();
        let raw = active.segment.progress(elapsed_ms);
        let frame = FrameContext {
            eased: active.segment.easing.apply(raw),
            raw,
            delta_ms,
            elapsed_ms,
        };
        let shot_type = active.shot_type;
        let camera = active.base;
        let Some(program) = active.program.take() else {
            return;
        };
        (program, frame, camera, shot_type)
    };

    let keep_going = program.update(&frame, &mut camera);

    if finish_shot_frame(&cell, id, program, &frame, camera, keep_going) {
        report_progress(&cell, frame.raw, shot_type);
    }
}

/// Commit a computed frame and schedule what comes next.
///
/// Returns `false` when the frame was discarded.
fn finish_shot_frame(
    cell: &RefCell<Engine>,
    id: u64,
    mut program: Box<dyn ShotProgram>,
    frame: &FrameContext,
    camera: CameraState,
    keep_going: bool,
) -> bool {
    let mut engine = cell.borrow_mut();
    let cancelled = match engine.active.as_ref() {
        Some(active) if active.id == id => active.token.is_cancelled(),
        // Superseded or stopped during update; its handle is already resolved
        _ => return false,
    };
    if cancelled {
        engine.finish_active(ShotOutcome::Cancelled);
        return false;
    }

    // Breathing goes on the applied copy only, never into the base state
    let mut shown = camera;
    let cfg = &engine.config;
    if cfg.breathing_enabled && frame.raw > cfg.breathing_blend_start {
        let span = (1.0 - cfg.breathing_blend_start).max(f64::EPSILON);
        let weight = ((frame.raw - cfg.breathing_blend_start) / span).min(1.0);
        let offsets = breathing_motion(frame.elapsed_ms).scaled(weight * cfg.breathing_intensity);
        shown.pitch += offsets.pitch;
        shown.bearing += offsets.bearing;
        shown.zoom += offsets.zoom;
    }

    let before = engine.camera.center;
    if engine.commit(shown) {
        let travelled = distance_meters(before, engine.camera.center);
        engine.distance_m += travelled;
        if let (Some(active), Some(base)) = (engine.active.as_mut(), camera.sanitized()) {
            active.base = base;
        }
    }
    engine.last_progress = frame.raw;

    if frame.raw < 1.0 && keep_going {
        if let Some(active) = engine.active.as_mut() {
            active.program = Some(program);
        }
        engine.schedule_shot_frame(id);
        return true;
    }

    let (index, mut start) = engine
        .active
        .as_ref()
        .map_or((1, engine.camera), |active| (active.segment_index + 1, active.base));
    match program.begin_segment(index, &mut start) {
        Some(segment) => {
            if let Some(active) = engine.active.as_mut() {
                active.program = Some(program);
                active.segment_index = index;
                active.segment = segment;
                active.clock = LoopClock::default();
                active.base = start;
            }
            tracing::trace!(id, index, "next segment");
            engine.schedule_shot_frame(id);
        }
        None => engine.finish_active(ShotOutcome::Completed),
    }
    true
}

fn report_progress(cell: &RefCell<Engine>, raw: f64, shot_type: ShotType) {
    let callback = cell.borrow_mut().on_progress.take();
    if let Some(mut callback) = callback {
        callback(raw, shot_type);
        let mut engine = cell.borrow_mut();
        // The callback may have installed a replacement
        if engine.on_progress.is_none() {
            engine.on_progress = Some(callback);
        }
    }
}

fn run_breathing_frame(weak: &Weak<RefCell<Engine>>, id: u64, timestamp: f64) {
    let Some(cell) = weak.upgrade() else {
        return;
    };
    let mut engine = cell.borrow_mut();
    if engine.active.is_some() {
        engine.stop_breathing();
        return;
    }
    let intensity = engine.config.breathing_intensity;
    let Some(breathing) = engine.breathing.as_mut().filter(|b| b.id == id) else {
        return;
    };
    breathing.frame = None;
    breathing.clock.tick(timestamp, false);

    let offsets = breathing_motion(breathing.clock.elapsed()).scaled(intensity);
    let mut camera = breathing.baseline;
    camera.pitch += offsets.pitch;
    camera.bearing += offsets.bearing;
    camera.zoom += offsets.zoom;

    engine.commit(camera);
    engine.schedule_breathing_frame(id);
}

/// Handle for a shot refused over a non-finite target
fn rejected(shot: ShotType, target: LngLat) -> ShotHandle {
    tracing::debug!(%shot, ?target, "non-finite shot target");
    ShotHandle::resolved(ShotOutcome::Cancelled)
}

/// Frame-driven cinematic camera over a live map surface.
///
/// Cloning yields another handle to the same engine.
///
/// ```
/// use std::rc::Rc;
/// use cinemap_camera::{CinematicCamera, EstablishingConfig};
/// use cinemap_core::{CameraHandle, CameraState, LngLat, ManualScheduler};
///
/// #[derive(Default)]
/// struct Surface(CameraState);
///
/// impl CameraHandle for Surface {
///     fn camera(&self) -> CameraState {
///         self.0
///     }
///     fn apply(&mut self, state: &CameraState) -> cinemap_core::Result<()> {
///         self.0 = *state;
///         Ok(())
///     }
/// }
///
/// let scheduler = Rc::new(ManualScheduler::new());
/// let camera = CinematicCamera::new(Surface::default(), scheduler.clone());
/// let shot = camera.establishing_shot(LngLat::new(2.35, 48.85), EstablishingConfig::default());
///
/// let mut now = 0.0;
/// while !shot.is_finished() {
///     scheduler.run_frame(now);
///     now += 16.0;
/// }
/// assert!((camera.camera().zoom - 12.5).abs() < 0.1);
/// ```
#[derive(Clone)]
pub struct CinematicCamera {
    engine: Rc<RefCell<Engine>>,
}

impl CinematicCamera {
    pub fn new(handle: impl CameraHandle + 'static, scheduler: Rc<dyn FrameScheduler>) -> Self {
        Self::with_config(handle, scheduler, CinematicConfig::default())
    }

    pub fn with_config(
        handle: impl CameraHandle + 'static,
        scheduler: Rc<dyn FrameScheduler>,
        config: CinematicConfig,
    ) -> Self {
        let camera = handle.camera().sanitized().unwrap_or_default();
        let engine = Rc::new_cyclic(|this| {
            RefCell::new(Engine {
                this: this.clone(),
                scheduler,
                handle: Some(Box::new(handle)),
                camera,
                config,
                paused: false,
                next_id: 0,
                active: None,
                breathing: None,
                on_progress: None,
                last_shot: None,
                last_progress: 0.0,
                distance_m: 0.0,
            })
        });
        Self { engine }
    }

    pub fn config(&self) -> CinematicConfig {
        self.engine.borrow().config.clone()
    }

    pub fn set_config(&self, config: CinematicConfig) {
        self.engine.borrow_mut().config = config;
    }

    /// Register the per-frame progress callback, replacing any previous one
    pub fn on_progress(&self, callback: impl FnMut(f64, ShotType) + 'static) {
        self.engine.borrow_mut().on_progress = Some(Box::new(callback));
    }

    /// The engine's copy of the camera (last state applied)
    pub fn camera(&self) -> CameraState {
        self.engine.borrow().camera
    }

    pub fn phase(&self) -> EnginePhase {
        self.engine.borrow().phase()
    }

    pub fn is_paused(&self) -> bool {
        self.engine.borrow().paused
    }

    pub fn current_shot(&self) -> Option<ShotType> {
        self.engine.borrow().active.as_ref().map(|active| active.shot_type)
    }

    pub fn telemetry(&self) -> CameraTelemetry {
        let engine = self.engine.borrow();
        CameraTelemetry {
            camera: engine.camera,
            phase: engine.phase(),
            paused: engine.paused,
            shot: engine.active.as_ref().map(|a| a.shot_type).or(engine.last_shot),
            progress: engine.last_progress,
            distance_m: engine.distance_m,
        }
    }

    /// Run any [`ShotProgram`], superseding the current shot
    pub fn play(&self, program: impl ShotProgram + 'static) -> ShotHandle {
        self.engine.borrow_mut().start_shot(Box::new(program))
    }

    /// Descend onto `target` from a high, flat starting pose
    pub fn establishing_shot(&self, target: LngLat, config: EstablishingConfig) -> ShotHandle {
        if !target.is_finite() {
            return rejected(ShotType::Establishing, target);
        }
        self.play(EstablishingShot::new(target, config))
    }

    /// Fly along `route` at constant ground speed.
    ///
    /// Fewer than two coordinates, or any non-finite one, resolves `Cancelled`
    /// at once without touching the camera.
    pub fn journey_shot(
        &self,
        route: &[LngLat],
        config: JourneyConfig,
        on_draw_route: Option<RouteDrawCallback>,
    ) -> ShotHandle {
        match JourneyShot::new(route, config, on_draw_route) {
            Some(shot) => self.play(shot),
            None => {
                tracing::debug!(points = route.len(), "journey needs two or more finite coordinates");
                ShotHandle::resolved(ShotOutcome::Cancelled)
            }
        }
    }

    pub fn reveal_shot(&self, destination: LngLat, config: RevealConfig) -> ShotHandle {
        if !destination.is_finite() {
            return rejected(ShotType::Reveal, destination);
        }
        self.play(RevealShot::new(destination, config))
    }

    /// Approach, transition onto an orbit, then circle the landmark.
    ///
    /// A landmark without coordinates resolves `Cancelled` at once.
    pub fn landmark_highlight(
        &self,
        landmark: &Landmark,
        config: LandmarkHighlightConfig,
        on_travel: Option<TravelCallback>,
    ) -> ShotHandle {
        match landmark.coordinates {
            Some(target) if target.is_finite() => {
                self.play(LandmarkHighlightShot::new(target, config, on_travel))
            }
            Some(target) => rejected(ShotType::LandmarkHighlight, target),
            None => {
                tracing::debug!(landmark = %landmark.id, "landmark has no coordinates");
                ShotHandle::resolved(ShotOutcome::Cancelled)
            }
        }
    }

    pub fn contextual_orbit(
        &self,
        center: LngLat,
        config: ContextualOrbitConfig,
        on_label_reveal: Option<LabelRevealCallback>,
    ) -> ShotHandle {
        if !center.is_finite() {
            return rejected(ShotType::ContextualOrbit, center);
        }
        self.play(ContextualOrbitShot::new(center, config, on_label_reveal))
    }

    /// Drive the camera with a closure for `duration_ms`.
    ///
    /// `update` receives the frame progress and the camera to write; returning
    /// `false` ends the shot early.
    pub fn custom_shot(
        &self,
        duration_ms: f64,
        easing: Easing,
        update: impl FnMut(&FrameContext, &mut CameraState) -> bool + 'static,
    ) -> ShotHandle {
        self.play(CustomShot::new(duration_ms, easing, update))
    }

    /// Start the idle breathing loop around the current camera.
    ///
    /// Returns `false` while a shot is animating or after [`Self::destroy`].
    pub fn start_breathing(&self) -> bool {
        let mut engine = self.engine.borrow_mut();
        if engine.active.is_some() || engine.handle.is_none() {
            return false;
        }
        engine.stop_breathing();
        let baseline = engine.read_surface();
        engine.camera = baseline;
        let id = engine.next_id();
        engine.breathing = Some(BreathingLoop {
            id,
            baseline,
            clock: LoopClock::default(),
            frame: None,
        });
        engine.schedule_breathing_frame(id);
        tracing::trace!(id, "breathing started");
        true
    }

    pub fn stop_breathing(&self) {
        self.engine.borrow_mut().stop_breathing();
    }

    /// Cancel the running shot and breathing. No frame of either applies
    /// after this returns.
    pub fn stop(&self) {
        let mut engine = self.engine.borrow_mut();
        engine.finish_active(ShotOutcome::Cancelled);
        engine.stop_breathing();
        engine.paused = false;
    }

    /// Freeze the running shot. Paused time does not count towards progress.
    pub fn pause(&self) {
        let mut engine = self.engine.borrow_mut();
        if engine.active.is_some() && !engine.paused {
            engine.paused = true;
            tracing::debug!("shot paused");
        }
    }

    pub fn resume(&self) {
        let mut engine = self.engine.borrow_mut();
        if engine.paused {
            engine.paused = false;
            tracing::debug!("shot resumed");
        }
    }

    /// Stop everything and release the camera handle. Later shots resolve
    /// `Cancelled` immediately.
    pub fn destroy(&self) {
        let mut engine = self.engine.borrow_mut();
        engine.finish_active(ShotOutcome::Cancelled);
        engine.stop_breathing();
        engine.handle = None;
        engine.on_progress = None;
        tracing::debug!("camera engine destroyed");
    }

    /// Write a camera from outside (a remote peer) while no shot owns it.
    ///
    /// Returns `false`, leaving everything untouched, while a shot is
    /// animating or when the state is not finite. A running breathing loop is
    /// rebased onto the new camera.
    pub fn apply_external(&self, state: &CameraState) -> bool {
        let mut engine = self.engine.borrow_mut();
        if engine.active.is_some() {
            tracing::trace!("external camera ignored while animating");
            return false;
        }
        let Some(clean) = state.sanitized() else {
            return false;
        };
        if let Some(breathing) = engine.breathing.as_mut() {
            breathing.baseline = clean;
        }
        engine.commit(clean)
    }
}

impl std::fmt::Debug for CinematicCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.engine.try_borrow() {
            Ok(engine) => f
                .debug_struct("CinematicCamera")
                .field("phase", &engine.phase())
                .field("paused", &engine.paused)
                .field("camera", &engine.camera)
                .finish(),
            Err(_) => f.write_str("CinematicCamera { <busy> }"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinemap_core::ManualScheduler;

    struct Surface(CameraState);

    impl CameraHandle for Surface {
        fn camera(&self) -> CameraState {
            self.0
        }

        fn apply(&mut self, state: &CameraState) -> cinemap_core::Result<()> {
            self.0 = *state;
            Ok(())
        }
    }

    fn engine() -> (CinematicCamera, Rc<ManualScheduler>) {
        let scheduler = Rc::new(ManualScheduler::new());
        let camera = CinematicCamera::new(Surface(CameraState::default()), scheduler.clone());
        (camera, scheduler)
    }

    #[test]
    fn test_phase_follows_shot_lifecycle() {
        let (camera, scheduler) = engine();
        assert_eq!(camera.phase(), EnginePhase::Idle);

        let shot = camera.custom_shot(100.0, Easing::Linear, |_, _| true);
        assert_eq!(camera.phase(), EnginePhase::Animating);
        assert_eq!(camera.current_shot(), Some(ShotType::Custom));

        scheduler.run_frame(0.0);
        scheduler.run_frame(100.0);
        assert_eq!(shot.outcome(), Some(ShotOutcome::Completed));
        assert_eq!(camera.phase(), EnginePhase::Idle);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_update_returning_false_ends_early() {
        let (camera, scheduler) = engine();
        let shot = camera.custom_shot(10_000.0, Easing::Linear, |frame, _| frame.elapsed_ms < 50.0);
        for ts in [0.0, 16.0, 32.0, 48.0, 64.0] {
            scheduler.run_frame(ts);
        }
        assert_eq!(shot.outcome(), Some(ShotOutcome::Completed));
    }

    #[test]
    fn test_breathing_refused_while_animating() {
        let (camera, _scheduler) = engine();
        let _shot = camera.custom_shot(1000.0, Easing::Linear, |_, _| true);
        assert!(!camera.start_breathing());
    }

    #[test]
    fn test_destroy_rejects_later_shots() {
        let (camera, scheduler) = engine();
        camera.destroy();
        let shot = camera.reveal_shot(LngLat::new(1.0, 1.0), RevealConfig::default());
        assert_eq!(shot.outcome(), Some(ShotOutcome::Cancelled));
        assert!(!scheduler.has_pending());
        assert!(!camera.start_breathing());
    }

    #[test]
    fn test_telemetry_tracks_distance() {
        let (camera, scheduler) = engine();
        let shot = camera.custom_shot(100.0, Easing::Linear, |frame, cam| {
            cam.center = LngLat::new(0.01 * frame.eased, 0.0);
            true
        });
        scheduler.run_frame(0.0);
        scheduler.run_frame(100.0);
        assert!(shot.is_finished());

        let telemetry = camera.telemetry();
        assert_eq!(telemetry.shot, Some(ShotType::Custom));
        assert_eq!(telemetry.progress, 1.0);
        assert!((telemetry.distance_m - 1113.2).abs() < 1e-6);
    }
}
