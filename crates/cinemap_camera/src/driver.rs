//! Generic loop driver
//!
//! A shot is a [`ShotProgram`]: an ordered list of segments, each with its own
//! duration and easing. The engine asks the program for segment `0`, runs it
//! frame by frame until raw progress reaches 1 (or `update` returns `false`),
//! then asks for segment `1`, and so on until the program returns `None`.

use cinemap_animation::Easing;
use cinemap_core::{CameraState, ShotType};

/// Per-frame progress handed to a shot program
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameContext {
    /// Segment easing applied to `raw`
    pub eased: f64,
    /// `min(elapsed / duration, 1)`
    pub raw: f64,
    /// Milliseconds since the previous frame of this segment
    pub delta_ms: f64,
    /// Milliseconds since the segment started, paused time excluded
    pub elapsed_ms: f64,
}

/// One timed piece of a shot
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub duration_ms: f64,
    pub easing: Easing,
}

impl Segment {
    pub fn new(duration_ms: impl Into<f64>, easing: Easing) -> Self {
        Self {
            duration_ms: duration_ms.into().max(0.0),
            easing,
        }
    }

    /// A segment that only waits
    pub fn hold(duration_ms: impl Into<f64>) -> Self {
        Self::new(duration_ms, Easing::Linear)
    }

    pub(crate) fn progress(&self, elapsed_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        }
    }
}

/// A camera motion driven by the engine's frame loop.
///
/// Programs never touch the surface. They receive the engine's camera by
/// mutable reference and the engine sanitizes and applies the result.
pub trait ShotProgram {
    fn shot_type(&self) -> ShotType;

    /// Prepare segment `index`, starting from `camera`.
    ///
    /// May adjust `camera` (for a jump to a starting pose). Returning `None`
    /// ends the shot as completed.
    fn begin_segment(&mut self, index: usize, camera: &mut CameraState) -> Option<Segment>;

    /// Write this frame's camera. Returning `false` ends the current segment.
    fn update(&mut self, frame: &FrameContext, camera: &mut CameraState) -> bool;
}

/// Frame timestamps for one running loop
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LoopClock {
    start: Option<f64>,
    last: Option<f64>,
    paused_ms: f64,
}

impl LoopClock {
    /// Record a frame timestamp and return the delta since the previous one.
    ///
    /// Deltas of paused frames are excluded from [`LoopClock::elapsed`].
    pub(crate) fn tick(&mut self, timestamp: f64, paused: bool) -> f64 {
        let delta = self.last.map_or(0.0, |last| (timestamp - last).max(0.0));
        self.last = Some(timestamp);
        if self.start.is_none() {
            self.start = Some(timestamp);
        }
        if paused {
            self.paused_ms += delta;
        }
        delta
    }

    pub(crate) fn elapsed(&self) -> f64 {
        match (self.start, self.last) {
            (Some(start), Some(last)) => (last - start - self.paused_ms).max(0.0),
            _ => 0.0,
        }
    }
}

/// Closure-backed program for [`crate::CinematicCamera::custom_shot`]
pub(crate) struct CustomShot<F> {
    segment: Segment,
    update: F,
}

impl<F> CustomShot<F>
where
    F: FnMut(&FrameContext, &mut CameraState) -> bool,
{
    pub(crate) fn new(duration_ms: f64, easing: Easing, update: F) -> Self {
        Self {
            segment: Segment::new(duration_ms, easing),
            update,
        }
    }
}

impl<F> ShotProgram for CustomShot<F>
where
    F: FnMut(&FrameContext, &mut CameraState) -> bool,
{
    fn shot_type(&self) -> ShotType {
        ShotType::Custom
    }

    fn begin_segment(&mut self, index: usize, _camera: &mut CameraState) -> Option<Segment> {
        (index == 0).then(|| self.segment.clone())
    }

    fn update(&mut self, frame: &FrameContext, camera: &mut CameraState) -> bool {
        (self.update)(frame, camera)
    }
}
