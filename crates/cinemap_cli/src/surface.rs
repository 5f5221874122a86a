//! Simulated map surface for headless runs

use std::cell::RefCell;
use std::rc::Rc;

use cinemap_core::{CameraHandle, CameraState, SurfaceError};

#[derive(Debug, Default)]
struct SurfaceState {
    camera: CameraState,
    applied: usize,
    lost: bool,
}

/// Stands in for a live map: remembers the last camera and counts writes.
///
/// Clones share state, so a clone kept by the host can read what the engine
/// wrote after the original was handed to it.
#[derive(Clone, Debug, Default)]
pub struct SimulatedSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl SimulatedSurface {
    pub fn new(camera: CameraState) -> Self {
        Self {
            state: Rc::new(RefCell::new(SurfaceState {
                camera,
                ..Default::default()
            })),
        }
    }

    /// Number of successful applies
    pub fn applied(&self) -> usize {
        self.state.borrow().applied
    }

    /// Simulate losing (or regaining) the rendering context
    pub fn set_lost(&self, lost: bool) {
        self.state.borrow_mut().lost = lost;
    }
}

impl CameraHandle for SimulatedSurface {
    fn camera(&self) -> CameraState {
        self.state.borrow().camera
    }

    fn apply(&mut self, state: &CameraState) -> cinemap_core::Result<()> {
        if self.state.borrow().lost {
            return Err(SurfaceError::Unavailable("render context lost".into()));
        }
        if !state.is_valid() {
            return Err(SurfaceError::Apply(format!("rejected camera {state:?}")));
        }
        let mut surface = self.state.borrow_mut();
        surface.camera = *state;
        surface.applied += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinemap_core::LngLat;

    #[test]
    fn test_lost_surface_refuses_writes() {
        let mut surface = SimulatedSurface::new(CameraState::default());
        let next = CameraState::new(LngLat::new(1.0, 2.0), 11.0, 20.0, 0.0);

        surface.set_lost(true);
        assert!(matches!(
            surface.apply(&next),
            Err(SurfaceError::Unavailable(_))
        ));
        assert_eq!(surface.applied(), 0);

        surface.set_lost(false);
        surface.apply(&next).unwrap();
        assert_eq!(surface.applied(), 1);
        assert_eq!(surface.camera(), next);
    }
}
