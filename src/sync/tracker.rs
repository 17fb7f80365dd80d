//! Last camera observed from the engine for one live instance.
//!
//! Only the event bridge writes observations; the lifecycle manager seeds the
//! tracker once at construction. The synchronizer reads it as its diff
//! baseline. Observations may arrive at any point relative to a render pass,
//! so no borrow is held across calls out of this module.

use crate::core::camera::{CameraPatch, CameraState, CameraUpdate};
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

/// Hook run after every observed update so reactive hosts can re-render
pub type RerenderHook = Rc<dyn Fn()>;

#[derive(Default)]
struct TrackerCell {
    state: RefCell<CameraState>,
    revision: Cell<u64>,
    hook: RefCell<Option<RerenderHook>>,
}

#[derive(Clone, Default)]
pub struct CameraTracker {
    cell: Rc<TrackerCell>,
}

impl CameraTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> CameraState {
        *self.cell.state.borrow()
    }

    /// Bumped on every observation
    pub fn revision(&self) -> u64 {
        self.cell.revision.get()
    }

    pub fn set_rerender_hook(&self, hook: Option<RerenderHook>) {
        *self.cell.hook.borrow_mut() = hook;
    }

    /// Records a value observed from the engine and triggers re-evaluation
    pub fn observe(&self, update: CameraUpdate) {
        self.cell.state.borrow_mut().apply_update(update);
        self.cell.revision.set(self.cell.revision.get() + 1);

        let hook = self.cell.hook.borrow().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Construction-time seeding with the camera handed to the engine
    pub(crate) fn seed(&self, camera: &CameraPatch) {
        self.cell.state.borrow_mut().apply_patch(camera);
    }

    /// Back to the zero camera; used on teardown
    pub(crate) fn reset(&self) {
        *self.cell.state.borrow_mut() = CameraState::default();
        *self.cell.hook.borrow_mut() = None;
    }
}

impl fmt::Debug for CameraTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraTracker")
            .field("state", &self.current())
            .field("revision", &self.revision())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLngAltitude;

    #[test]
    fn test_starts_at_zero_camera() {
        let tracker = CameraTracker::new();
        assert_eq!(tracker.current(), CameraState::default());
        assert_eq!(tracker.revision(), 0);
    }

    #[test]
    fn test_observe_updates_one_field_and_bumps_revision() {
        let tracker = CameraTracker::new();
        tracker.seed(&CameraPatch {
            zoom: Some(3.0),
            ..Default::default()
        });
        tracker.observe(CameraUpdate::Center(LatLngAltitude::new(1.0, 1.0, 0.0)));

        let state = tracker.current();
        assert_eq!(state.center, LatLngAltitude::new(1.0, 1.0, 0.0));
        assert_eq!(state.zoom, 3.0);
        assert_eq!(tracker.revision(), 1);
    }

    #[test]
    fn test_hook_may_read_the_tracker() {
        let tracker = CameraTracker::new();
        let seen = Rc::new(Cell::new(0.0));

        let reader = tracker.clone();
        let sink = seen.clone();
        tracker.set_rerender_hook(Some(Rc::new(move || sink.set(reader.current().tilt))));
        tracker.observe(CameraUpdate::Tilt(45.0));

        assert_eq!(seen.get(), 45.0);
    }

    #[test]
    fn test_reset_clears_state_and_hook() {
        let tracker = CameraTracker::new();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        tracker.set_rerender_hook(Some(Rc::new(move || counter.set(counter.get() + 1))));
        tracker.observe(CameraUpdate::Zoom(8.0));
        tracker.reset();
        tracker.observe(CameraUpdate::Heading(10.0));

        assert_eq!(calls.get(), 1);
        assert_eq!(tracker.current().zoom, 0.0);
    }
}
