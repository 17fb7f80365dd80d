//! Camera synchronizer: desired (props) vs tracked (observed) camera.
//!
//! The synchronizer never writes the tracker. A corrective command only
//! changes the engine; the tracker catches up when the engine reports the
//! change, after which the next diff is empty.

use crate::{
    core::{
        camera::{CameraPatch, CarriedCamera, DesiredCamera},
        config::CameraProps,
    },
    diagnostics::Diagnostics,
    engine::{MapHandle, MapKind, NativeEvent, NativeListener, WeakMapHandle},
    input::{
        bridge::EventBridge,
        events::{bounds_class_events, CameraEventDetail},
    },
    sync::tracker::CameraTracker,
    Result,
};
use std::{cell::RefCell, rc::Rc};

#[derive(Default)]
pub struct CameraSynchronizer {
    /// Shared with the externally-controlled guard listener
    desired: Rc<RefCell<DesiredCamera>>,
    guarded: bool,
}

impl CameraSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera handed to the engine constructor.
    ///
    /// Explicit axes win, then the axes the replaced instance had when
    /// recreating, then the `default_*` props.
    pub fn initial_camera(
        props: &CameraProps,
        kind: MapKind,
        carry_over: Option<&CarriedCamera>,
    ) -> CameraPatch {
        let carried = carry_over.map(CarriedCamera::patch).unwrap_or_default();
        props
            .desired()
            .or(carried)
            .or(props.defaults())
            .restrict_to(kind)
    }

    /// Forgets per-instance state; called whenever a new instance appears
    pub fn reset(&mut self) {
        self.guarded = false;
    }

    /// Issues at most one corrective command for this render pass
    pub fn sync(
        &mut self,
        instance: &MapHandle,
        props: &CameraProps,
        tracker: &CameraTracker,
        bridge: &mut EventBridge,
    ) -> Result<Option<CameraPatch>> {
        let desired = props.desired().restrict_to(instance.kind());
        *self.desired.borrow_mut() = desired;

        self.sync_guard(instance, props.controlled, bridge);

        let Some(patch) = desired.diff(&tracker.current()) else {
            return Ok(None);
        };

        log::debug!(
            "camera drift on {}: correcting {:?}",
            instance.id(),
            patch.axes()
        );
        instance.instance().move_camera(&patch)?;
        Ok(Some(patch))
    }

    pub fn is_guarding(&self) -> bool {
        self.guarded
    }

    fn sync_guard(&mut self, instance: &MapHandle, controlled: bool, bridge: &mut EventBridge) {
        match (controlled, self.guarded) {
            (true, false) => {
                let listener = guard_listener(
                    instance.downgrade(),
                    self.desired.clone(),
                    bridge.diagnostics().clone(),
                );
                bridge.add_guard(bounds_class_events(instance.kind()), listener);
                self.guarded = true;
                log::debug!("external camera control enabled on {}", instance.id());
            }
            (false, true) => {
                bridge.clear_guards();
                self.guarded = false;
                log::debug!("external camera control disabled on {}", instance.id());
            }
            _ => {}
        }
    }
}

/// Re-asserts the desired camera after every bounds-class event that
/// reports something else
fn guard_listener(
    instance: WeakMapHandle,
    desired: Rc<RefCell<DesiredCamera>>,
    diagnostics: Diagnostics,
) -> NativeListener {
    Rc::new(move |_: Rc<NativeEvent>| {
        let Some(source) = instance.upgrade() else {
            return;
        };

        let wanted = *desired.borrow();
        let observed = CameraEventDetail::read(&source, &diagnostics).camera();
        if wanted.diff(&observed).is_none() {
            return;
        }

        log::debug!("controlled map {} drifted; re-asserting camera", source.id());
        if let Err(e) = source.instance().move_camera(&wanted) {
            log::error!("failed to re-assert camera on {}: {}", source.id(), e);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{camera::CameraState, geo::LatLngAltitude};

    #[test]
    fn test_initial_camera_uses_defaults_once() {
        let props = CameraProps {
            default_center: Some(LatLngAltitude::new(10.0, 20.0, 0.0)),
            default_zoom: Some(5.0),
            ..Default::default()
        };

        let initial = CameraSynchronizer::initial_camera(&props, MapKind::Flat, None);
        assert_eq!(initial.center, Some(LatLngAltitude::new(10.0, 20.0, 0.0)));
        assert_eq!(initial.zoom, Some(5.0));
        assert!(props.desired().is_empty());
    }

    #[test]
    fn test_initial_camera_prefers_explicit_then_carry_over() {
        let props = CameraProps {
            zoom: Some(3.0),
            default_zoom: Some(9.0),
            default_heading: Some(45.0),
            ..Default::default()
        };
        let previous = CameraState {
            center: LatLngAltitude::new(7.0, 8.0, 0.0),
            zoom: 11.0,
            heading: 12.0,
            ..Default::default()
        };

        let carried = CarriedCamera {
            kind: MapKind::Flat,
            state: previous,
        };

        let initial = CameraSynchronizer::initial_camera(&props, MapKind::Flat, Some(&carried));
        assert_eq!(initial.zoom, Some(3.0));
        assert_eq!(initial.heading, Some(12.0));
        assert_eq!(initial.center, Some(LatLngAltitude::new(7.0, 8.0, 0.0)));
        assert_eq!(initial.range, None);
    }

    #[test]
    fn test_variant_switch_keeps_only_shared_axes() {
        let props = CameraProps {
            default_zoom: Some(4.0),
            default_range: Some(5000.0),
            ..Default::default()
        };
        let flat = CarriedCamera {
            kind: MapKind::Flat,
            state: CameraState {
                center: LatLngAltitude::new(7.0, 8.0, 0.0),
                zoom: 11.0,
                tilt: 30.0,
                ..Default::default()
            },
        };

        let globe = CameraSynchronizer::initial_camera(&props, MapKind::Globe, Some(&flat));
        assert_eq!(globe.range, Some(5000.0));
        assert_eq!(globe.roll, None);
        assert_eq!(globe.zoom, None);
        assert_eq!(globe.tilt, Some(30.0));
        assert_eq!(globe.center, Some(LatLngAltitude::new(7.0, 8.0, 0.0)));

        let globe_state = CarriedCamera {
            kind: MapKind::Globe,
            state: CameraState {
                range: 900.0,
                ..Default::default()
            },
        };
        let back = CameraSynchronizer::initial_camera(&props, MapKind::Flat, Some(&globe_state));
        assert_eq!(back.zoom, Some(4.0));
        assert_eq!(back.range, None);
    }
}
