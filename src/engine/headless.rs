//! In-memory engine with a call journal.
//!
//! Behaves like a simple add/remove-listener map engine: camera commands
//! change state synchronously and, unless disabled, emit one change event
//! per axis that actually moved followed by the aggregate camera event.

use crate::{
    core::{
        camera::{CameraAxis, CameraPatch, CameraState},
        config::MapOptions,
        geo::{LatLng, LatLngAltitude, LatLngBounds},
    },
    engine::{
        loader::{EngineLoader, LoadFailure, LoaderParams},
        ConstructionOptions, ListenerId, MapEngine, MapInstance, MapKind, MountPoint, NativeEvent,
        NativeListener,
    },
    input::events::EventKind,
    prelude::HashSet,
    Error, Result,
};
use async_trait::async_trait;
use futures::channel::oneshot;
use serde::{Deserialize, Serialize};
use std::{
    any::Any,
    cell::{Cell, RefCell},
    rc::Rc,
};

/// One journaled engine call. `serial` identifies the instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum EngineCall {
    Create {
        serial: u64,
        mount: MountPoint,
        kind: MapKind,
        camera: CameraPatch,
        options: MapOptions,
    },
    AddListener {
        serial: u64,
        event: String,
        listener: ListenerId,
    },
    RemoveListener {
        serial: u64,
        listener: ListenerId,
    },
    MoveCamera {
        serial: u64,
        patch: CameraPatch,
    },
    SetOptions {
        serial: u64,
        options: MapOptions,
    },
    FitBounds {
        serial: u64,
        bounds: LatLngBounds,
        padding: f64,
    },
    Remount {
        serial: u64,
        mount: MountPoint,
    },
    Destroy {
        serial: u64,
    },
}

impl EngineCall {
    pub fn serial(&self) -> u64 {
        match self {
            EngineCall::Create { serial, .. }
            | EngineCall::AddListener { serial, .. }
            | EngineCall::RemoveListener { serial, .. }
            | EngineCall::MoveCamera { serial, .. }
            | EngineCall::SetOptions { serial, .. }
            | EngineCall::FitBounds { serial, .. }
            | EngineCall::Remount { serial, .. }
            | EngineCall::Destroy { serial } => *serial,
        }
    }
}

type Journal = Rc<RefCell<Vec<EngineCall>>>;

#[derive(Default)]
pub struct HeadlessEngine {
    journal: Journal,
    instances: RefCell<Vec<Rc<HeadlessInstance>>>,
    next_serial: Cell<u64>,
    silent: Rc<Cell<bool>>,
    fail_next_create: RefCell<Option<String>>,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far, in order
    pub fn journal(&self) -> Vec<EngineCall> {
        self.journal.borrow().clone()
    }

    pub fn clear_journal(&self) {
        self.journal.borrow_mut().clear();
    }

    /// Camera commands issued after construction, in order
    pub fn camera_commands(&self) -> Vec<CameraPatch> {
        self.journal
            .borrow()
            .iter()
            .filter_map(|call| match call {
                EngineCall::MoveCamera { patch, .. } => Some(*patch),
                _ => None,
            })
            .collect()
    }

    pub fn created_count(&self) -> usize {
        self.instances.borrow().len()
    }

    pub fn last_instance(&self) -> Option<Rc<HeadlessInstance>> {
        self.instances.borrow().last().cloned()
    }

    pub fn instances(&self) -> Vec<Rc<HeadlessInstance>> {
        self.instances.borrow().clone()
    }

    /// Stops emitting change events for camera commands, like an engine
    /// that coalesces or suppresses them
    pub fn set_silent(&self, silent: bool) {
        self.silent.set(silent);
    }

    /// The next `create_map` fails with `message`
    pub fn fail_next_create(&self, message: impl Into<String>) {
        *self.fail_next_create.borrow_mut() = Some(message.into());
    }
}

impl MapEngine for HeadlessEngine {
    fn create_map(
        &self,
        mount: &MountPoint,
        kind: MapKind,
        options: &ConstructionOptions,
    ) -> Result<Rc<dyn MapInstance>> {
        if let Some(message) = self.fail_next_create.borrow_mut().take() {
            return Err(Error::Engine(message));
        }

        let serial = self.next_serial.get() + 1;
        self.next_serial.set(serial);

        let mut camera = CameraState::default();
        camera.apply_patch(&options.camera);

        self.journal.borrow_mut().push(EngineCall::Create {
            serial,
            mount: mount.clone(),
            kind,
            camera: options.camera,
            options: options.options.clone(),
        });

        let instance = Rc::new(HeadlessInstance {
            serial,
            kind,
            journal: self.journal.clone(),
            silent: self.silent.clone(),
            state: RefCell::new(InstanceState {
                camera,
                options: options.options.clone(),
                mount: mount.clone(),
                destroyed: false,
                unreadable: HashSet::default(),
            }),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
        });
        self.instances.borrow_mut().push(instance.clone());

        let instance: Rc<dyn MapInstance> = instance;
        Ok(instance)
    }
}

struct InstanceState {
    camera: CameraState,
    options: MapOptions,
    mount: MountPoint,
    destroyed: bool,
    unreadable: HashSet<CameraAxis>,
}

struct Registered {
    id: ListenerId,
    event: String,
    callback: NativeListener,
}

pub struct HeadlessInstance {
    serial: u64,
    kind: MapKind,
    journal: Journal,
    silent: Rc<Cell<bool>>,
    state: RefCell<InstanceState>,
    listeners: RefCell<Vec<Registered>>,
    next_listener: Cell<u64>,
}

impl HeadlessInstance {
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn camera(&self) -> CameraState {
        self.state.borrow().camera
    }

    pub fn options(&self) -> MapOptions {
        self.state.borrow().options.clone()
    }

    pub fn mount(&self) -> MountPoint {
        self.state.borrow().mount.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn listeners_for(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|registered| registered.event == event)
            .count()
    }

    /// Makes the accessor for `axis` report nothing
    pub fn set_unreadable(&self, axis: CameraAxis, unreadable: bool) {
        let mut state = self.state.borrow_mut();
        if unreadable {
            state.unreadable.insert(axis);
        } else {
            state.unreadable.remove(&axis);
        }
    }

    /// Engine-driven camera change (user gesture, animation)
    pub fn simulate_camera(&self, patch: &CameraPatch) {
        self.apply_camera(patch, true);
    }

    /// Pointer click with an optional place id; clicks are cancellable
    pub fn click(&self, at: LatLngAltitude, place_id: Option<&str>) -> Rc<NativeEvent> {
        let name = EventKind::Click
            .native_names(self.kind)
            .first()
            .copied()
            .unwrap_or("click");
        let mut event = NativeEvent::new(name).with_location(at).stoppable();
        if let Some(place_id) = place_id {
            event = event.with_place_id(place_id);
        }
        self.emit(event)
    }

    /// Dispatches `event` to every listener registered for its name.
    /// Listeners may call back into the instance.
    pub fn emit(&self, event: NativeEvent) -> Rc<NativeEvent> {
        let event = Rc::new(event);
        if self.is_destroyed() {
            return event;
        }

        let targets: Vec<NativeListener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|registered| registered.event == event.name)
            .map(|registered| registered.callback.clone())
            .collect();

        for target in targets {
            target(event.clone());
        }
        event
    }

    fn record(&self, call: EngineCall) {
        self.journal.borrow_mut().push(call);
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_destroyed() {
            return Err(Error::Engine(format!(
                "headless map {} has been destroyed",
                self.serial
            )));
        }
        Ok(())
    }

    fn apply_camera(&self, patch: &CameraPatch, notify: bool) {
        let moved: Vec<CameraAxis> = {
            let mut state = self.state.borrow_mut();
            let before = state.camera;
            state.camera.apply_patch(&patch.restrict_to(self.kind));
            let after = state.camera;
            CameraAxis::ALL
                .into_iter()
                .filter(|axis| axis.applies_to(self.kind) && axis_changed(*axis, &before, &after))
                .collect()
        };

        if !notify || moved.is_empty() {
            return;
        }

        for axis in &moved {
            for name in axis_event(*axis).native_names(self.kind) {
                self.emit(NativeEvent::new(*name));
            }
        }
        if self.kind == MapKind::Flat {
            self.emit(NativeEvent::new("bounds_changed"));
        }
    }
}

fn axis_event(axis: CameraAxis) -> EventKind {
    match axis {
        CameraAxis::Center => EventKind::CenterChanged,
        CameraAxis::Zoom => EventKind::ZoomChanged,
        CameraAxis::Range => EventKind::RangeChanged,
        CameraAxis::Heading => EventKind::HeadingChanged,
        CameraAxis::Tilt => EventKind::TiltChanged,
        CameraAxis::Roll => EventKind::RollChanged,
    }
}

fn axis_changed(axis: CameraAxis, before: &CameraState, after: &CameraState) -> bool {
    match axis {
        CameraAxis::Center => before.center != after.center,
        CameraAxis::Zoom => before.zoom != after.zoom,
        CameraAxis::Range => before.range != after.range,
        CameraAxis::Heading => before.heading != after.heading,
        CameraAxis::Tilt => before.tilt != after.tilt,
        CameraAxis::Roll => before.roll != after.roll,
    }
}

impl HeadlessInstance {
    fn read<T>(&self, axis: CameraAxis, value: impl FnOnce(&CameraState) -> T) -> Option<T> {
        let state = self.state.borrow();
        if !axis.applies_to(self.kind) || state.unreadable.contains(&axis) {
            return None;
        }
        Some(value(&state.camera))
    }
}

impl MapInstance for HeadlessInstance {
    fn kind(&self) -> MapKind {
        self.kind
    }

    fn center(&self) -> Option<LatLngAltitude> {
        self.read(CameraAxis::Center, |camera| camera.center)
    }

    fn zoom(&self) -> Option<f64> {
        self.read(CameraAxis::Zoom, |camera| camera.zoom)
    }

    fn range(&self) -> Option<f64> {
        self.read(CameraAxis::Range, |camera| camera.range)
    }

    fn heading(&self) -> Option<f64> {
        self.read(CameraAxis::Heading, |camera| camera.heading)
    }

    fn tilt(&self) -> Option<f64> {
        self.read(CameraAxis::Tilt, |camera| camera.tilt)
    }

    fn roll(&self) -> Option<f64> {
        self.read(CameraAxis::Roll, |camera| camera.roll)
    }

    /// Viewport for a square 256px-per-tile view; the 3-D element has none
    fn bounds(&self) -> Option<LatLngBounds> {
        if self.kind == MapKind::Globe {
            return None;
        }
        let center = self.center()?;
        let zoom = self.zoom()?;

        let lng_span = (360.0 / 2f64.powf(zoom)).min(360.0);
        let lat_span = (180.0 / 2f64.powf(zoom)).min(180.0);
        Some(LatLngBounds::from_coords(
            (center.lat - lat_span / 2.0).max(-90.0),
            center.lng - lng_span / 2.0,
            (center.lat + lat_span / 2.0).min(90.0),
            center.lng + lng_span / 2.0,
        ))
    }

    fn move_camera(&self, patch: &CameraPatch) -> Result<()> {
        self.ensure_live()?;
        self.record(EngineCall::MoveCamera {
            serial: self.serial,
            patch: *patch,
        });
        self.apply_camera(patch, !self.silent.get());
        Ok(())
    }

    fn set_options(&self, options: &MapOptions) -> Result<()> {
        self.ensure_live()?;
        self.record(EngineCall::SetOptions {
            serial: self.serial,
            options: options.clone(),
        });
        self.state.borrow_mut().options = options.clone();
        Ok(())
    }

    fn fit_bounds(&self, bounds: &LatLngBounds, padding: f64) -> Result<()> {
        self.ensure_live()?;
        self.record(EngineCall::FitBounds {
            serial: self.serial,
            bounds: *bounds,
            padding,
        });

        if bounds.is_empty() {
            return Ok(());
        }
        let LatLng { lat, lng } = bounds.center();
        let span = bounds.span();
        let widest = (span.lng).max(span.lat * 2.0).max(f64::MIN_POSITIVE);
        let patch = CameraPatch {
            center: Some(LatLngAltitude::new(lat, lng, 0.0)),
            zoom: Some((360.0 / widest).log2().clamp(0.0, 22.0)),
            ..Default::default()
        };
        self.apply_camera(&patch, !self.silent.get());
        Ok(())
    }

    fn add_listener(&self, event: &str, listener: NativeListener) -> ListenerId {
        let id = ListenerId(self.next_listener.get() + 1);
        self.next_listener.set(id.0);
        self.listeners.borrow_mut().push(Registered {
            id,
            event: event.to_string(),
            callback: listener,
        });
        self.record(EngineCall::AddListener {
            serial: self.serial,
            event: event.to_string(),
            listener: id,
        });
        id
    }

    fn remove_listener(&self, listener: ListenerId) {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            let before = listeners.len();
            listeners.retain(|registered| registered.id != listener);
            before != listeners.len()
        };
        if removed {
            self.record(EngineCall::RemoveListener {
                serial: self.serial,
                listener,
            });
        }
    }

    fn remount(&self, mount: &MountPoint) -> Result<()> {
        self.ensure_live()?;
        self.record(EngineCall::Remount {
            serial: self.serial,
            mount: mount.clone(),
        });
        self.state.borrow_mut().mount = mount.clone();
        Ok(())
    }

    fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        self.record(EngineCall::Destroy {
            serial: self.serial,
        });
        self.state.borrow_mut().destroyed = true;
        self.listeners.borrow_mut().clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Scripted loader; resolves immediately or when the paired sender fires
pub struct HeadlessLoader {
    outcome: std::result::Result<(), LoadFailure>,
    pending: RefCell<Option<oneshot::Receiver<std::result::Result<(), LoadFailure>>>>,
    missing_libraries: HashSet<String>,
    loads: Cell<usize>,
}

impl HeadlessLoader {
    pub fn succeeding() -> Self {
        Self::with_outcome(Ok(()))
    }

    pub fn failing(failure: LoadFailure) -> Self {
        Self::with_outcome(Err(failure))
    }

    /// The first `load` waits for the returned sender
    pub fn deferred() -> (Self, oneshot::Sender<std::result::Result<(), LoadFailure>>) {
        let (tx, rx) = oneshot::channel();
        let loader = Self::succeeding();
        *loader.pending.borrow_mut() = Some(rx);
        (loader, tx)
    }

    fn with_outcome(outcome: std::result::Result<(), LoadFailure>) -> Self {
        Self {
            outcome,
            pending: RefCell::new(None),
            missing_libraries: HashSet::default(),
            loads: Cell::new(0),
        }
    }

    /// `import_library(name)` fails for this library
    pub fn without_library(mut self, name: impl Into<String>) -> Self {
        self.missing_libraries.insert(name.into());
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.get()
    }
}

#[async_trait(?Send)]
impl EngineLoader for HeadlessLoader {
    async fn load(&self, _params: &LoaderParams) -> std::result::Result<(), LoadFailure> {
        self.loads.set(self.loads.get() + 1);

        let pending = self.pending.borrow_mut().take();
        match pending {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(LoadFailure::Failed("load cancelled".to_string()))),
            None => self.outcome.clone(),
        }
    }

    async fn import_library(&self, name: &str) -> std::result::Result<(), LoadFailure> {
        if self.missing_libraries.contains(name) {
            return Err(LoadFailure::Failed(format!("unknown library '{}'", name)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(engine: &HeadlessEngine) -> Rc<HeadlessInstance> {
        engine
            .create_map(&MountPoint::new("root"), MapKind::Flat, &ConstructionOptions::default())
            .unwrap();
        engine.last_instance().unwrap()
    }

    #[test]
    fn test_move_emits_only_changed_axes() {
        let engine = HeadlessEngine::new();
        let instance = flat(&engine);
        let seen = Rc::new(RefCell::new(Vec::new()));

        for name in ["center_changed", "zoom_changed", "bounds_changed"] {
            let sink = seen.clone();
            instance.add_listener(
                name,
                Rc::new(move |event: Rc<NativeEvent>| sink.borrow_mut().push(event.name.clone())),
            );
        }

        instance
            .move_camera(&CameraPatch {
                zoom: Some(4.0),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(*seen.borrow(), vec!["zoom_changed", "bounds_changed"]);
    }

    #[test]
    fn test_silent_engine_still_moves() {
        let engine = HeadlessEngine::new();
        engine.set_silent(true);
        let instance = flat(&engine);
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        instance.add_listener("zoom_changed", Rc::new(move |_: Rc<NativeEvent>| flag.set(true)));

        instance
            .move_camera(&CameraPatch {
                zoom: Some(7.0),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(instance.camera().zoom, 7.0);
        assert!(!fired.get());
    }

    #[test]
    fn test_destroyed_instance_rejects_commands() {
        let engine = HeadlessEngine::new();
        let instance = flat(&engine);
        instance.destroy();
        assert!(instance.move_camera(&CameraPatch::default()).is_err());
        assert!(matches!(engine.journal().last(), Some(EngineCall::Destroy { serial: 1 })));
    }

    #[test]
    fn test_fail_next_create() {
        let engine = HeadlessEngine::new();
        engine.fail_next_create("bad map id");
        let result = engine.create_map(
            &MountPoint::new("root"),
            MapKind::Flat,
            &ConstructionOptions::default(),
        );
        assert!(matches!(result, Err(Error::Engine(_))));
        assert_eq!(engine.created_count(), 0);
    }

    #[test]
    fn test_globe_has_no_zoom_or_bounds() {
        let engine = HeadlessEngine::new();
        engine
            .create_map(&MountPoint::new("root"), MapKind::Globe, &ConstructionOptions::default())
            .unwrap();
        let instance = engine.last_instance().unwrap();
        assert_eq!(instance.zoom(), None);
        assert_eq!(instance.bounds(), None);
        assert_eq!(instance.range(), Some(0.0));
    }
}
