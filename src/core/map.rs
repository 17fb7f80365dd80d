//! Render-pass driver for one declarative map.
//!
//! Every pass runs the lifecycle manager first and only then the option,
//! handler and camera synchronizers, all against the instance the
//! lifecycle manager produced for that pass.

use crate::{
    core::{camera::CameraState, config::MapProps},
    engine::{ConstructionOptions, InstanceId, MapHandle, MountPoint},
    lifecycle::{
        manager::InstanceLifecycle,
        provider::MapProvider,
    },
    sync::{
        camera::CameraSynchronizer,
        options::OptionSynchronizer,
        tracker::{CameraTracker, RerenderHook},
    },
    Result,
};

pub struct MapController {
    lifecycle: InstanceLifecycle,
    camera_sync: CameraSynchronizer,
    option_sync: OptionSynchronizer,
    /// Instance and tracker revision seen by the last completed pass
    rendered: Option<(InstanceId, u64)>,
    hook: Option<RerenderHook>,
}

impl MapController {
    pub fn new(provider: &MapProvider) -> Self {
        Self {
            lifecycle: InstanceLifecycle::new(provider),
            camera_sync: CameraSynchronizer::new(),
            option_sync: OptionSynchronizer::new(),
            rendered: None,
            hook: None,
        }
    }

    /// One render pass. Returns the live instance, or `None` while the
    /// engine is not loaded or `mount` is not realized yet.
    pub fn render(&mut self, props: &MapProps, mount: Option<&MountPoint>) -> Result<Option<MapHandle>> {
        let camera = &props.camera;
        let kind = props.identity.kind;

        let acquisition = self.lifecycle.acquire(
            mount,
            &props.identity,
            props.registry_id(),
            props.reuse_instances,
            |carry_over| ConstructionOptions {
                identity: props.identity.clone(),
                camera: CameraSynchronizer::initial_camera(camera, kind, carry_over),
                bounds: match carry_over {
                    Some(_) => None,
                    None => camera.default_bounds,
                },
                options: props.options.clone(),
            },
        )?;

        if acquisition.is_new() {
            self.camera_sync.reset();
            self.option_sync.prime(props.options.clone());
        }

        let Some(live) = self.lifecycle.live_mut() else {
            self.rendered = None;
            return Ok(None);
        };
        if acquisition.is_new() {
            live.tracker().set_rerender_hook(self.hook.clone());
        }

        let (handle, tracker, bridge) = live.split();
        self.option_sync.sync(handle, &props.options)?;
        bridge.sync_handlers(&props.handlers);
        self.camera_sync.sync(handle, camera, tracker, bridge)?;

        self.rendered = Some((handle.id(), tracker.revision()));
        Ok(Some(handle.clone()))
    }

    /// Tears the instance down, e.g. when the host component goes away
    pub fn unmount(&mut self) {
        self.lifecycle.teardown();
        self.camera_sync.reset();
        self.option_sync.reset();
        self.rendered = None;
    }

    /// Whether the engine reported camera changes since the last pass
    pub fn needs_render(&self) -> bool {
        match (self.rendered, self.lifecycle.live()) {
            (Some((id, revision)), Some(live)) => {
                live.handle().id() != id || live.tracker().revision() != revision
            }
            _ => false,
        }
    }

    /// Called after every observed camera update.
    ///
    /// The hook runs inside engine callbacks; it should schedule a render,
    /// not perform one.
    pub fn set_rerender_hook(&mut self, hook: Option<RerenderHook>) {
        if let Some(live) = self.lifecycle.live() {
            live.tracker().set_rerender_hook(hook.clone());
        }
        self.hook = hook;
    }

    pub fn map(&self) -> Option<MapHandle> {
        self.lifecycle.handle().cloned()
    }

    pub fn tracked_camera(&self) -> Option<CameraState> {
        self.lifecycle.live().map(|live| live.tracker().current())
    }

    /// Shared handle to the live instance's tracker
    pub fn tracker(&self) -> Option<CameraTracker> {
        self.lifecycle.live().map(|live| live.tracker().clone())
    }

    pub fn is_guarding(&self) -> bool {
        self.camera_sync.is_guarding()
    }

    pub fn provider(&self) -> &MapProvider {
        self.lifecycle.provider()
    }
}

impl Drop for MapController {
    fn drop(&mut self) {
        self.unmount();
    }
}

