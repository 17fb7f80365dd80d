//! Construction / reuse / destruction of the single instance behind one
//! mount point.

use crate::{
    core::{
        camera::{CameraPatch, CarriedCamera},
        config::{IdentityFields, IdentityKey},
    },
    engine::{ConstructionOptions, MapHandle, MountPoint},
    input::{bridge::EventBridge, events::CameraEventDetail},
    lifecycle::provider::MapProvider,
    sync::tracker::CameraTracker,
    Result,
};

/// Outcome of one acquisition
#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition {
    /// Engine not loaded or no mount point yet
    Unavailable,
    /// Same identity as the last pass; the instance is untouched
    Reused(MapHandle),
    /// Freshly constructed
    Created(MapHandle),
    /// Taken out of the provider pool and remounted
    Restored(MapHandle),
}

impl Acquisition {
    pub fn handle(&self) -> Option<&MapHandle> {
        match self {
            Acquisition::Unavailable => None,
            Acquisition::Reused(handle)
            | Acquisition::Created(handle)
            | Acquisition::Restored(handle) => Some(handle),
        }
    }

    /// Whether this pass produced a different instance than the last one
    pub fn is_new(&self) -> bool {
        matches!(self, Acquisition::Created(_) | Acquisition::Restored(_))
    }
}

/// Per-instance state that lives and dies with the engine object
pub struct LiveInstance {
    handle: MapHandle,
    key: IdentityKey,
    registry_id: String,
    reuse: bool,
    tracker: CameraTracker,
    bridge: EventBridge,
}

impl LiveInstance {
    pub fn handle(&self) -> &MapHandle {
        &self.handle
    }

    pub fn key(&self) -> &IdentityKey {
        &self.key
    }

    pub fn registry_id(&self) -> &str {
        &self.registry_id
    }

    pub fn tracker(&self) -> &CameraTracker {
        &self.tracker
    }

    pub fn bridge(&self) -> &EventBridge {
        &self.bridge
    }

    /// Borrows the pieces a render pass synchronizes against
    pub fn split(&mut self) -> (&MapHandle, &CameraTracker, &mut EventBridge) {
        (&self.handle, &self.tracker, &mut self.bridge)
    }
}

pub struct InstanceLifecycle {
    provider: MapProvider,
    live: Option<LiveInstance>,
    /// Last tracked camera of an instance replaced by an identity change
    carry_over: Option<CarriedCamera>,
}

impl InstanceLifecycle {
    pub fn new(provider: &MapProvider) -> Self {
        Self {
            provider: provider.clone(),
            live: None,
            carry_over: None,
        }
    }

    pub fn provider(&self) -> &MapProvider {
        &self.provider
    }

    pub fn live(&self) -> Option<&LiveInstance> {
        self.live.as_ref()
    }

    pub fn live_mut(&mut self) -> Option<&mut LiveInstance> {
        self.live.as_mut()
    }

    pub fn handle(&self) -> Option<&MapHandle> {
        self.live.as_ref().map(|live| &live.handle)
    }

    /// Returns the instance for this render pass.
    ///
    /// A missing mount point or an engine that is not `Loaded` yields
    /// `Unavailable` (tearing down whatever was live). An unchanged identity
    /// returns the live instance; any other change tears it down first and
    /// then constructs, with `build` producing the construction options from
    /// the replaced instance's last tracked camera. Engine errors propagate.
    pub fn acquire<F>(
        &mut self,
        mount: Option<&MountPoint>,
        fields: &IdentityFields,
        id: &str,
        reuse: bool,
        build: F,
    ) -> Result<Acquisition>
    where
        F: FnOnce(Option<&CarriedCamera>) -> ConstructionOptions,
    {
        let loaded = self.provider.status().is_loaded();
        let wanted = mount
            .filter(|_| loaded)
            .map(|mount| IdentityKey::new(fields.clone(), mount.clone()));

        if let (Some(live), Some(key)) = (self.live.as_mut(), wanted.as_ref()) {
            if live.key == *key {
                live.reuse = reuse;
                if live.registry_id != id {
                    self.provider.deregister(&live.registry_id, &live.handle);
                    self.provider.register(id, &live.handle);
                    live.registry_id = id.to_string();
                }
                return Ok(Acquisition::Reused(live.handle.clone()));
            }
        }

        let replaced = self.release();

        let Some(key) = wanted else {
            self.carry_over = None;
            return Ok(Acquisition::Unavailable);
        };
        // A failed construction leaves the camera here for the retry
        let carry_over = replaced.or_else(|| self.carry_over.take());
        let options = build(carry_over.as_ref());

        let restored = if reuse {
            self.provider.unpark(fields)
        } else {
            None
        };

        let from_pool = restored.is_some();
        let (handle, seed) = match restored {
            Some(handle) => match self.restore(&handle, &key.mount, &options) {
                Ok(seed) => (handle, seed),
                Err(e) => {
                    self.carry_over = carry_over;
                    handle.instance().destroy();
                    return Err(e);
                }
            },
            None => {
                let instance = match self
                    .provider
                    .engine()
                    .create_map(&key.mount, fields.kind, &options)
                {
                    Ok(instance) => instance,
                    Err(e) => {
                        self.carry_over = carry_over;
                        return Err(e);
                    }
                };
                let handle = MapHandle::wrap(instance);
                log::debug!(
                    "constructed {} ({:?}) on '{}'",
                    handle.id(),
                    fields.kind,
                    key.mount
                );
                (handle, options.camera)
            }
        };

        self.provider.register(id, &handle);

        let tracker = CameraTracker::new();
        tracker.seed(&seed);
        let bridge = EventBridge::attach(&handle, &tracker, self.provider.diagnostics());

        self.live = Some(LiveInstance {
            handle: handle.clone(),
            key,
            registry_id: id.to_string(),
            reuse,
            tracker,
            bridge,
        });

        if let Some(fit) = options.bounds {
            handle.instance().fit_bounds(&fit.bounds, fit.padding)?;
        }

        Ok(if from_pool {
            Acquisition::Restored(handle)
        } else {
            Acquisition::Created(handle)
        })
    }

    /// Remounts a pooled instance and re-applies the construction state;
    /// returns the camera read back from it
    fn restore(
        &self,
        handle: &MapHandle,
        mount: &MountPoint,
        options: &ConstructionOptions,
    ) -> Result<CameraPatch> {
        let instance = handle.instance();
        instance.remount(mount)?;
        if !options.camera.is_empty() {
            instance.move_camera(&options.camera)?;
        }
        instance.set_options(&options.options)?;
        log::debug!("restored pooled {} on '{}'", handle.id(), mount);

        let current = CameraEventDetail::read(handle, self.provider.diagnostics()).camera();
        Ok(CameraPatch::from(current))
    }

    /// Releases the live instance for good, e.g. on unmount. The next
    /// construction seeds from props again.
    pub fn teardown(&mut self) {
        self.release();
        self.carry_over = None;
    }

    /// Releases the live instance, if any, and returns its last tracked
    /// camera.
    ///
    /// Listeners are detached and the tracker cleared first, then the
    /// registry entry is removed, then the engine object is destroyed (or
    /// parked when reuse is enabled).
    fn release(&mut self) -> Option<CarriedCamera> {
        let mut live = self.live.take()?;

        let detached = live.bridge.unbind_all();
        let carried = CarriedCamera {
            kind: live.handle.kind(),
            state: live.tracker.current(),
        };
        live.tracker.reset();

        self.provider.deregister(&live.registry_id, &live.handle);

        if live.reuse {
            self.provider.park(live.key.fields.clone(), live.handle.clone());
        } else {
            live.handle.instance().destroy();
        }

        log::debug!(
            "tore down {} ({} listeners detached, {})",
            live.handle.id(),
            detached,
            if live.reuse { "parked" } else { "destroyed" }
        );
        Some(carried)
    }
}

impl Drop for InstanceLifecycle {
    fn drop(&mut self) {
        self.teardown();
    }
}
