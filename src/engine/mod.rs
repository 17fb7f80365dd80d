//! Contract with the external, imperative map engine.
//!
//! The engine itself is not part of this crate. Hosts implement [`MapEngine`]
//! and [`MapInstance`] over whatever object model they wrap; the rest of the
//! crate only talks to these traits. All methods take `&self` because the
//! engine objects are foreign handles with their own interior state.

pub mod loader;

#[cfg(feature = "headless")]
pub mod headless;

use crate::{
    core::{
        camera::{BoundsFit, CameraPatch},
        config::{IdentityFields, MapOptions},
        geo::{LatLngAltitude, LatLngBounds},
    },
    Result,
};
use serde::{Deserialize, Serialize};
use std::{
    any::Any,
    cell::Cell,
    fmt,
    rc::{Rc, Weak},
    sync::atomic::{AtomicU64, Ordering},
};

pub use loader::{EngineGate, EngineLoader, LoadFailure, LoadStatus, LoaderParams};

/// Which map element the core drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    /// The 2-D map: center / zoom / heading / tilt, with bounds
    #[default]
    Flat,
    /// The 3-D map element: center with altitude / range / heading / tilt / roll
    Globe,
}

/// Identity of a realized attachment target (e.g. a DOM node)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MountPoint(pub String);

impl MountPoint {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for MountPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Engine-assigned listener token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// A raw event as delivered by the engine
#[derive(Debug, Default)]
pub struct NativeEvent {
    /// Native event name, e.g. `"center_changed"` or `"gmp-click"`
    pub name: String,
    pub lat_lng: Option<LatLngAltitude>,
    pub place_id: Option<String>,
    /// Whether the engine honors `stop()` for this event
    pub stoppable: bool,
    stopped: Cell<bool>,
}

impl NativeEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, lat_lng: LatLngAltitude) -> Self {
        self.lat_lng = Some(lat_lng);
        self
    }

    pub fn with_place_id(mut self, place_id: impl Into<String>) -> Self {
        self.place_id = Some(place_id.into());
        self
    }

    pub fn stoppable(mut self) -> Self {
        self.stoppable = true;
        self
    }

    /// Asks the engine to cancel its default handling. No-op for events
    /// the engine does not allow to be cancelled.
    pub fn stop(&self) {
        if self.stoppable {
            self.stopped.set(true);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// Callback registered on an engine instance
pub type NativeListener = Rc<dyn Fn(Rc<NativeEvent>)>;

/// Everything applied to a new instance at construction time only
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConstructionOptions {
    pub identity: IdentityFields,
    /// Initial camera, explicit values first then defaults
    pub camera: CameraPatch,
    pub bounds: Option<BoundsFit>,
    pub options: MapOptions,
}

/// One live engine map object.
///
/// Accessors return `None` when the engine cannot report a value; callers
/// treat that as an engine inconsistency, not as an error.
pub trait MapInstance {
    fn kind(&self) -> MapKind;

    fn center(&self) -> Option<LatLngAltitude>;
    fn zoom(&self) -> Option<f64>;
    fn range(&self) -> Option<f64>;
    fn heading(&self) -> Option<f64>;
    fn tilt(&self) -> Option<f64>;
    fn roll(&self) -> Option<f64>;
    fn bounds(&self) -> Option<LatLngBounds>;

    /// Moves every axis present in `patch` in one engine call
    fn move_camera(&self, patch: &CameraPatch) -> Result<()>;

    /// Replaces the mutable, non-camera options in one engine call
    fn set_options(&self, options: &MapOptions) -> Result<()>;

    fn fit_bounds(&self, bounds: &LatLngBounds, padding: f64) -> Result<()>;

    fn add_listener(&self, event: &str, listener: NativeListener) -> ListenerId;

    /// Detaches a listener; unknown ids are ignored
    fn remove_listener(&self, listener: ListenerId);

    /// Moves a parked instance onto a new attachment target
    fn remount(&self, mount: &MountPoint) -> Result<()>;

    fn destroy(&self);

    /// Dynamic casting support
    fn as_any(&self) -> &dyn Any;
}

/// Factory for engine instances, usable once the gate reports `Loaded`
pub trait MapEngine {
    fn create_map(
        &self,
        mount: &MountPoint,
        kind: MapKind,
        options: &ConstructionOptions,
    ) -> Result<Rc<dyn MapInstance>>;
}

/// Process-unique id stamped on every instance this crate constructs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

impl InstanceId {
    fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map#{}", self.0)
    }
}

/// Shared, command-only capability on one live instance.
///
/// Clones point at the same engine object; only the lifecycle manager
/// destroys it.
#[derive(Clone)]
pub struct MapHandle {
    id: InstanceId,
    inner: Rc<dyn MapInstance>,
}

impl MapHandle {
    pub(crate) fn wrap(inner: Rc<dyn MapInstance>) -> Self {
        Self {
            id: InstanceId::next(),
            inner,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn instance(&self) -> &dyn MapInstance {
        self.inner.as_ref()
    }

    pub fn kind(&self) -> MapKind {
        self.inner.kind()
    }

    /// Whether both handles refer to the same constructed instance
    pub fn same_instance(&self, other: &MapHandle) -> bool {
        self.id == other.id
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    pub fn downgrade(&self) -> WeakMapHandle {
        WeakMapHandle {
            id: self.id,
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for MapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapHandle")
            .field("id", &self.id)
            .field("kind", &self.inner.kind())
            .finish()
    }
}

impl PartialEq for MapHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other)
    }
}

/// Non-owning handle captured by engine listeners
#[derive(Clone)]
pub struct WeakMapHandle {
    id: InstanceId,
    inner: Weak<dyn MapInstance>,
}

impl WeakMapHandle {
    pub fn upgrade(&self) -> Option<MapHandle> {
        self.inner.upgrade().map(|inner| MapHandle { id: self.id, inner })
    }
}
