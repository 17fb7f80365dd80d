//! Prelude module for common maplet-sync types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use maplet_sync::prelude::*;`

pub use crate::core::{
    builder::MapPropsBuilder,
    camera::{BoundsFit, CameraAxis, CameraPatch, CameraState, DesiredCamera},
    config::{
        CameraProps, ColorScheme, GestureHandling, IdentityFields, MapOptions, MapProps,
        RenderingType,
    },
    geo::{LatLng, LatLngAltitude, LatLngBounds},
    map::MapController,
};

pub use crate::engine::{
    EngineGate, EngineLoader, LoadFailure, LoadStatus, LoaderParams, MapEngine, MapHandle,
    MapInstance, MapKind, MountPoint, NativeEvent,
};

pub use crate::input::{
    EventEnvelope, EventHandler, EventHandlers, EventKind, Subscription,
};

pub use crate::lifecycle::{lookup_map, Acquisition, MapProvider};

pub use crate::sync::{CameraTracker, RerenderHook};

pub use crate::diagnostics::{Diagnostic, Diagnostics};

pub use crate::{Error, Result};

pub use std::rc::Rc;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

#[cfg(feature = "headless")]
pub use crate::engine::headless::{EngineCall, HeadlessEngine, HeadlessInstance, HeadlessLoader};
