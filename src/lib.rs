//! # maplet-sync
//!
//! Keeps a declarative, prop-driven description of a map in sync with an
//! imperative, externally supplied map engine.
//!
//! The crate decides when the engine object is constructed, reused or
//! destroyed, tracks the camera the engine last reported, corrects drift
//! with single batched commands, and turns native engine events into typed
//! envelopes for caller handlers. The engine itself stays behind the
//! [`engine::MapEngine`] / [`engine::MapInstance`] traits; the `headless`
//! feature ships an in-memory implementation.

pub mod core;
pub mod diagnostics;
pub mod engine;
pub mod input;
pub mod lifecycle;
pub mod prelude;
pub mod sync;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    builder::MapPropsBuilder,
    camera::{CameraPatch, CameraState, DesiredCamera},
    config::{CameraProps, IdentityFields, MapOptions, MapProps},
    geo::{LatLng, LatLngAltitude, LatLngBounds},
    map::MapController,
};

pub use crate::engine::{
    EngineGate, EngineLoader, LoadStatus, LoaderParams, MapEngine, MapHandle, MapInstance,
    MapKind, MountPoint,
};

pub use crate::input::{EventEnvelope, EventHandlers, EventKind};

pub use crate::lifecycle::{lookup_map, MapProvider};

pub use crate::sync::CameraTracker;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Raised by the engine during construction or command application
    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Invalid engine status transition from {from} to {to}")]
    InvalidTransition { from: LoadStatus, to: LoadStatus },

    #[error("Load error: {0}")]
    Load(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
