//! Configuration surface consumed by the map controller
//!
//! Props are split by how they reach the engine:
//! - [`IdentityFields`] cannot change on a live instance and force recreation.
//! - [`CameraProps`] are reconciled by the camera synchronizer.
//! - [`MapOptions`] are written in one batch whenever they change.
//! - Event handlers ([`EventHandlers`]) are bound through the event bridge.

use crate::{
    core::{
        camera::{BoundsFit, CameraPatch, DesiredCamera},
        constants::DEFAULT_INSTANCE_ID,
        geo::{LatLngAltitude, LatLngBounds},
    },
    engine::{MapKind, MountPoint},
    input::bridge::EventHandlers,
    Result,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderingType {
    Raster,
    Vector,
    Uninitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    Light,
    Dark,
    FollowSystem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureHandling {
    Cooperative,
    Greedy,
    None,
    Auto,
}

/// Fields the engine only accepts at construction time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IdentityFields {
    #[serde(default)]
    pub kind: MapKind,
    /// Cloud style identifier
    #[serde(default)]
    pub map_id: Option<String>,
    #[serde(default)]
    pub rendering_type: Option<RenderingType>,
    #[serde(default)]
    pub color_scheme: Option<ColorScheme>,
}

/// Everything that decides whether an existing instance can be reused
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub fields: IdentityFields,
    pub mount: MountPoint,
}

impl IdentityKey {
    pub fn new(fields: IdentityFields, mount: MountPoint) -> Self {
        Self { fields, mount }
    }
}

/// Mutable, non-camera options written through `set_options`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gesture_handling: Option<GestureHandling>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_default_ui: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom_control: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_type_control: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_view_control: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate_control: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_control: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullscreen_control: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard_shortcuts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clickable_icons: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_double_click_zoom: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrollwheel: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restriction: Option<LatLngBounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draggable_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dragging_cursor: Option<String>,
}

/// Controlled (`center`, `zoom`, ...) and uncontrolled (`default_*`) camera axes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraProps {
    pub center: Option<LatLngAltitude>,
    pub zoom: Option<f64>,
    pub range: Option<f64>,
    pub heading: Option<f64>,
    pub tilt: Option<f64>,
    pub roll: Option<f64>,

    pub default_center: Option<LatLngAltitude>,
    pub default_zoom: Option<f64>,
    pub default_range: Option<f64>,
    pub default_heading: Option<f64>,
    pub default_tilt: Option<f64>,
    pub default_roll: Option<f64>,
    pub default_bounds: Option<BoundsFit>,

    /// Reject every camera change that does not come from these props
    pub controlled: bool,
}

impl CameraProps {
    /// Explicit axes only; recomputed every render
    pub fn desired(&self) -> DesiredCamera {
        DesiredCamera {
            center: self.center,
            zoom: self.zoom,
            range: self.range,
            heading: self.heading,
            tilt: self.tilt,
            roll: self.roll,
        }
    }

    /// The `default_*` axes, read once at construction
    pub fn defaults(&self) -> CameraPatch {
        CameraPatch {
            center: self.default_center,
            zoom: self.default_zoom,
            range: self.default_range,
            heading: self.default_heading,
            tilt: self.default_tilt,
            roll: self.default_roll,
        }
    }
}

/// Full set of props for one map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapProps {
    /// Registry id; `None` registers as [`DEFAULT_INSTANCE_ID`]
    pub id: Option<String>,
    #[serde(flatten)]
    pub identity: IdentityFields,
    #[serde(flatten)]
    pub camera: CameraProps,
    pub options: MapOptions,
    /// Park instances in the provider pool on teardown instead of destroying them
    pub reuse_instances: bool,
    #[serde(skip)]
    pub handlers: EventHandlers,
}

impl MapProps {
    pub fn registry_id(&self) -> &str {
        self.id.as_deref().unwrap_or(DEFAULT_INSTANCE_ID)
    }

    /// Parses props from JSON. Handlers are never part of the document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
