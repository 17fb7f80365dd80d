//! Camera value types shared by the tracker and the synchronizer.
//!
//! `CameraState` is a fully populated camera as last known to this crate,
//! `CameraPatch` is a camera where every axis is optional. A patch doubles as
//! the desired camera derived from props (unspecified axes are unconstrained)
//! and as the single batched corrective command sent to the engine.

use crate::core::constants::CAMERA_EPSILON;
use crate::core::geo::{LatLngAltitude, LatLngBounds};
use crate::engine::MapKind;
use serde::{Deserialize, Serialize};

/// One independently synchronized camera axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraAxis {
    Center,
    Zoom,
    Range,
    Heading,
    Tilt,
    Roll,
}

impl CameraAxis {
    pub const ALL: [CameraAxis; 6] = [
        CameraAxis::Center,
        CameraAxis::Zoom,
        CameraAxis::Range,
        CameraAxis::Heading,
        CameraAxis::Tilt,
        CameraAxis::Roll,
    ];

    /// Whether the axis exists on a map variant
    pub fn applies_to(self, kind: MapKind) -> bool {
        !matches!(
            (self, kind),
            (CameraAxis::Zoom, MapKind::Globe)
                | (CameraAxis::Range, MapKind::Flat)
                | (CameraAxis::Roll, MapKind::Flat)
        )
    }
}

/// Last camera configuration known for one live instance
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraState {
    pub center: LatLngAltitude,
    pub zoom: f64,
    pub range: f64,
    pub heading: f64,
    pub tilt: f64,
    pub roll: f64,
}

impl CameraState {
    /// Overwrites the axes present in `patch`, leaving the others untouched
    pub fn apply_patch(&mut self, patch: &CameraPatch) {
        if let Some(center) = patch.center {
            self.center = center;
        }
        if let Some(zoom) = patch.zoom {
            self.zoom = zoom;
        }
        if let Some(range) = patch.range {
            self.range = range;
        }
        if let Some(heading) = patch.heading {
            self.heading = heading;
        }
        if let Some(tilt) = patch.tilt {
            self.tilt = tilt;
        }
        if let Some(roll) = patch.roll {
            self.roll = roll;
        }
    }

    /// Applies a single observed update
    pub fn apply_update(&mut self, update: CameraUpdate) {
        match update {
            CameraUpdate::Center(center) => self.center = center,
            CameraUpdate::Zoom(zoom) => self.zoom = zoom,
            CameraUpdate::Range(range) => self.range = range,
            CameraUpdate::Heading(heading) => self.heading = heading,
            CameraUpdate::Tilt(tilt) => self.tilt = tilt,
            CameraUpdate::Roll(roll) => self.roll = roll,
            CameraUpdate::Snapshot(state) => *self = state,
        }
    }
}

/// A camera observation delivered by one engine event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraUpdate {
    Center(LatLngAltitude),
    Zoom(f64),
    Range(f64),
    Heading(f64),
    Tilt(f64),
    Roll(f64),
    /// Aggregate events (bounds / any camera change) replace every axis
    Snapshot(CameraState),
}

/// A camera with optional axes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<LatLngAltitude>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<f64>,
}

/// The camera implied by the current render's props.
///
/// `None` on an axis means the caller does not constrain it.
pub type DesiredCamera = CameraPatch;

impl CameraPatch {
    pub fn is_empty(&self) -> bool {
        self.axes().is_empty()
    }

    /// Axes carried by this patch, in `CameraAxis::ALL` order
    pub fn axes(&self) -> Vec<CameraAxis> {
        CameraAxis::ALL
            .into_iter()
            .filter(|axis| self.has(*axis))
            .collect()
    }

    pub fn has(&self, axis: CameraAxis) -> bool {
        match axis {
            CameraAxis::Center => self.center.is_some(),
            CameraAxis::Zoom => self.zoom.is_some(),
            CameraAxis::Range => self.range.is_some(),
            CameraAxis::Heading => self.heading.is_some(),
            CameraAxis::Tilt => self.tilt.is_some(),
            CameraAxis::Roll => self.roll.is_some(),
        }
    }

    /// Fills axes missing from `self` with the ones from `fallback`
    pub fn or(self, fallback: CameraPatch) -> CameraPatch {
        CameraPatch {
            center: self.center.or(fallback.center),
            zoom: self.zoom.or(fallback.zoom),
            range: self.range.or(fallback.range),
            heading: self.heading.or(fallback.heading),
            tilt: self.tilt.or(fallback.tilt),
            roll: self.roll.or(fallback.roll),
        }
    }

    /// Drops axes the variant does not have. Flat maps have no altitude.
    pub fn restrict_to(mut self, kind: MapKind) -> CameraPatch {
        if !CameraAxis::Zoom.applies_to(kind) {
            self.zoom = None;
        }
        if !CameraAxis::Range.applies_to(kind) {
            self.range = None;
        }
        if !CameraAxis::Roll.applies_to(kind) {
            self.roll = None;
        }
        if kind == MapKind::Flat {
            if let Some(center) = self.center.as_mut() {
                center.altitude = 0.0;
            }
        }
        self
    }

    /// Minimal corrective command moving `tracked` to this desired camera.
    ///
    /// Every constrained axis that differs from the tracked value is
    /// included; returns `None` when nothing diverges.
    pub fn diff(&self, tracked: &CameraState) -> Option<CameraPatch> {
        let patch = CameraPatch {
            center: self
                .center
                .filter(|center| !center.approx_eq(&tracked.center, CAMERA_EPSILON)),
            zoom: self.zoom.filter(|zoom| differs(*zoom, tracked.zoom)),
            range: self.range.filter(|range| differs(*range, tracked.range)),
            heading: self.heading.filter(|heading| differs(*heading, tracked.heading)),
            tilt: self.tilt.filter(|tilt| differs(*tilt, tracked.tilt)),
            roll: self.roll.filter(|roll| differs(*roll, tracked.roll)),
        };

        if patch.is_empty() {
            None
        } else {
            Some(patch)
        }
    }
}

impl From<CameraState> for CameraPatch {
    fn from(state: CameraState) -> Self {
        Self {
            center: Some(state.center),
            zoom: Some(state.zoom),
            range: Some(state.range),
            heading: Some(state.heading),
            tilt: Some(state.tilt),
            roll: Some(state.roll),
        }
    }
}

fn differs(a: f64, b: f64) -> bool {
    (a - b).abs() > CAMERA_EPSILON
}

/// Last tracked camera of a replaced instance, tagged with its variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarriedCamera {
    pub kind: MapKind,
    pub state: CameraState,
}

impl CarriedCamera {
    /// Only the axes the old variant actually had
    pub fn patch(&self) -> CameraPatch {
        CameraPatch::from(self.state).restrict_to(self.kind)
    }
}

/// Bounds to fit right after construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsFit {
    pub bounds: LatLngBounds,
    #[serde(default)]
    pub padding: f64,
}
