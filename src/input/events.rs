use crate::{
    core::{
        camera::{CameraState, CameraUpdate},
        geo::{LatLngAltitude, LatLngBounds},
    },
    diagnostics::Diagnostics,
    engine::{MapHandle, MapKind, NativeEvent},
};
use serde::{Deserialize, Serialize};
use std::{fmt, rc::Rc};

/// Abstract events exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // camera
    BoundsChanged,
    CenterChanged,
    ZoomChanged,
    RangeChanged,
    HeadingChanged,
    TiltChanged,
    RollChanged,
    /// Any camera change
    CameraChanged,
    // pointer
    Click,
    ContextMenu,
    DoubleClick,
    MouseMove,
    MouseOver,
    MouseOut,
    // bare
    Drag,
    DragStart,
    DragEnd,
    Idle,
    TilesLoaded,
    ProjectionChanged,
    MapTypeIdChanged,
    RenderingTypeChanged,
    MapCapabilitiesChanged,
    IsFractionalZoomEnabledChanged,
    SteadyChange,
    AnimationEnd,
}

/// Which envelope an event kind produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    Camera,
    Pointer,
    Bare,
}

/// One row of the normalization table
pub struct EventBinding {
    pub kind: EventKind,
    pub shape: EnvelopeShape,
    /// Native names on the 2-D map
    pub flat: &'static [&'static str],
    /// Native names on the 3-D map element
    pub globe: &'static [&'static str],
}

const GLOBE_CAMERA_EVENTS: &[&str] = &[
    "gmp-centerchange",
    "gmp-rangechange",
    "gmp-headingchange",
    "gmp-tiltchange",
    "gmp-rollchange",
];

/// Single source of truth for abstract → native event names
pub const EVENT_TABLE: &[EventBinding] = &[
    EventBinding { kind: EventKind::BoundsChanged, shape: EnvelopeShape::Camera, flat: &["bounds_changed"], globe: &[] },
    EventBinding { kind: EventKind::CenterChanged, shape: EnvelopeShape::Camera, flat: &["center_changed"], globe: &["gmp-centerchange"] },
    EventBinding { kind: EventKind::ZoomChanged, shape: EnvelopeShape::Camera, flat: &["zoom_changed"], globe: &[] },
    EventBinding { kind: EventKind::RangeChanged, shape: EnvelopeShape::Camera, flat: &[], globe: &["gmp-rangechange"] },
    EventBinding { kind: EventKind::HeadingChanged, shape: EnvelopeShape::Camera, flat: &["heading_changed"], globe: &["gmp-headingchange"] },
    EventBinding { kind: EventKind::TiltChanged, shape: EnvelopeShape::Camera, flat: &["tilt_changed"], globe: &["gmp-tiltchange"] },
    EventBinding { kind: EventKind::RollChanged, shape: EnvelopeShape::Camera, flat: &[], globe: &["gmp-rollchange"] },
    EventBinding { kind: EventKind::CameraChanged, shape: EnvelopeShape::Camera, flat: &["bounds_changed"], globe: GLOBE_CAMERA_EVENTS },
    EventBinding { kind: EventKind::Click, shape: EnvelopeShape::Pointer, flat: &["click"], globe: &["gmp-click"] },
    EventBinding { kind: EventKind::ContextMenu, shape: EnvelopeShape::Pointer, flat: &["contextmenu"], globe: &[] },
    EventBinding { kind: EventKind::DoubleClick, shape: EnvelopeShape::Pointer, flat: &["dblclick"], globe: &[] },
    EventBinding { kind: EventKind::MouseMove, shape: EnvelopeShape::Pointer, flat: &["mousemove"], globe: &[] },
    EventBinding { kind: EventKind::MouseOver, shape: EnvelopeShape::Pointer, flat: &["mouseover"], globe: &[] },
    EventBinding { kind: EventKind::MouseOut, shape: EnvelopeShape::Pointer, flat: &["mouseout"], globe: &[] },
    EventBinding { kind: EventKind::Drag, shape: EnvelopeShape::Bare, flat: &["drag"], globe: &[] },
    EventBinding { kind: EventKind::DragStart, shape: EnvelopeShape::Bare, flat: &["dragstart"], globe: &[] },
    EventBinding { kind: EventKind::DragEnd, shape: EnvelopeShape::Bare, flat: &["dragend"], globe: &[] },
    EventBinding { kind: EventKind::Idle, shape: EnvelopeShape::Bare, flat: &["idle"], globe: &[] },
    EventBinding { kind: EventKind::TilesLoaded, shape: EnvelopeShape::Bare, flat: &["tilesloaded"], globe: &[] },
    EventBinding { kind: EventKind::ProjectionChanged, shape: EnvelopeShape::Bare, flat: &["projection_changed"], globe: &[] },
    EventBinding { kind: EventKind::MapTypeIdChanged, shape: EnvelopeShape::Bare, flat: &["maptypeid_changed"], globe: &[] },
    EventBinding { kind: EventKind::RenderingTypeChanged, shape: EnvelopeShape::Bare, flat: &["renderingtype_changed"], globe: &[] },
    EventBinding { kind: EventKind::MapCapabilitiesChanged, shape: EnvelopeShape::Bare, flat: &["mapcapabilities_changed"], globe: &[] },
    EventBinding { kind: EventKind::IsFractionalZoomEnabledChanged, shape: EnvelopeShape::Bare, flat: &["isfractionalzoomenabled_changed"], globe: &[] },
    EventBinding { kind: EventKind::SteadyChange, shape: EnvelopeShape::Bare, flat: &[], globe: &["gmp-steadychange"] },
    EventBinding { kind: EventKind::AnimationEnd, shape: EnvelopeShape::Bare, flat: &[], globe: &["gmp-animationend"] },
];

impl EventKind {
    pub fn binding(self) -> &'static EventBinding {
        EVENT_TABLE
            .iter()
            .find(|binding| binding.kind == self)
            .unwrap_or_else(|| unreachable!("{:?} missing from EVENT_TABLE", self))
    }

    pub fn all() -> impl Iterator<Item = EventKind> {
        EVENT_TABLE.iter().map(|binding| binding.kind)
    }

    pub fn shape(self) -> EnvelopeShape {
        self.binding().shape
    }

    pub fn is_camera(self) -> bool {
        self.shape() == EnvelopeShape::Camera
    }

    /// Native event names for this kind; empty when the variant lacks it
    pub fn native_names(self, map: MapKind) -> &'static [&'static str] {
        let binding = self.binding();
        match map {
            MapKind::Flat => binding.flat,
            MapKind::Globe => binding.globe,
        }
    }

    pub fn is_supported(self, map: MapKind) -> bool {
        !self.native_names(map).is_empty()
    }

    /// Camera kinds exposed by one variant
    pub fn camera_kinds(map: MapKind) -> impl Iterator<Item = EventKind> {
        Self::all().filter(move |kind| kind.is_camera() && kind.is_supported(map))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Native events after which the externally controlled mode re-asserts the camera
pub fn bounds_class_events(map: MapKind) -> &'static [&'static str] {
    EventKind::CameraChanged.native_names(map)
}

/// Camera snapshot read from the engine at dispatch time
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraEventDetail {
    pub center: LatLngAltitude,
    pub bounds: LatLngBounds,
    pub zoom: f64,
    pub range: f64,
    pub heading: f64,
    pub tilt: f64,
    pub roll: f64,
}

impl CameraEventDetail {
    /// Reads every axis of the variant fresh from the engine.
    ///
    /// Missing values are reported once through `diagnostics` and defaulted
    /// to zero / empty bounds.
    pub fn read(source: &MapHandle, diagnostics: &Diagnostics) -> Self {
        let instance = source.instance();
        let kind = source.kind();

        let report = |what: &str| {
            diagnostics.warn_once(format!(
                "map engine returned no {} for a {:?} map; the engine and this library may be out of sync",
                what, kind
            ));
        };

        let read_f64 = |what: &str, value: Option<f64>| {
            value.unwrap_or_else(|| {
                report(what);
                0.0
            })
        };

        let mut detail = CameraEventDetail {
            heading: read_f64("heading", instance.heading()),
            tilt: read_f64("tilt", instance.tilt()),
            ..Default::default()
        };

        match kind {
            MapKind::Flat => {
                detail.zoom = read_f64("zoom", instance.zoom());
            }
            MapKind::Globe => {
                detail.range = read_f64("range", instance.range());
                detail.roll = read_f64("roll", instance.roll());
            }
        }

        detail.center = instance.center().unwrap_or_else(|| {
            report("center");
            LatLngAltitude::default()
        });

        detail.bounds = match (kind, instance.bounds()) {
            (_, Some(bounds)) => bounds,
            (MapKind::Flat, None) => {
                report("bounds");
                LatLngBounds::empty()
            }
            (MapKind::Globe, None) => LatLngBounds::empty(),
        };

        detail
    }

    pub fn camera(&self) -> CameraState {
        CameraState {
            center: self.center,
            zoom: self.zoom,
            range: self.range,
            heading: self.heading,
            tilt: self.tilt,
            roll: self.roll,
        }
    }

    /// The tracker update carried by an event of `kind`: field events touch
    /// only their own axis, aggregate events replace the whole camera
    pub fn update_for(&self, kind: EventKind) -> Option<CameraUpdate> {
        match kind {
            EventKind::CenterChanged => Some(CameraUpdate::Center(self.center)),
            EventKind::ZoomChanged => Some(CameraUpdate::Zoom(self.zoom)),
            EventKind::RangeChanged => Some(CameraUpdate::Range(self.range)),
            EventKind::HeadingChanged => Some(CameraUpdate::Heading(self.heading)),
            EventKind::TiltChanged => Some(CameraUpdate::Tilt(self.tilt)),
            EventKind::RollChanged => Some(CameraUpdate::Roll(self.roll)),
            EventKind::BoundsChanged | EventKind::CameraChanged => {
                Some(CameraUpdate::Snapshot(self.camera()))
            }
            _ => None,
        }
    }
}

/// Location, feature id and cancellation for pointer events
#[derive(Debug, Clone)]
pub struct PointerEventDetail {
    pub lat_lng: Option<LatLngAltitude>,
    pub place_id: Option<String>,
    /// The raw engine event for advanced use
    pub native: Rc<NativeEvent>,
}

#[derive(Debug, Clone)]
pub enum EventDetail {
    Camera(CameraEventDetail),
    Pointer(PointerEventDetail),
    Bare,
}

/// Normalized, engine-independent representation of a fired event
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub kind: EventKind,
    pub source: MapHandle,
    pub detail: EventDetail,
    native: Rc<NativeEvent>,
}

impl EventEnvelope {
    /// Builds the envelope for `kind` from a raw engine event
    pub fn from_native(
        kind: EventKind,
        source: MapHandle,
        native: Rc<NativeEvent>,
        diagnostics: &Diagnostics,
    ) -> Self {
        let detail = match kind.shape() {
            EnvelopeShape::Camera => {
                EventDetail::Camera(CameraEventDetail::read(&source, diagnostics))
            }
            EnvelopeShape::Pointer => EventDetail::Pointer(PointerEventDetail {
                lat_lng: native.lat_lng,
                place_id: native.place_id.clone(),
                native: native.clone(),
            }),
            EnvelopeShape::Bare => EventDetail::Bare,
        };

        Self {
            kind,
            source,
            detail,
            native,
        }
    }

    pub fn camera(&self) -> Option<&CameraEventDetail> {
        match &self.detail {
            EventDetail::Camera(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn pointer(&self) -> Option<&PointerEventDetail> {
        match &self.detail {
            EventDetail::Pointer(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn stoppable(&self) -> bool {
        self.native.stoppable
    }

    pub fn stop(&self) {
        self.native.stop();
    }

    pub fn native(&self) -> &NativeEvent {
        &self.native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_exhaustive_and_unique() {
        let kinds: Vec<_> = EventKind::all().collect();
        let unique: std::collections::HashSet<_> = kinds.iter().copied().collect();
        assert_eq!(kinds.len(), unique.len());

        for kind in kinds {
            assert!(
                kind.is_supported(MapKind::Flat) || kind.is_supported(MapKind::Globe),
                "{} has no native name",
                kind
            );
        }
    }

    #[test]
    fn test_native_names_per_variant() {
        assert_eq!(EventKind::CenterChanged.native_names(MapKind::Flat), &["center_changed"]);
        assert_eq!(EventKind::CenterChanged.native_names(MapKind::Globe), &["gmp-centerchange"]);
        assert!(!EventKind::ZoomChanged.is_supported(MapKind::Globe));
        assert!(!EventKind::RollChanged.is_supported(MapKind::Flat));
        assert_eq!(bounds_class_events(MapKind::Flat), &["bounds_changed"]);
        assert_eq!(bounds_class_events(MapKind::Globe).len(), 5);
    }

    #[test]
    fn test_shapes() {
        assert_eq!(EventKind::TiltChanged.shape(), EnvelopeShape::Camera);
        assert_eq!(EventKind::Click.shape(), EnvelopeShape::Pointer);
        assert_eq!(EventKind::Idle.shape(), EnvelopeShape::Bare);
        let flat_camera: Vec<_> = EventKind::camera_kinds(MapKind::Flat).collect();
        assert!(flat_camera.contains(&EventKind::ZoomChanged));
        assert!(!flat_camera.contains(&EventKind::RangeChanged));
    }

    #[test]
    fn test_field_events_update_one_axis() {
        let detail = CameraEventDetail {
            center: LatLngAltitude::new(1.0, 1.0, 0.0),
            zoom: 7.0,
            ..Default::default()
        };
        assert_eq!(
            detail.update_for(EventKind::ZoomChanged),
            Some(CameraUpdate::Zoom(7.0))
        );
        assert!(matches!(
            detail.update_for(EventKind::BoundsChanged),
            Some(CameraUpdate::Snapshot(_))
        ));
        assert_eq!(detail.update_for(EventKind::Click), None);
    }

    #[test]
    fn test_native_stop_requires_stoppable() {
        let plain = NativeEvent::new("click");
        plain.stop();
        assert!(!plain.is_stopped());

        let stoppable = NativeEvent::new("click").stoppable();
        stoppable.stop();
        assert!(stoppable.is_stopped());
    }
}
