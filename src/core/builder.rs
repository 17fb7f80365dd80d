//! Fluent construction of [`MapProps`]

use crate::{
    core::{
        camera::BoundsFit,
        config::{ColorScheme, MapOptions, MapProps, RenderingType},
        constants::DEFAULT_BOUNDS_PADDING,
        geo::{LatLngAltitude, LatLngBounds},
    },
    engine::MapKind,
    input::{bridge::EventHandlers, events::EventKind, EventEnvelope},
};

/// Builder for the props of one map
#[derive(Debug, Clone, Default)]
pub struct MapPropsBuilder {
    props: MapProps,
}

impl MapPropsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a 3-D map element instead of the 2-D map
    pub fn globe() -> Self {
        Self::new().with_kind(MapKind::Globe)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.props.id = Some(id.into());
        self
    }

    pub fn with_kind(mut self, kind: MapKind) -> Self {
        self.props.identity.kind = kind;
        self
    }

    pub fn with_map_id(mut self, map_id: impl Into<String>) -> Self {
        self.props.identity.map_id = Some(map_id.into());
        self
    }

    pub fn with_rendering_type(mut self, rendering_type: RenderingType) -> Self {
        self.props.identity.rendering_type = Some(rendering_type);
        self
    }

    pub fn with_color_scheme(mut self, color_scheme: ColorScheme) -> Self {
        self.props.identity.color_scheme = Some(color_scheme);
        self
    }

    // Controlled camera axes

    pub fn with_center(mut self, lat: f64, lng: f64) -> Self {
        self.props.camera.center = Some(LatLngAltitude::new(lat, lng, 0.0));
        self
    }

    pub fn with_center_altitude(mut self, center: LatLngAltitude) -> Self {
        self.props.camera.center = Some(center);
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.props.camera.zoom = Some(zoom);
        self
    }

    pub fn with_range(mut self, range: f64) -> Self {
        self.props.camera.range = Some(range);
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.props.camera.heading = Some(heading);
        self
    }

    pub fn with_tilt(mut self, tilt: f64) -> Self {
        self.props.camera.tilt = Some(tilt);
        self
    }

    pub fn with_roll(mut self, roll: f64) -> Self {
        self.props.camera.roll = Some(roll);
        self
    }

    // Uncontrolled camera axes, read once at construction

    pub fn with_default_center(mut self, lat: f64, lng: f64) -> Self {
        self.props.camera.default_center = Some(LatLngAltitude::new(lat, lng, 0.0));
        self
    }

    pub fn with_default_zoom(mut self, zoom: f64) -> Self {
        self.props.camera.default_zoom = Some(zoom);
        self
    }

    pub fn with_default_range(mut self, range: f64) -> Self {
        self.props.camera.default_range = Some(range);
        self
    }

    pub fn with_default_heading(mut self, heading: f64) -> Self {
        self.props.camera.default_heading = Some(heading);
        self
    }

    pub fn with_default_tilt(mut self, tilt: f64) -> Self {
        self.props.camera.default_tilt = Some(tilt);
        self
    }

    pub fn with_default_bounds(mut self, bounds: LatLngBounds) -> Self {
        self.props.camera.default_bounds = Some(BoundsFit {
            bounds,
            padding: DEFAULT_BOUNDS_PADDING,
        });
        self
    }

    /// Re-assert the camera after every engine-driven change
    pub fn controlled(mut self, controlled: bool) -> Self {
        self.props.camera.controlled = controlled;
        self
    }

    pub fn with_options(mut self, options: MapOptions) -> Self {
        self.props.options = options;
        self
    }

    pub fn reuse_instances(mut self, reuse: bool) -> Self {
        self.props.reuse_instances = reuse;
        self
    }

    pub fn with_handlers(mut self, handlers: EventHandlers) -> Self {
        self.props.handlers = handlers;
        self
    }

    pub fn on<F>(mut self, kind: EventKind, handler: F) -> Self
    where
        F: Fn(&EventEnvelope) + 'static,
    {
        self.props.handlers = self.props.handlers.on(kind, handler);
        self
    }

    pub fn build(self) -> MapProps {
        self.props
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_splits_controlled_and_default_axes() {
        let props = MapPropsBuilder::new()
            .with_id("main")
            .with_center(1.0, 2.0)
            .with_default_zoom(5.0)
            .with_color_scheme(ColorScheme::Dark)
            .on(EventKind::Click, |_| {})
            .build();

        assert_eq!(props.registry_id(), "main");
        assert_eq!(props.camera.desired().center, Some(LatLngAltitude::new(1.0, 2.0, 0.0)));
        assert_eq!(props.camera.desired().zoom, None);
        assert_eq!(props.camera.defaults().zoom, Some(5.0));
        assert_eq!(props.identity.color_scheme, Some(ColorScheme::Dark));
        assert_eq!(props.handlers.len(), 1);
    }
}
