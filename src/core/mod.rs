pub mod builder;
pub mod camera;
pub mod config;
pub mod constants;
pub mod geo;
pub mod map;

pub use builder::MapPropsBuilder;
pub use camera::{
    BoundsFit, CameraAxis, CameraPatch, CameraState, CameraUpdate, CarriedCamera, DesiredCamera,
};
pub use config::{
    CameraProps, ColorScheme, GestureHandling, IdentityFields, IdentityKey, MapOptions, MapProps,
    RenderingType,
};
pub use geo::{LatLng, LatLngAltitude, LatLngBounds};
pub use map::MapController;
