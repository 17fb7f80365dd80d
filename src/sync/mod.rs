//! Desired-vs-observed reconciliation for one live instance

pub mod camera;
pub mod options;
pub mod tracker;

pub use camera::CameraSynchronizer;
pub use options::OptionSynchronizer;
pub use tracker::{CameraTracker, RerenderHook};
