//! Core constants shared by the lifecycle, camera and event subsystems.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Registry id used when the caller does not name its map.
pub const DEFAULT_INSTANCE_ID: &str = "default";

/// Two camera values closer than this are considered equal.
pub const CAMERA_EPSILON: f64 = 1e-9;

/// Padding in pixels applied when fitting `default_bounds` without an explicit value.
pub const DEFAULT_BOUNDS_PADDING: f64 = 0.0;
