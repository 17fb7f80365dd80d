use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// A coordinate with an altitude in meters, used by the 3-D camera.
///
/// The 2-D variant always carries `altitude == 0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLngAltitude {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub altitude: f64,
}

impl LatLngAltitude {
    pub fn new(lat: f64, lng: f64, altitude: f64) -> Self {
        Self { lat, lng, altitude }
    }

    /// Component-wise comparison with a tolerance
    pub fn approx_eq(&self, other: &LatLngAltitude, epsilon: f64) -> bool {
        (self.lat - other.lat).abs() <= epsilon
            && (self.lng - other.lng).abs() <= epsilon
            && (self.altitude - other.altitude).abs() <= epsilon
    }
}

impl From<LatLng> for LatLngAltitude {
    fn from(value: LatLng) -> Self {
        Self::new(value.lat, value.lng, 0.0)
    }
}

/// Represents a bounding box of geographical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    /// Degenerate bounds at the origin, used when the engine has none to report
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.south_west == self.north_east
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    /// Gets the span of the bounds
    pub fn span(&self) -> LatLng {
        LatLng::new(
            self.north_east.lat - self.south_west.lat,
            self.north_east.lng - self.south_west.lng,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_altitude_defaults_when_missing() {
        let parsed: LatLngAltitude = serde_json::from_str(r#"{"lat": 1.5, "lng": 2.5}"#).unwrap();
        assert_eq!(parsed, LatLngAltitude::new(1.5, 2.5, 0.0));
        assert_eq!(LatLngAltitude::from(LatLng::new(1.5, 2.5)), parsed);
    }

    #[test]
    fn test_bounds_center_and_span() {
        let bounds = LatLngBounds::from_coords(40.0, -75.0, 42.0, -73.0);
        assert_eq!(bounds.center(), LatLng::new(41.0, -74.0));
        assert_eq!(bounds.span(), LatLng::new(2.0, 2.0));
        assert!(LatLngBounds::empty().is_empty());
    }
}
