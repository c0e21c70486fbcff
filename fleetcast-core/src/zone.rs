use serde::{Deserialize, Serialize};

pub type ZoneId = u32;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A fixed geographic partition of the service area. Static reference data,
/// loaded once at startup and immutable for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub borough: String,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
}

impl Zone {
    /// Haversine distance between this zone's centroid and another's, in meters.
    pub fn distance_m(&self, other: &Zone) -> f64 {
        haversine_m(
            self.centroid_lat,
            self.centroid_lon,
            other.centroid_lat,
            other.centroid_lon,
        )
    }
}

/// Great-circle distance between two WGS84 points, in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let sin_dphi = (dphi * 0.5).sin();
    let sin_dlambda = (dlambda * 0.5).sin();
    let a = sin_dphi * sin_dphi + phi1.cos() * phi2.cos() * sin_dlambda * sin_dlambda;
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(id: ZoneId, lat: f64, lon: f64) -> Zone {
        Zone {
            id,
            name: format!("Zone {}", id),
            borough: "Test".to_string(),
            centroid_lat: lat,
            centroid_lon: lon,
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        let a = zone(1, 40.7077, -74.0083);
        assert_eq!(a.distance_m(&a), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = zone(1, 40.7077, -74.0083);
        let b = zone(2, 40.7549, -73.9840);
        assert!((a.distance_m(&b) - b.distance_m(&a)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = haversine_m(40.0, -74.0, 41.0, -74.0);
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn downtown_to_midtown_is_a_few_kilometers() {
        let downtown = zone(1, 40.7077, -74.0083);
        let midtown = zone(2, 40.7549, -73.9840);
        let d = downtown.distance_m(&midtown);
        assert!(d > 4_000.0 && d < 7_000.0, "got {}", d);
    }
}
