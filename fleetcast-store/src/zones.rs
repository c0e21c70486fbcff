use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use fleetcast_core::{CoreError, CoreResult, Zone, ZoneId};

/// Row shape of the zone reference file (`LocationID,zone,borough,...`).
#[derive(Debug, Deserialize)]
struct ZoneRecord {
    #[serde(rename = "LocationID")]
    location_id: ZoneId,
    zone: String,
    borough: String,
    centroid_lat: f64,
    centroid_lon: f64,
}

/// Read-only zone metadata and pairwise distances. Loaded once at process
/// start, shared behind an `Arc` for the lifetime of the process.
pub struct ZoneRegistry {
    zones: Vec<Zone>,
    by_id: HashMap<ZoneId, usize>,
    by_name: HashMap<String, usize>,
}

impl ZoneRegistry {
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| CoreError::Store(format!("cannot open {}: {}", path.display(), e)))?;

        let mut zones = Vec::new();
        for record in reader.deserialize::<ZoneRecord>() {
            let record = record
                .map_err(|e| CoreError::Store(format!("bad row in {}: {}", path.display(), e)))?;
            zones.push(Zone {
                id: record.location_id,
                name: record.zone,
                borough: record.borough,
                centroid_lat: record.centroid_lat,
                centroid_lon: record.centroid_lon,
            });
        }

        tracing::info!(count = zones.len(), path = %path.display(), "loaded zone registry");
        Self::from_zones(zones)
    }

    pub fn from_zones(zones: Vec<Zone>) -> CoreResult<Self> {
        if zones.is_empty() {
            return Err(CoreError::Store("zone registry is empty".to_string()));
        }

        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for (idx, zone) in zones.iter().enumerate() {
            if by_id.insert(zone.id, idx).is_some() {
                return Err(CoreError::Store(format!("duplicate zone id {}", zone.id)));
            }
            // Name-keyed submissions must resolve unambiguously
            if by_name.insert(zone.name.trim().to_lowercase(), idx).is_some() {
                return Err(CoreError::Store(format!(
                    "duplicate zone name {:?}",
                    zone.name
                )));
            }
        }

        Ok(Self {
            zones,
            by_id,
            by_name,
        })
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.by_id.get(&id).map(|&idx| &self.zones[idx])
    }

    /// Case-insensitive name lookup.
    pub fn get_by_name(&self, name: &str) -> Option<&Zone> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .map(|&idx| &self.zones[idx])
    }

    /// Centroid distance between two known zones, in meters.
    pub fn distance_m(&self, a: ZoneId, b: ZoneId) -> Option<f64> {
        Some(self.get(a)?.distance_m(self.get(b)?))
    }

    pub fn all(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
LocationID,zone,borough,centroid_lat,centroid_lon
1,Manhattan - Downtown,Manhattan,40.7077,-74.0083
2,Manhattan - Midtown,Manhattan,40.7549,-73.9840
9,Brooklyn - Downtown,Brooklyn,40.6934,-73.9857
";

    fn sample_registry() -> ZoneRegistry {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        ZoneRegistry::load(file.path()).unwrap()
    }

    #[test]
    fn loads_rows_and_looks_up_by_id() {
        let registry = sample_registry();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(9).unwrap().borough, "Brooklyn");
        assert!(registry.get(42).is_none());
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        let registry = sample_registry();
        assert_eq!(registry.get_by_name("manhattan - midtown").unwrap().id, 2);
        assert_eq!(registry.get_by_name(" MANHATTAN - MIDTOWN ").unwrap().id, 2);
        assert!(registry.get_by_name("Atlantis").is_none());
    }

    #[test]
    fn distances_are_non_negative_and_symmetric() {
        let registry = sample_registry();
        let ab = registry.distance_m(1, 2).unwrap();
        let ba = registry.distance_m(2, 1).unwrap();
        assert!(ab > 0.0);
        assert!((ab - ba).abs() < 1e-9);
        assert!(registry.distance_m(1, 42).is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let zones = vec![
            Zone {
                id: 1,
                name: "A".into(),
                borough: "B".into(),
                centroid_lat: 0.0,
                centroid_lon: 0.0,
            },
            Zone {
                id: 1,
                name: "C".into(),
                borough: "B".into(),
                centroid_lat: 1.0,
                centroid_lon: 1.0,
            },
        ];
        assert!(ZoneRegistry::from_zones(zones).is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let zones = vec![
            Zone {
                id: 1,
                name: "Midtown".into(),
                borough: "B".into(),
                centroid_lat: 0.0,
                centroid_lon: 0.0,
            },
            Zone {
                id: 2,
                name: " midtown ".into(),
                borough: "B".into(),
                centroid_lat: 1.0,
                centroid_lon: 1.0,
            },
        ];
        assert!(ZoneRegistry::from_zones(zones).is_err());
    }
}
