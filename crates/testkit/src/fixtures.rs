//! Fixture loaders for seeded zones and check scenarios.

use quick_evac_domain::{Coordinates, Zone, ZoneId, ZoneType};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::{fmt, fs};

/// Errors raised while loading fixtures.
#[derive(Debug)]
pub enum FixtureError {
    /// Fixture file does not exist.
    MissingFixture {
        /// Path that could not be found.
        path: PathBuf,
    },
    /// Fixture file could not be read.
    FixtureRead {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Fixture file could not be parsed.
    FixtureParse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// Fixture parsed but holds an invalid value.
    InvalidFixture {
        /// Offending entry.
        entry: String,
        /// What was wrong.
        reason: String,
    },
}

impl fmt::Display for FixtureError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFixture { path } => {
                write!(formatter, "missing fixture: {}", path.display())
            },
            Self::FixtureRead { path, source } => {
                write!(
                    formatter,
                    "failed to read fixture {}: {}",
                    path.display(),
                    source
                )
            },
            Self::FixtureParse { path, source } => {
                write!(
                    formatter,
                    "failed to parse fixture {}: {}",
                    path.display(),
                    source
                )
            },
            Self::InvalidFixture { entry, reason } => {
                write!(formatter, "invalid fixture entry {entry}: {reason}")
            },
        }
    }
}

impl std::error::Error for FixtureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FixtureRead { source, .. } => Some(source),
            Self::FixtureParse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Zone row as the backend seeds it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZoneSeed {
    /// Numeric id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// `RED`, `ORANGE` or `GREEN`.
    #[serde(rename = "type")]
    pub zone_type: String,
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
    /// Radius in kilometres.
    pub radius: f64,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

impl ZoneSeed {
    /// Convert into a domain zone.
    pub fn into_zone(self) -> Result<Zone, FixtureError> {
        let center = Coordinates::new(self.latitude, self.longitude).map_err(|error| {
            FixtureError::InvalidFixture {
                entry: self.name.clone(),
                reason: error.to_string(),
            }
        })?;
        Ok(Zone {
            id: ZoneId::new(self.id.to_string()),
            zone_type: ZoneType::parse(&self.zone_type),
            name: self.name.into(),
            center,
            radius_km: self.radius,
            address: None,
            description: self.description.map(Into::into),
        })
    }
}

/// One end-to-end check expectation against the sample zones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckScenario {
    /// Scenario name.
    pub name: String,
    /// Device latitude.
    pub latitude: f64,
    /// Device longitude.
    pub longitude: f64,
    /// Expected status headline.
    pub expected_label: String,
    /// Expected containing zone name.
    pub expected_zone: Option<String>,
    /// Whether an evacuation suggestion is expected.
    pub expects_evacuation: bool,
}

impl CheckScenario {
    /// Device position.
    pub fn location(&self) -> Result<Coordinates, FixtureError> {
        Coordinates::new(self.latitude, self.longitude).map_err(|error| {
            FixtureError::InvalidFixture {
                entry: self.name.clone(),
                reason: error.to_string(),
            }
        })
    }
}

/// Seeded zones (three hazard levels around one city).
pub fn sample_zones() -> Result<Vec<Zone>, FixtureError> {
    let seeds: Vec<ZoneSeed> = load_fixture("zones/sample-zones.json")?;
    seeds.into_iter().map(ZoneSeed::into_zone).collect()
}

/// Check scenarios for [`sample_zones`].
pub fn check_scenarios() -> Result<Vec<CheckScenario>, FixtureError> {
    load_fixture("scenarios/check-scenarios.json")
}

fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> Result<T, FixtureError> {
    let path = fixture_root().join(relative_path);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(FixtureError::MissingFixture { path });
        },
        Err(error) => {
            return Err(FixtureError::FixtureRead {
                path,
                source: error,
            });
        },
    };

    serde_json::from_str(&contents).map_err(|error| FixtureError::FixtureParse {
        path,
        source: error,
    })
}

/// Directory holding the testkit fixtures.
pub fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fixture_errors_are_reported() {
        let result: Result<Vec<ZoneSeed>, FixtureError> = load_fixture("zones/missing.json");
        assert!(matches!(result, Err(FixtureError::MissingFixture { .. })));
    }

    #[test]
    fn sample_zones_cover_every_level() -> Result<(), Box<dyn std::error::Error>> {
        let zones = sample_zones()?;
        assert_eq!(zones.len(), 6);
        for level in [ZoneType::Red, ZoneType::Orange, ZoneType::Green] {
            assert!(zones.iter().any(|zone| zone.zone_type == level));
        }
        Ok(())
    }

    #[test]
    fn out_of_range_seed_is_invalid() {
        let seed = ZoneSeed {
            id: 9,
            name: "Nowhere".to_owned(),
            zone_type: "RED".to_owned(),
            latitude: 91.0,
            longitude: 0.0,
            radius: 1.0,
            description: None,
        };
        assert!(matches!(
            seed.into_zone(),
            Err(FixtureError::InvalidFixture { .. })
        ));
    }
}
