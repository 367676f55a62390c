//! Hotel-at-berth fuel factors.
//!
//! A factor is the auxiliary-engine fuel burned while docked, expressed as
//! kilograms of fuel per tonne of cargo per port call. The table is produced
//! offline from port-call records and consumed here as read-only data.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

use super::catalog::{Port, PortCatalog};
use super::normalize_label;

const EXPECTED_UNIT: &str = "kg_fuel_per_tonne";
const EXPECTED_SCOPE: &str = "hotel_at_berth";

/// Where a hotel factor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotelFactorSource {
    Table,
    Default,
}

#[derive(Debug, Deserialize)]
struct RawHotelTable {
    unit: Option<String>,
    scope: Option<String>,
    entries: Option<Vec<RawHotelEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawHotelEntry {
    #[serde(default)]
    port: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    kg_fuel_per_t: Option<f64>,
}

/// Per-port hotel factors keyed by canonical port name.
#[derive(Debug, Clone, Default)]
pub struct HotelFactors {
    factors: HashMap<String, f64>,
    default_kg_per_t: f64,
}

impl HotelFactors {
    /// Load the factor table from a JSON file, resolving entries against `catalog`.
    pub fn from_path(path: &Path, catalog: &PortCatalog) -> Result<Self> {
        let file = fs::File::open(path)?;
        let factors = Self::from_reader(file, catalog)?;
        info!(
            path = %path.display(),
            ports = factors.factors.len(),
            "loaded hotel factor table"
        );
        Ok(factors)
    }

    /// Load the factor table from a JSON reader.
    pub fn from_reader<R: Read>(reader: R, catalog: &PortCatalog) -> Result<Self> {
        let raw: RawHotelTable =
            serde_json::from_reader(reader).map_err(|err| Error::HotelFactorValidation {
                message: format!("failed to parse hotel JSON: {err}"),
            })?;

        if raw.unit.as_deref() != Some(EXPECTED_UNIT) || raw.scope.as_deref() != Some(EXPECTED_SCOPE)
        {
            return Err(Error::HotelFactorValidation {
                message: format!(
                    "expected unit '{EXPECTED_UNIT}' and scope '{EXPECTED_SCOPE}', got {:?}/{:?}",
                    raw.unit, raw.scope
                ),
            });
        }

        let entries = raw.entries.ok_or_else(|| Error::HotelFactorValidation {
            message: "missing 'entries' list".to_string(),
        })?;

        let mut factors: HashMap<String, f64> = HashMap::new();
        for (row, entry) in entries.into_iter().enumerate() {
            let Some(value) = entry.kg_fuel_per_t else {
                continue;
            };
            if !value.is_finite() || value < 0.0 {
                return Err(Error::HotelFactorValidation {
                    message: format!("kg_fuel_per_t must be finite and non-negative at entry {row}, got {value}"),
                });
            }

            let targets = resolve_entry_ports(&entry, catalog);
            if targets.is_empty() {
                warn!(
                    entry = row,
                    port = entry.port.as_deref().unwrap_or(""),
                    city = entry.city.as_deref().unwrap_or(""),
                    "hotel factor entry matches no catalog port"
                );
                continue;
            }
            for name in targets {
                if factors.contains_key(&name) {
                    warn!(port = %name, entry = row, "duplicate hotel factor ignored");
                    continue;
                }
                factors.insert(name, value);
            }
        }

        if factors.is_empty() {
            return Err(Error::HotelFactorValidation {
                message: "no usable port factors found in entries".to_string(),
            });
        }

        Ok(Self {
            factors,
            default_kg_per_t: 0.0,
        })
    }

    /// Build factors directly from canonical port names.
    pub fn from_map(factors: HashMap<String, f64>) -> Result<Self> {
        if let Some((name, value)) = factors.iter().find(|(_, v)| !v.is_finite() || **v < 0.0) {
            return Err(Error::HotelFactorValidation {
                message: format!("factor for '{name}' must be finite and non-negative, got {value}"),
            });
        }
        Ok(Self {
            factors,
            default_kg_per_t: 0.0,
        })
    }

    /// Replace the factor used for ports absent from the table.
    pub fn with_default(mut self, default_kg_per_t: f64) -> Result<Self> {
        if !default_kg_per_t.is_finite() || default_kg_per_t < 0.0 {
            return Err(Error::InvalidParameter {
                name: "default_hotel_kg_per_t".to_string(),
                message: format!("must be finite and non-negative, got {default_kg_per_t}"),
            });
        }
        self.default_kg_per_t = default_kg_per_t;
        Ok(self)
    }

    /// Factor for `port` and whether it came from the table or the default.
    pub fn factor_for(&self, port: &Port) -> (f64, HotelFactorSource) {
        match self.factors.get(&port.name) {
            Some(&value) => (value, HotelFactorSource::Table),
            None => {
                warn!(
                    port = %port.name,
                    default_kg_per_t = self.default_kg_per_t,
                    "no hotel factor for port; using default"
                );
                (self.default_kg_per_t, HotelFactorSource::Default)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

fn resolve_entry_ports(entry: &RawHotelEntry, catalog: &PortCatalog) -> Vec<String> {
    if let Some(port) = entry.port.as_deref().and_then(|label| catalog.resolve(label)) {
        return vec![port.name.clone()];
    }
    let Some(city) = entry.city.as_deref().map(normalize_label) else {
        return Vec::new();
    };
    catalog
        .ports()
        .iter()
        .filter(|port| normalize_label(&port.city) == city)
        .map(|port| port.name.clone())
        .collect()
}
