//! Port catalog loading and lookup.
//!
//! The catalog is read once at startup from a JSON list of port records and
//! is immutable afterwards. Lookups go through a normalized alias table
//! first and fall back to the canonical name. Integrity problems (duplicate
//! names, alias collisions, empty catalog, bad coordinates) are reported at
//! load time and never surface during an evaluation.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geo::{Coordinates, Point};

use super::{normalize_label, strip_port_prefix};

/// Truck-accessible gate of a port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub label: String,
    pub coordinates: Coordinates,
}

/// A candidate port for the sea leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    /// Display label.
    pub label: String,
    /// Canonical name, unique within the catalog.
    pub name: String,
    pub city: String,
    pub state: String,
    /// Nominal (marine) coordinates.
    pub coordinates: Coordinates,
    pub aliases: Vec<String>,
    pub gates: Vec<Gate>,
}

impl Port {
    /// The gate closest to `from`, if the port lists any gates.
    pub fn nearest_gate(&self, from: &Coordinates) -> Option<&Gate> {
        let mut best: Option<(&Gate, f64)> = None;
        for gate in &self.gates {
            let d = from.distance_km(&gate.coordinates);
            // Strict comparison keeps the first listed gate on ties.
            if best.map(|(_, best_d)| d < best_d).unwrap_or(true) {
                best = Some((gate, d));
            }
        }
        best.map(|(gate, _)| gate)
    }

    /// Coordinates used for proximity and road routing: nearest gate when
    /// present, nominal coordinates otherwise.
    pub fn anchor_for(&self, from: &Coordinates) -> Coordinates {
        self.nearest_gate(from)
            .map(|gate| gate.coordinates)
            .unwrap_or(self.coordinates)
    }

    /// The road endpoint for this port as seen from `from`.
    pub fn road_point(&self, from: &Coordinates) -> Point {
        match self.nearest_gate(from) {
            Some(gate) => Point::new(format!("{} ({})", self.name, gate.label), gate.coordinates),
            None => Point::new(self.name.clone(), self.coordinates),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPort {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    gates: Vec<RawGate>,
}

#[derive(Debug, Deserialize)]
struct RawGate {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// Indexed, read-only collection of ports in catalog insertion order.
#[derive(Debug, Clone, Default)]
pub struct PortCatalog {
    ports: Vec<Port>,
    by_alias: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    source: Option<PathBuf>,
}

impl PortCatalog {
    /// Load a port catalog from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        let mut catalog = Self::from_reader(file)?;
        catalog.source = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            ports = catalog.len(),
            with_gates = catalog.ports.iter().filter(|p| !p.gates.is_empty()).count(),
            "loaded port catalog"
        );
        Ok(catalog)
    }

    /// Load a port catalog from a reader containing a JSON list of records.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: Vec<RawPort> =
            serde_json::from_reader(reader).map_err(|err| Error::PortDataValidation {
                message: format!("failed to parse ports JSON: {err}"),
            })?;

        let mut ports = Vec::with_capacity(raw.len());
        for (idx, record) in raw.into_iter().enumerate() {
            ports.push(port_from_raw(record, idx)?);
        }
        Self::from_ports(ports)
    }

    /// Build a catalog from already-constructed ports, enforcing integrity rules.
    pub fn from_ports(ports: Vec<Port>) -> Result<Self> {
        if ports.is_empty() {
            return Err(Error::EmptyPortCatalog);
        }

        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (idx, port) in ports.iter().enumerate() {
            let key = normalize_label(&port.name);
            if key.is_empty() {
                return Err(Error::PortDataValidation {
                    message: format!("port at position {idx} has an empty name"),
                });
            }
            if by_name.insert(key, idx).is_some() {
                return Err(Error::DuplicatePortName {
                    name: port.name.clone(),
                });
            }
        }

        let mut by_alias: HashMap<String, usize> = HashMap::new();
        for (idx, port) in ports.iter().enumerate() {
            for alias in port.aliases.iter().chain(std::iter::once(&port.label)) {
                let key = normalize_label(alias);
                if key.is_empty() {
                    continue;
                }
                if let Some(&owner) = by_name.get(&key) {
                    if owner != idx {
                        return Err(Error::AliasCollision {
                            alias: alias.clone(),
                            first: ports[owner].name.clone(),
                            second: port.name.clone(),
                        });
                    }
                    continue;
                }
                match by_alias.get(&key) {
                    Some(&owner) if owner != idx => {
                        return Err(Error::AliasCollision {
                            alias: alias.clone(),
                            first: ports[owner].name.clone(),
                            second: port.name.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        by_alias.insert(key, idx);
                    }
                }
            }
        }

        debug!(
            ports = ports.len(),
            aliases = by_alias.len(),
            "indexed port catalog"
        );

        Ok(Self {
            ports,
            by_alias,
            by_name,
            source: None,
        })
    }

    /// Resolve a label or alias to a port, or `None` when unknown.
    ///
    /// Matching is on the normalized label (case, diacritics, whitespace).
    /// When that misses, a leading "Porto de/do/da" is dropped and the rest
    /// is tried again, so "Porto de Salvador (BA)" finds "Salvador (BA)".
    pub fn resolve(&self, label_or_alias: &str) -> Option<&Port> {
        let key = normalize_label(label_or_alias);
        self.index_of(&key)
            .or_else(|| strip_port_prefix(&key).and_then(|rest| self.index_of(rest)))
            .map(|idx| &self.ports[idx])
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        self.by_alias
            .get(key)
            .or_else(|| self.by_name.get(key))
            .copied()
    }

    /// Resolve a label or alias to a port, reporting close matches on failure.
    pub fn lookup(&self, label_or_alias: &str) -> Result<&Port> {
        self.resolve(label_or_alias)
            .ok_or_else(|| Error::UnknownPort {
                name: label_or_alias.to_string(),
                suggestions: self.suggestions(label_or_alias),
            })
    }

    /// Look up a port by its identifier.
    pub fn get_by_id(&self, id: &str) -> Option<&Port> {
        self.ports.iter().find(|port| port.id == id)
    }

    /// Canonical name for a label or alias.
    pub fn canonical_name(&self, label_or_alias: &str) -> Option<&str> {
        self.resolve(label_or_alias).map(|port| port.name.as_str())
    }

    /// Ports in catalog insertion order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Get the source path if the catalog was loaded from a file.
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn suggestions(&self, query: &str) -> Vec<String> {
        let needle = normalize_label(query);
        let mut scored: Vec<(f64, &str)> = self
            .ports
            .iter()
            .map(|port| {
                let score = strsim::jaro_winkler(&needle, &normalize_label(&port.name));
                (score, port.name.as_str())
            })
            .filter(|(score, _)| *score >= 0.8)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored
            .into_iter()
            .take(3)
            .map(|(_, name)| name.to_string())
            .collect()
    }
}

fn port_from_raw(record: RawPort, position: usize) -> Result<Port> {
    let name = record.name.trim().to_string();
    let coordinates =
        Coordinates::new(record.lat, record.lon).map_err(|err| Error::PortDataValidation {
            message: format!("port '{name}' (position {position}): {err}"),
        })?;

    let mut gates = Vec::with_capacity(record.gates.len());
    for raw_gate in record.gates {
        let (Some(lat), Some(lon)) = (raw_gate.lat, raw_gate.lon) else {
            warn!(port = %name, "skipping gate without coordinates");
            continue;
        };
        let coordinates = Coordinates::new(lat, lon).map_err(|err| Error::PortDataValidation {
            message: format!("gate of port '{name}': {err}"),
        })?;
        gates.push(Gate {
            label: raw_gate
                .label
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "gate".to_string()),
            coordinates,
        });
    }

    let mut aliases: Vec<String> = Vec::new();
    for alias in record.aliases {
        let alias = alias.trim().to_string();
        let key = normalize_label(&alias);
        if key.is_empty() || key == normalize_label(&name) {
            continue;
        }
        if !aliases.iter().any(|a| normalize_label(a) == key) {
            aliases.push(alias);
        }
    }

    Ok(Port {
        id: record
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| normalize_label(&name)),
        label: record
            .label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| name.clone()),
        city: record.city.trim().to_string(),
        state: record.state.trim().to_uppercase(),
        name,
        coordinates,
        aliases,
        gates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_alias_equal_to_own_name_and_duplicates() {
        let json = r#"[{"name": "Santos (SP)", "lat": -23.95, "lon": -46.33,
            "aliases": ["santos (sp)", "Porto de Santos", "PORTO DE SANTOS"]}]"#;
        let catalog = PortCatalog::from_reader(json.as_bytes()).unwrap();
        let port = catalog.lookup("porto de santos").unwrap();
        assert_eq!(port.aliases, vec!["Porto de Santos".to_string()]);
        assert_eq!(port.id, "santos (sp)");
    }

    #[test]
    fn skips_gates_missing_coordinates() {
        let json = r#"[{"name": "Suape (PE)", "lat": -8.39, "lon": -34.96,
            "gates": [{"label": "Norte"}, {"lat": -8.40, "lon": -34.97}]}]"#;
        let catalog = PortCatalog::from_reader(json.as_bytes()).unwrap();
        let port = catalog.lookup("Suape (PE)").unwrap();
        assert_eq!(port.gates.len(), 1);
        assert_eq!(port.gates[0].label, "gate");
    }
}
