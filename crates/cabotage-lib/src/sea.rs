//! Port-to-port sea distances.
//!
//! Distances come from a precomputed symmetric matrix when the pair is
//! listed. Otherwise the great-circle distance between the ports' nominal
//! coordinates is scaled by the matrix's coastline factor. Every distance is
//! reported together with its provenance.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geo::haversine_km;
use crate::ports::{normalize_label, Port, PortCatalog};

/// Coastline factor used when the matrix file does not declare one.
pub const DEFAULT_COASTLINE_FACTOR: f64 = 1.15;

/// Where a sea distance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceSource {
    /// Listed in the precomputed matrix.
    Matrix,
    /// Great-circle distance times the coastline factor.
    Haversine,
}

impl fmt::Display for DistanceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            DistanceSource::Matrix => "matrix",
            DistanceSource::Haversine => "haversine",
        };
        f.write_str(value)
    }
}

/// One matrix entry, keyed by the unordered pair of canonical labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeaMatrixEntry {
    pub port_a: String,
    pub port_b: String,
    pub distance_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A resolved sea distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeaDistance {
    pub distance_km: f64,
    pub source: DistanceSource,
}

#[derive(Debug, Deserialize)]
struct RawSeaMatrix {
    #[serde(default)]
    coastline_factor: Option<f64>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    matrix: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    entries: Vec<RawSeaEntry>,
}

#[derive(Debug, Deserialize)]
struct RawSeaEntry {
    a: String,
    b: String,
    km: f64,
    #[serde(default)]
    source: Option<String>,
}

/// Symmetric port-pair distance table.
#[derive(Debug, Clone)]
pub struct SeaMatrix {
    entries: HashMap<(String, String), SeaMatrixEntry>,
    covered: HashSet<String>,
    coastline_factor: f64,
    source: Option<String>,
}

impl Default for SeaMatrix {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            covered: HashSet::new(),
            coastline_factor: DEFAULT_COASTLINE_FACTOR,
            source: None,
        }
    }
}

impl SeaMatrix {
    /// Empty matrix with the given coastline factor; every lookup falls back.
    pub fn with_coastline_factor(coastline_factor: f64) -> Result<Self> {
        validate_coastline_factor(coastline_factor)?;
        Ok(Self {
            coastline_factor,
            ..Self::default()
        })
    }

    /// Load the matrix from a JSON file, canonicalizing labels through `catalog`.
    pub fn from_path(path: &Path, catalog: &PortCatalog) -> Result<Self> {
        let file = fs::File::open(path)?;
        let matrix = Self::from_reader(file, catalog)?;
        info!(
            path = %path.display(),
            pairs = matrix.len(),
            coastline_factor = matrix.coastline_factor,
            "loaded sea distance matrix"
        );
        Ok(matrix)
    }

    /// Load the matrix from a JSON reader.
    ///
    /// Both the nested `matrix` object and the flat `entries` list are
    /// accepted and merged. Labels that do not resolve to a catalog port are
    /// kept under their normalized form and never match a lookup.
    pub fn from_reader<R: Read>(reader: R, catalog: &PortCatalog) -> Result<Self> {
        let raw: RawSeaMatrix =
            serde_json::from_reader(reader).map_err(|err| Error::SeaMatrixValidation {
                message: format!("failed to parse sea matrix JSON: {err}"),
            })?;

        let coastline_factor = raw.coastline_factor.unwrap_or(DEFAULT_COASTLINE_FACTOR);
        let mut matrix = Self::with_coastline_factor(coastline_factor)?;
        matrix.source = raw.source.clone();

        for (from, row) in &raw.matrix {
            for (to, &km) in row {
                matrix.insert(catalog, from, to, km, raw.source.clone())?;
            }
        }
        for entry in raw.entries {
            let source = entry.source.or_else(|| raw.source.clone());
            matrix.insert(catalog, &entry.a, &entry.b, entry.km, source)?;
        }

        Ok(matrix)
    }

    /// Add a pair. Conflicting distances for the same unordered pair are rejected.
    pub fn insert(
        &mut self,
        catalog: &PortCatalog,
        a: &str,
        b: &str,
        distance_km: f64,
        source: Option<String>,
    ) -> Result<()> {
        if !distance_km.is_finite() || distance_km < 0.0 {
            return Err(Error::SeaMatrixValidation {
                message: format!("distance {a} -> {b} must be finite and non-negative, got {distance_km}"),
            });
        }

        let key_a = canonical_key(catalog, a);
        let key_b = canonical_key(catalog, b);
        if key_a == key_b && distance_km != 0.0 {
            return Err(Error::SeaMatrixValidation {
                message: format!("distance from '{a}' to itself must be 0, got {distance_km}"),
            });
        }

        let key = pair_key(&key_a, &key_b);
        if let Some(existing) = self.entries.get(&key) {
            if (existing.distance_km - distance_km).abs() > 1e-9 {
                return Err(Error::SeaMatrixValidation {
                    message: format!(
                        "conflicting distances for '{a}' <-> '{b}': {} and {distance_km}",
                        existing.distance_km
                    ),
                });
            }
            return Ok(());
        }

        self.covered.insert(key_a.clone());
        self.covered.insert(key_b.clone());
        self.entries.insert(
            key,
            SeaMatrixEntry {
                port_a: key_a,
                port_b: key_b,
                distance_km,
                source,
            },
        );
        Ok(())
    }

    /// Listed distance between two canonical port names, if any.
    pub fn get(&self, a: &str, b: &str) -> Option<&SeaMatrixEntry> {
        self.entries
            .get(&pair_key(&normalize_label(a), &normalize_label(b)))
    }

    /// Whether the port appears in at least one listed pair.
    pub fn covers(&self, port: &Port) -> bool {
        self.covered.contains(&normalize_label(&port.name))
    }

    pub fn coastline_factor(&self) -> f64 {
        self.coastline_factor
    }

    /// Provenance note declared at the top of the matrix file.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Entries sorted by pair for stable listings.
    pub fn entries(&self) -> Vec<&SeaMatrixEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|x, y| (&x.port_a, &x.port_b).cmp(&(&y.port_a, &y.port_b)));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Answers sea distance queries between catalog ports.
#[derive(Debug, Clone, Copy)]
pub struct SeaDistanceProvider<'a> {
    catalog: &'a PortCatalog,
    matrix: &'a SeaMatrix,
}

impl<'a> SeaDistanceProvider<'a> {
    pub fn new(catalog: &'a PortCatalog, matrix: &'a SeaMatrix) -> Self {
        Self { catalog, matrix }
    }

    /// Sea distance between two ports. Never fails.
    pub fn distance(&self, a: &Port, b: &Port) -> SeaDistance {
        if a.name == b.name {
            return SeaDistance {
                distance_km: 0.0,
                source: DistanceSource::Matrix,
            };
        }

        if let Some(entry) = self.matrix.get(&a.name, &b.name) {
            debug!(from = %a.name, to = %b.name, km = entry.distance_km, "sea distance from matrix");
            return SeaDistance {
                distance_km: entry.distance_km,
                source: DistanceSource::Matrix,
            };
        }

        let km = haversine_km(&a.coordinates, &b.coordinates) * self.matrix.coastline_factor;
        warn!(
            from = %a.name,
            to = %b.name,
            km,
            coastline_factor = self.matrix.coastline_factor,
            "pair missing from sea matrix; using haversine fallback"
        );
        SeaDistance {
            distance_km: km,
            source: DistanceSource::Haversine,
        }
    }

    /// Sea distance between two port labels or aliases.
    pub fn distance_between(&self, a: &str, b: &str) -> Result<SeaDistance> {
        let port_a = self.catalog.lookup(a)?;
        let port_b = self.catalog.lookup(b)?;
        Ok(self.distance(port_a, port_b))
    }

    pub fn matrix(&self) -> &SeaMatrix {
        self.matrix
    }
}

fn validate_coastline_factor(factor: f64) -> Result<()> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(Error::SeaMatrixValidation {
            message: format!("coastline_factor must be finite and positive, got {factor}"),
        });
    }
    Ok(())
}

fn canonical_key(catalog: &PortCatalog, label: &str) -> String {
    match catalog.canonical_name(label) {
        Some(name) => normalize_label(name),
        None => {
            warn!(label, "sea matrix label does not match any catalog port");
            normalize_label(label)
        }
    }
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}
