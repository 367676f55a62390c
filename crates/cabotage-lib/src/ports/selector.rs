//! Gate-aware nearest-port selection.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geo::Coordinates;

use super::catalog::{Gate, Port, PortCatalog};

/// Which end of the sea leg a port is selected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortRole {
    Origin,
    Destination,
}

impl fmt::Display for PortRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            PortRole::Origin => "origin",
            PortRole::Destination => "destination",
        };
        f.write_str(value)
    }
}

/// Outcome of a nearest-port query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortSelection {
    pub role: PortRole,
    pub port: Port,
    /// Great-circle distance from the query point to the anchor.
    pub distance_km: f64,
    /// Gate used as anchor, or `None` when the nominal coordinates were used.
    pub gate: Option<Gate>,
}

impl PortSelection {
    /// Coordinates the road leg should start or end at.
    pub fn anchor(&self) -> Coordinates {
        self.gate
            .as_ref()
            .map(|g| g.coordinates)
            .unwrap_or(self.port.coordinates)
    }
}

/// Picks the nearest port to a point from a borrowed catalog.
#[derive(Debug, Clone, Copy)]
pub struct PortSelector<'a> {
    catalog: &'a PortCatalog,
}

impl<'a> PortSelector<'a> {
    /// Selector over every port in `catalog`.
    pub fn new(catalog: &'a PortCatalog) -> Self {
        Self { catalog }
    }

    /// Nearest port to `point` over the whole catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPortAvailable`] only for an empty catalog.
    pub fn nearest_port(&self, point: &Coordinates, role: PortRole) -> Result<PortSelection> {
        self.nearest_port_where(point, role, |_| true)
    }

    /// Nearest port to `point` among ports accepted by `filter`.
    ///
    /// Distance is measured to the port's closest gate when it has gates and
    /// to its nominal coordinates otherwise. Equidistant candidates resolve to
    /// the one listed first in the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPortAvailable`] when `filter` rejects every port.
    pub fn nearest_port_where<F>(
        &self,
        point: &Coordinates,
        role: PortRole,
        filter: F,
    ) -> Result<PortSelection>
    where
        F: Fn(&Port) -> bool,
    {
        let mut best: Option<(&Port, f64, Option<&Gate>)> = None;

        for port in self.catalog.ports() {
            if !filter(port) {
                debug!(port = %port.name, %role, "port excluded by filter");
                continue;
            }
            let gate = port.nearest_gate(point);
            let anchor = gate.map(|g| g.coordinates).unwrap_or(port.coordinates);
            let distance = point.distance_km(&anchor);
            if best.map(|(_, d, _)| distance < d).unwrap_or(true) {
                best = Some((port, distance, gate));
            }
        }

        let (port, distance_km, gate) = best.ok_or_else(|| Error::NoPortAvailable {
            role: role.to_string(),
        })?;

        info!(
            port = %port.name,
            %role,
            distance_km,
            via = gate.map(|g| g.label.as_str()).unwrap_or("nominal coordinates"),
            "selected nearest port"
        );

        Ok(PortSelection {
            role,
            port: port.clone(),
            distance_km,
            gate: gate.cloned(),
        })
    }
}
