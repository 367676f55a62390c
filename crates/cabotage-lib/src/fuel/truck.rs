//! Truck presets and axle-indexed baseline efficiency.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Name of the preset used when the caller does not choose one.
pub const DEFAULT_TRUCK_PRESET: &str = "semi_27t";

/// Largest number of truck trips a single shipment may need.
pub const MAX_TRIPS: u32 = 100_000;

/// Loaded-truck baseline efficiency (km/L) by axle count. Eight axles are
/// deliberately absent; nine or more share the last row.
const BASELINE_KM_PER_L: &[(u32, f64)] = &[
    (2, 4.0),
    (3, 3.0),
    (4, 2.7),
    (5, 2.3),
    (6, 2.0),
    (7, 2.0),
    (9, 1.7),
];

/// Baseline loaded efficiency for an axle count.
///
/// # Errors
///
/// Returns [`Error::UnsupportedVehicleConfiguration`] for an axle count with
/// no baseline.
pub fn baseline_km_per_l(axles: u32) -> Result<f64> {
    let lookup = if axles >= 9 { 9 } else { axles };
    BASELINE_KM_PER_L
        .iter()
        .find(|(a, _)| *a == lookup)
        .map(|(_, km_per_l)| *km_per_l)
        .ok_or(Error::UnsupportedVehicleConfiguration { axles })
}

/// Truck configuration used by the road leg model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckPreset {
    pub name: String,
    pub label: String,
    pub axles: u32,
    /// Payload carried per trip, tonnes.
    pub payload_t: f64,
    /// Reference loaded weight, tonnes. Informational; efficiency comes from
    /// the axle baseline alone.
    pub ref_weight_t: f64,
    /// Relative km/L improvement when running empty (0.18 = +18%).
    pub empty_efficiency_gain: f64,
}

impl TruckPreset {
    /// Build a custom preset, validating its fields.
    ///
    /// # Errors
    ///
    /// Fails on an unsupported axle count, a non-positive payload or a
    /// negative empty-efficiency gain.
    pub fn new(
        name: impl Into<String>,
        axles: u32,
        payload_t: f64,
        ref_weight_t: f64,
        empty_efficiency_gain: f64,
    ) -> Result<Self> {
        let name = name.into();
        baseline_km_per_l(axles)?;
        if !payload_t.is_finite() || payload_t <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "payload_t".to_string(),
                message: format!("must be finite and positive, got {payload_t}"),
            });
        }
        if !empty_efficiency_gain.is_finite() || empty_efficiency_gain < 0.0 {
            return Err(Error::InvalidParameter {
                name: "empty_efficiency_gain".to_string(),
                message: format!("must be finite and non-negative, got {empty_efficiency_gain}"),
            });
        }
        Ok(Self {
            label: name.clone(),
            name,
            axles,
            payload_t,
            ref_weight_t,
            empty_efficiency_gain,
        })
    }

    /// Look up a built-in preset by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTruckPreset`] with up to three close names.
    pub fn by_name(name: &str) -> Result<&'static TruckPreset> {
        let key = name.trim();
        let found = PRESETS.iter().find(|preset| preset.name == key);
        if let Some(preset) = found {
            debug!(preset = %preset.name, axles = preset.axles, "resolved truck preset");
            return Ok(preset);
        }

        let mut suggestions: Vec<(f64, &str)> = PRESETS
            .iter()
            .map(|p| (strsim::jaro_winkler(key, &p.name), p.name.as_str()))
            .filter(|(score, _)| *score >= 0.7)
            .collect();
        suggestions.sort_by(|a, b| b.0.total_cmp(&a.0));
        Err(Error::UnknownTruckPreset {
            name: key.to_string(),
            suggestions: suggestions
                .into_iter()
                .take(3)
                .map(|(_, n)| n.to_string())
                .collect(),
        })
    }

    /// All built-in presets in a stable order.
    pub fn all() -> &'static [TruckPreset] {
        &PRESETS
    }

    /// Loaded efficiency (km/L).
    pub fn km_per_l_loaded(&self) -> Result<f64> {
        baseline_km_per_l(self.axles)
    }

    /// Empty-return efficiency (km/L).
    pub fn km_per_l_empty(&self) -> Result<f64> {
        Ok(self.km_per_l_loaded()? * (1.0 + self.empty_efficiency_gain))
    }

    /// Number of trips needed to move `cargo_t`, never less than one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCargoMass`] for a non-positive or non-finite
    /// mass and [`Error::InvalidParameter`] when the shipment would need more
    /// than [`MAX_TRIPS`] trips.
    pub fn trips_for(&self, cargo_t: f64) -> Result<u32> {
        if !cargo_t.is_finite() || cargo_t <= 0.0 {
            return Err(Error::InvalidCargoMass { cargo_t });
        }
        let trips = (cargo_t / self.payload_t).ceil().max(1.0);
        if trips > f64::from(MAX_TRIPS) {
            return Err(Error::InvalidParameter {
                name: "cargo_t".to_string(),
                message: format!(
                    "{cargo_t} t needs {trips} trips with '{}', above the limit of {MAX_TRIPS}",
                    self.name
                ),
            });
        }
        Ok(trips as u32)
    }
}

fn preset(
    name: &str,
    label: &str,
    axles: u32,
    payload_t: f64,
    ref_weight_t: f64,
    gain: f64,
) -> TruckPreset {
    TruckPreset {
        name: name.to_string(),
        label: label.to_string(),
        axles,
        payload_t,
        ref_weight_t,
        empty_efficiency_gain: gain,
    }
}

static PRESETS: Lazy<Vec<TruckPreset>> = Lazy::new(|| {
    vec![
        preset("semi_27t", "Carreta (5 eixos) ~27 t payload", 5, 27.0, 20.0, 0.18),
        preset("carreta_6ax_30t", "Carreta (6 eixos) ~30 t payload", 6, 30.0, 22.0, 0.18),
        preset("bitrain_7ax_36t", "Bitrem (7 eixos) ~36 t payload", 7, 36.0, 24.0, 0.20),
        preset("rodotrem_9ax_48t", "Rodotrem (9 eixos) ~48 t payload", 9, 48.0, 28.0, 0.22),
    ]
});
