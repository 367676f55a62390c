use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::sea::DistanceSource;

/// Fuel, emissions, cost and schedule for one leg of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub distance_km: f64,
    /// Travel time, excluding port dwell.
    pub hours: f64,
    /// Fuel burned, kilograms. Road legs convert litres with the diesel density.
    pub fuel_kg: f64,
    /// Tank-to-wheel (or tank-to-wake) CO₂e, kilograms.
    pub co2e_kg: f64,
    pub cost_brl: f64,
    /// Set for sea legs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<DistanceSource>,
    /// Routing profile that produced the distance, set for road legs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl Leg {
    /// Headline figures without provenance.
    pub fn metrics(&self) -> Metrics {
        Metrics {
            distance_km: self.distance_km,
            hours: self.hours,
            fuel_kg: self.fuel_kg,
            co2e_kg: self.co2e_kg,
            cost_brl: self.cost_brl,
        }
    }
}

/// Summable headline figures: used for totals and deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub distance_km: f64,
    pub hours: f64,
    pub fuel_kg: f64,
    pub co2e_kg: f64,
    pub cost_brl: f64,
}

impl Metrics {
    /// Exact sum of the parts, no rounding.
    pub fn sum<I: IntoIterator<Item = Metrics>>(parts: I) -> Self {
        parts.into_iter().fold(Metrics::default(), |acc, m| acc + m)
    }

    /// Round every field to `decimals` places for display.
    pub fn rounded(&self, decimals: i32) -> Self {
        let factor = 10f64.powi(decimals);
        let round = |v: f64| (v * factor).round() / factor;
        Metrics {
            distance_km: round(self.distance_km),
            hours: round(self.hours),
            fuel_kg: round(self.fuel_kg),
            co2e_kg: round(self.co2e_kg),
            cost_brl: round(self.cost_brl),
        }
    }
}

impl Add for Metrics {
    type Output = Metrics;

    fn add(self, rhs: Metrics) -> Metrics {
        Metrics {
            distance_km: self.distance_km + rhs.distance_km,
            hours: self.hours + rhs.hours,
            fuel_kg: self.fuel_kg + rhs.fuel_kg,
            co2e_kg: self.co2e_kg + rhs.co2e_kg,
            cost_brl: self.cost_brl + rhs.cost_brl,
        }
    }
}

impl Sub for Metrics {
    type Output = Metrics;

    fn sub(self, rhs: Metrics) -> Metrics {
        Metrics {
            distance_km: self.distance_km - rhs.distance_km,
            hours: self.hours - rhs.hours,
            fuel_kg: self.fuel_kg - rhs.fuel_kg,
            co2e_kg: self.co2e_kg - rhs.co2e_kg,
            cost_brl: self.cost_brl - rhs.cost_brl,
        }
    }
}
