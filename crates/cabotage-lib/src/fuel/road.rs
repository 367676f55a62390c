//! Road leg fuel model.
//!
//! Each trip drives the leg loaded and, for a share `s` of the distance,
//! returns empty at a better efficiency:
//!
//! `liters_per_trip = d × (s / kmL_empty + (1 − s) / kmL_loaded)`
//!
//! Trip count is `ceil(cargo_t / payload_t)`, so the result is piecewise
//! linear in cargo mass and linear in distance and trip count.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::constants::{diesel_co2e_kg_per_l, DIESEL_DENSITY_KG_PER_L};
use super::leg::Leg;
use super::truck::TruckPreset;

/// Liters and efficiency figures behind a road leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadFuelEstimate {
    pub trips: u32,
    pub km_per_l_loaded: f64,
    pub km_per_l_empty: f64,
    /// Loaded share plus empty-backhaul share for one trip.
    pub liters_per_trip: f64,
    pub liters_loaded: f64,
    pub liters_empty: f64,
    pub liters_total: f64,
}

/// A road leg together with its liter breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadLeg {
    #[serde(flatten)]
    pub leg: Leg,
    pub fuel: RoadFuelEstimate,
}

/// Reject inputs the road model cannot handle. Runs before any arithmetic.
///
/// # Errors
///
/// Returns the truck's efficiency and trip-count errors, or
/// [`Error::InvalidParameter`] for a backhaul share outside `[0, 1]` or a
/// negative diesel price.
pub fn validate_road_inputs(
    cargo_t: f64,
    truck: &TruckPreset,
    empty_backhaul_share: f64,
    diesel_price_brl_l: f64,
) -> Result<()> {
    truck.km_per_l_loaded()?;
    truck.trips_for(cargo_t)?;
    if !(0.0..=1.0).contains(&empty_backhaul_share) {
        return Err(Error::InvalidParameter {
            name: "empty_backhaul_share".to_string(),
            message: format!("must be within [0, 1], got {empty_backhaul_share}"),
        });
    }
    if !diesel_price_brl_l.is_finite() || diesel_price_brl_l < 0.0 {
        return Err(Error::InvalidParameter {
            name: "diesel_price_brl_l".to_string(),
            message: format!("must be finite and non-negative, got {diesel_price_brl_l}"),
        });
    }
    Ok(())
}

/// Liters of diesel to move `cargo_t` over `distance_km`.
///
/// Each trip runs `1 - empty_backhaul_share` of the distance at loaded
/// efficiency and the rest at empty efficiency.
///
/// # Errors
///
/// Same as [`validate_road_inputs`], plus [`Error::InvalidParameter`] for a
/// negative or non-finite distance.
pub fn estimate_road_liters(
    distance_km: f64,
    cargo_t: f64,
    truck: &TruckPreset,
    empty_backhaul_share: f64,
) -> Result<RoadFuelEstimate> {
    validate_road_inputs(cargo_t, truck, empty_backhaul_share, 0.0)?;
    validate_distance(distance_km)?;

    let km_per_l_loaded = truck.km_per_l_loaded()?;
    let km_per_l_empty = truck.km_per_l_empty()?;
    let trips = truck.trips_for(cargo_t)?;

    let loaded_per_trip = distance_km * (1.0 - empty_backhaul_share) / km_per_l_loaded;
    let empty_per_trip = distance_km * empty_backhaul_share / km_per_l_empty;
    let liters_per_trip = loaded_per_trip + empty_per_trip;
    let trips_f = f64::from(trips);

    let estimate = RoadFuelEstimate {
        trips,
        km_per_l_loaded,
        km_per_l_empty,
        liters_per_trip,
        liters_loaded: loaded_per_trip * trips_f,
        liters_empty: empty_per_trip * trips_f,
        liters_total: liters_per_trip * trips_f,
    };

    debug!(
        distance_km,
        cargo_t,
        truck = %truck.name,
        trips,
        liters_total = estimate.liters_total,
        "estimated road liters"
    );
    Ok(estimate)
}

/// Full road leg: liters converted to fuel mass, CO₂e and cost.
///
/// # Errors
///
/// Same as [`estimate_road_liters`].
pub fn road_leg(
    distance_km: f64,
    hours: f64,
    cargo_t: f64,
    truck: &TruckPreset,
    empty_backhaul_share: f64,
    diesel_price_brl_l: f64,
) -> Result<RoadLeg> {
    validate_road_inputs(cargo_t, truck, empty_backhaul_share, diesel_price_brl_l)?;
    let fuel = estimate_road_liters(distance_km, cargo_t, truck, empty_backhaul_share)?;
    let liters = fuel.liters_total;

    Ok(RoadLeg {
        leg: Leg {
            distance_km,
            hours: hours.max(0.0),
            fuel_kg: liters * DIESEL_DENSITY_KG_PER_L,
            co2e_kg: liters * diesel_co2e_kg_per_l(),
            cost_brl: liters * diesel_price_brl_l,
            provenance: None,
            profile: None,
        },
        fuel,
    })
}

fn validate_distance(distance_km: f64) -> Result<()> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(Error::InvalidParameter {
            name: "distance_km".to_string(),
            message: format!("must be finite and non-negative, got {distance_km}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_backhaul_uses_empty_efficiency_only() {
        let semi = TruckPreset::by_name("semi_27t").unwrap();
        let est = estimate_road_liters(100.0, 10.0, semi, 1.0).unwrap();
        assert_eq!(est.liters_loaded, 0.0);
        let expected = 100.0 / (2.3 * 1.18);
        assert!((est.liters_total - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_distance_costs_nothing() {
        let semi = TruckPreset::by_name("semi_27t").unwrap();
        let leg = road_leg(0.0, 0.0, 10.0, semi, 0.0, 6.0).unwrap();
        assert_eq!(leg.leg.fuel_kg, 0.0);
        assert_eq!(leg.leg.cost_brl, 0.0);
    }
}
