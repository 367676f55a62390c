//! Port operations: hotel fuel at berth plus fixed handling per port call.
//!
//! Hotel fuel is allocated pro-rata by this shipment's mass
//! (`cargo_t × factor`) at both the origin and destination port. Handling
//! adds `2 × hours` of dwell and `2 × cost` BRL (load plus discharge)
//! regardless of mass, and burns no fuel.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ports::{HotelFactorSource, HotelFactors, Port};

use super::leg::Metrics;
use super::sea::{check_non_negative, SeaLegParams};

/// Fixed handling charges per port call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortOpsParams {
    /// Dwell per port call, hours.
    pub handling_hours: f64,
    /// Charge per port call, BRL.
    pub handling_cost_brl: f64,
}

impl Default for PortOpsParams {
    fn default() -> Self {
        Self {
            handling_hours: 12.0,
            handling_cost_brl: 800.0,
        }
    }
}

impl PortOpsParams {
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for a negative or non-finite field.
    pub fn validate(&self) -> Result<()> {
        check_non_negative("handling_hours", self.handling_hours)?;
        check_non_negative("handling_cost_brl", self.handling_cost_brl)
    }
}

/// Hotel fuel at one port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelFuel {
    pub port: String,
    /// Hotel factor applied, kg of fuel per tonne of cargo.
    pub kg_fuel_per_t: f64,
    pub hotel_factor_source: HotelFactorSource,
    pub fuel_kg: f64,
    pub co2e_kg: f64,
    pub cost_brl: f64,
}

/// Itemized port operations for one shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortOpsBreakdown {
    pub hotel_origin: HotelFuel,
    pub hotel_destination: HotelFuel,
    /// Dwell added by handling at both ports.
    pub handling_hours: f64,
    /// Handling charges at both ports.
    pub handling_cost_brl: f64,
    pub totals: Metrics,
}

fn hotel_fuel(
    cargo_t: f64,
    port: &Port,
    hotel: &HotelFactors,
    sea: &SeaLegParams,
) -> HotelFuel {
    let (factor, source) = hotel.factor_for(port);
    let fuel_kg = cargo_t * factor;
    HotelFuel {
        port: port.name.clone(),
        kg_fuel_per_t: factor,
        hotel_factor_source: source,
        fuel_kg,
        co2e_kg: sea.co2e_for_fuel(fuel_kg),
        cost_brl: sea.cost_for_fuel(fuel_kg),
    }
}

/// Port operations at `origin` and `destination` for `cargo_t`.
///
/// Hotel fuel is `cargo_t` times each port's hotel factor, priced and
/// converted with the sea leg's marine gas oil figures. Handling is charged
/// once per port.
///
/// # Errors
///
/// Returns [`Error::InvalidCargoMass`] for a non-positive mass and
/// [`Error::InvalidParameter`] when `sea` or `params` fail validation.
pub fn port_ops(
    cargo_t: f64,
    origin: &Port,
    destination: &Port,
    hotel: &HotelFactors,
    sea: &SeaLegParams,
    params: &PortOpsParams,
) -> Result<PortOpsBreakdown> {
    if !cargo_t.is_finite() || cargo_t <= 0.0 {
        return Err(Error::InvalidCargoMass { cargo_t });
    }
    sea.validate()?;
    params.validate()?;

    let hotel_origin = hotel_fuel(cargo_t, origin, hotel, sea);
    let hotel_destination = hotel_fuel(cargo_t, destination, hotel, sea);
    let handling_hours = 2.0 * params.handling_hours;
    let handling_cost_brl = 2.0 * params.handling_cost_brl;

    let totals = Metrics {
        distance_km: 0.0,
        hours: handling_hours,
        fuel_kg: hotel_origin.fuel_kg + hotel_destination.fuel_kg,
        co2e_kg: hotel_origin.co2e_kg + hotel_destination.co2e_kg,
        cost_brl: hotel_origin.cost_brl + hotel_destination.cost_brl + handling_cost_brl,
    };

    Ok(PortOpsBreakdown {
        hotel_origin,
        hotel_destination,
        handling_hours,
        handling_cost_brl,
        totals,
    })
}
