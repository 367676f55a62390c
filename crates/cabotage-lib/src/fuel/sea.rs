//! Sea leg fuel model: fuel intensity per tonne-kilometre of cargo.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sea::SeaDistance;

use super::constants::mgo_co2e_kg_per_t;
use super::leg::Leg;

/// Coefficients for sea legs and hotel fuel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeaLegParams {
    /// Fuel intensity κ, kg of fuel per tonne of cargo per km.
    pub k_sea_kg_per_tkm: f64,
    /// Marine gas oil price, BRL per tonne of fuel.
    pub mgo_price_brl_per_t: f64,
    /// Vessel service speed, km/h.
    pub sea_speed_kmh: f64,
}

impl Default for SeaLegParams {
    fn default() -> Self {
        Self {
            k_sea_kg_per_tkm: 0.0027,
            mgo_price_brl_per_t: 3200.0,
            sea_speed_kmh: 30.0,
        }
    }
}

impl SeaLegParams {
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for a negative coefficient or a
    /// non-positive speed.
    pub fn validate(&self) -> Result<()> {
        check_non_negative("k_sea_kg_per_tkm", self.k_sea_kg_per_tkm)?;
        check_non_negative("mgo_price_brl_per_t", self.mgo_price_brl_per_t)?;
        if !self.sea_speed_kmh.is_finite() || self.sea_speed_kmh <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "sea_speed_kmh".to_string(),
                message: format!("must be finite and positive, got {}", self.sea_speed_kmh),
            });
        }
        Ok(())
    }

    /// CO₂e in kg for `fuel_kg` of marine gas oil.
    pub fn co2e_for_fuel(&self, fuel_kg: f64) -> f64 {
        fuel_kg * mgo_co2e_kg_per_t() / 1000.0
    }

    /// Cost in BRL for `fuel_kg` of marine gas oil.
    pub fn cost_for_fuel(&self, fuel_kg: f64) -> f64 {
        fuel_kg * self.mgo_price_brl_per_t / 1000.0
    }
}

/// Sea leg for `cargo_t` over a resolved port-to-port distance.
///
/// # Errors
///
/// Returns [`Error::InvalidCargoMass`] for a non-positive mass, or the
/// validation errors of `params`.
pub fn sea_leg(distance: SeaDistance, cargo_t: f64, params: &SeaLegParams) -> Result<Leg> {
    params.validate()?;
    if !cargo_t.is_finite() || cargo_t <= 0.0 {
        return Err(Error::InvalidCargoMass { cargo_t });
    }

    let fuel_kg = params.k_sea_kg_per_tkm * distance.distance_km * cargo_t;
    Ok(Leg {
        distance_km: distance.distance_km,
        hours: distance.distance_km / params.sea_speed_kmh,
        fuel_kg,
        co2e_kg: params.co2e_for_fuel(fuel_kg),
        cost_brl: params.cost_for_fuel(fuel_kg),
        provenance: Some(distance.source),
        profile: None,
    })
}

pub(crate) fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidParameter {
            name: name.to_string(),
            message: format!("must be finite and non-negative, got {value}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sea::DistanceSource;

    #[test]
    fn sea_leg_scales_with_tonne_km() {
        let params = SeaLegParams::default();
        let leg = sea_leg(
            SeaDistance {
                distance_km: 1000.0,
                source: DistanceSource::Matrix,
            },
            20.0,
            &params,
        )
        .unwrap();
        assert!((leg.fuel_kg - 54.0).abs() < 1e-9);
        assert!((leg.co2e_kg - 54.0 * 3.206).abs() < 1e-9);
        assert!((leg.cost_brl - 54.0 * 3.2).abs() < 1e-9);
        assert!((leg.hours - 1000.0 / 30.0).abs() < 1e-9);
        assert_eq!(leg.provenance, Some(DistanceSource::Matrix));
    }
}
