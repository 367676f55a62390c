//! Physical and emission constants shared by the leg cost model.

/// Diesel density in kilograms per litre.
pub const DIESEL_DENSITY_KG_PER_L: f64 = 0.84;

/// Tank-to-wheel CO₂ emitted per litre of diesel burned, in kilograms.
pub const DIESEL_CO2_KG_PER_L: f64 = 2.68;

/// Diesel CH₄ and N₂O per litre. Tracked so the CO₂e formula is complete;
/// both are currently zero, so road CO₂e equals CO₂.
pub const DIESEL_CH4_KG_PER_L: f64 = 0.0;
pub const DIESEL_N2O_KG_PER_L: f64 = 0.0;

/// Marine gas oil tank-to-wake emission factors, kilograms per tonne of fuel.
pub const MGO_CO2_KG_PER_T: f64 = 3206.0;
pub const MGO_CH4_KG_PER_T: f64 = 0.0;
pub const MGO_N2O_KG_PER_T: f64 = 0.0;

/// 100-year global warming potentials (IPCC AR6).
pub const GWP100_CH4: f64 = 29.8;
pub const GWP100_N2O: f64 = 273.0;

/// CO₂e per litre of diesel.
pub fn diesel_co2e_kg_per_l() -> f64 {
    DIESEL_CO2_KG_PER_L + DIESEL_CH4_KG_PER_L * GWP100_CH4 + DIESEL_N2O_KG_PER_L * GWP100_N2O
}

/// CO₂e per tonne of marine gas oil.
pub fn mgo_co2e_kg_per_t() -> f64 {
    MGO_CO2_KG_PER_T + MGO_CH4_KG_PER_T * GWP100_CH4 + MGO_N2O_KG_PER_T * GWP100_N2O
}
