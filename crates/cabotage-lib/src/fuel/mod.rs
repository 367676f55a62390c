//! Leg cost model: fuel, emissions, cost and schedule per leg.
//!
//! - [`truck`] - Truck presets and axle-indexed baseline km/L
//! - [`road`] - Road legs with trip rounding and empty backhaul
//! - [`sea`] - Sea legs from cargo tonne-kilometres
//! - [`port_ops`] - Hotel fuel and handling at both ports
//! - [`leg`] - The `Leg` value type and summable `Metrics`
//! - [`prices`] - Diesel price table by state
//! - [`constants`] - Densities, emission factors and GWPs
//!
//! Every function here is pure: inputs are validated up front and the same
//! inputs always produce the same leg.
//!
//! # Example
//!
//! ```
//! use cabotage_lib::fuel::{road_leg, TruckPreset};
//!
//! let semi = TruckPreset::by_name("semi_27t").unwrap();
//! let leg = road_leg(405.5, 6.0, 26.0, semi, 0.0, 6.0).unwrap();
//! assert!((leg.fuel.liters_total - 176.3).abs() < 0.1);
//! ```

pub mod constants;
pub mod leg;
pub mod port_ops;
pub mod prices;
pub mod road;
pub mod sea;
pub mod truck;

pub use constants::{
    DIESEL_CO2_KG_PER_L, DIESEL_DENSITY_KG_PER_L, GWP100_CH4, GWP100_N2O, MGO_CO2_KG_PER_T,
};
pub use leg::{Leg, Metrics};
pub use port_ops::{port_ops, HotelFuel, PortOpsBreakdown, PortOpsParams};
pub use prices::{DieselPriceQuote, DieselPriceTable};
pub use road::{estimate_road_liters, road_leg, validate_road_inputs, RoadFuelEstimate, RoadLeg};
pub use sea::{sea_leg, SeaLegParams};
pub use truck::{baseline_km_per_l, TruckPreset, DEFAULT_TRUCK_PRESET, MAX_TRIPS};
