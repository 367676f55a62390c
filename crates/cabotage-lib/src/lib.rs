//! Cabotage evaluation library entry points.
//!
//! This crate compares moving a container shipment by road against a
//! road-sea-road (cabotage) alternative along the Brazilian coast. It loads
//! the static port, sea-distance and hotel-factor data, prices each leg for
//! fuel, CO₂e and cost, and memoizes routing lookups in a persistent cache.
//! Higher-level consumers (the CLI) should only depend on the items
//! exported here.
//!

pub mod cache;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod fuel;
pub mod geo;
pub mod ports;
pub mod results;
pub mod routing;
pub mod sea;

pub use cache::{CacheKey, CacheStats, CachedResolver, CachedRouter, RouteCache, SqliteRouteCache};
pub use config::{CacheSettings, DataPaths, EvaluationParams};
pub use error::{Error, ErrorCategory, Result};
pub use evaluator::{EvaluationResult, Evaluator};
pub use fuel::{DieselPriceTable, Leg, Metrics, TruckPreset};
pub use geo::{Cep, Coordinates, Location, Point};
pub use ports::{HotelFactors, Port, PortCatalog, PortRole, PortSelector};
pub use results::ResultStore;
pub use routing::{
    AddressResolver, FallbackPolicy, FallbackRouter, GeocodingResolver, OrsClient, RouteProfile,
    RouteResponse, RoutingBackend, RoutingClient,
};
pub use sea::{DistanceSource, SeaDistanceProvider, SeaMatrix};
