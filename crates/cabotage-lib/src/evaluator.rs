//! Single-route multimodal evaluation.
//!
//! For one shipment the evaluator resolves both endpoints, prices the direct
//! road route, picks the nearest origin and destination ports, prices the
//! road-sea-road alternative and reports the difference. Any failure along
//! the way fails the whole evaluation; partial results are never returned.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EvaluationParams;
use crate::error::{Error, Result};
use crate::fuel::{port_ops, road_leg, sea_leg, Leg, Metrics, PortOpsBreakdown, RoadLeg, TruckPreset};
use crate::geo::{Location, Point};
use crate::ports::{HotelFactors, Port, PortCatalog, PortRole, PortSelection, PortSelector};
use crate::routing::{AddressResolver, RouteProfile, RouteResponse, RouteStrategy, RoutingClient};
use crate::sea::{SeaDistanceProvider, SeaMatrix};

/// Echo of the caller's request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationInput {
    pub origin: String,
    pub destination: String,
    pub cargo_t: f64,
    pub truck: String,
    pub diesel_price_brl_l: f64,
    pub empty_backhaul_share: f64,
    pub profile: RouteProfile,
}

/// Profile and strategy behind one road leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteUsed {
    pub profile: RouteProfile,
    pub strategy: RouteStrategy,
}

impl From<&RouteResponse> for RouteUsed {
    fn from(value: &RouteResponse) -> Self {
        Self {
            profile: value.profile_used,
            strategy: value.strategy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilesUsed {
    pub road_only: RouteUsed,
    pub origin_to_port: RouteUsed,
    pub port_to_destination: RouteUsed,
}

/// Ports chosen for the sea leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortsSelected {
    pub origin_port: PortSelection,
    pub destination_port: PortSelection,
    pub profiles_used: ProfilesUsed,
}

/// The road-sea-road alternative, leg by leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CabotageBreakdown {
    pub origin_to_port: RoadLeg,
    pub sea: Leg,
    pub port_ops: PortOpsBreakdown,
    pub port_to_destination: RoadLeg,
    /// Exact sum of the three legs and port operations.
    pub totals: Metrics,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub input: EvaluationInput,
    pub origin: Point,
    pub destination: Point,
    pub selection: PortsSelected,
    pub road_only: RoadLeg,
    pub cabotage: CabotageBreakdown,
    /// `cabotage.totals - road_only` for every metric.
    pub deltas: Metrics,
}

/// Compares direct road transport with cabotage for single shipments.
#[derive(Clone)]
pub struct Evaluator {
    catalog: Arc<PortCatalog>,
    sea_matrix: Arc<SeaMatrix>,
    hotel: Arc<HotelFactors>,
    resolver: Arc<dyn AddressResolver>,
    router: Arc<dyn RoutingClient>,
    require_sea_coverage: bool,
}

impl Evaluator {
    pub fn new(
        catalog: Arc<PortCatalog>,
        sea_matrix: Arc<SeaMatrix>,
        hotel: Arc<HotelFactors>,
        resolver: Arc<dyn AddressResolver>,
        router: Arc<dyn RoutingClient>,
    ) -> Self {
        Self {
            catalog,
            sea_matrix,
            hotel,
            resolver,
            router,
            require_sea_coverage: false,
        }
    }

    /// Only consider ports listed in the sea matrix.
    pub fn require_sea_coverage(mut self, required: bool) -> Self {
        self.require_sea_coverage = required;
        self
    }

    pub fn catalog(&self) -> &PortCatalog {
        &self.catalog
    }

    /// Evaluate one shipment of `cargo_t` tonnes.
    pub fn evaluate(
        &self,
        origin: &Location,
        destination: &Location,
        cargo_t: f64,
        params: &EvaluationParams,
    ) -> Result<EvaluationResult> {
        if !cargo_t.is_finite() || cargo_t <= 0.0 {
            return Err(Error::InvalidCargoMass { cargo_t });
        }
        let truck = params.validate()?;
        truck.trips_for(cargo_t)?;

        info!(
            origin = %origin,
            destination = %destination,
            cargo_t,
            truck = %truck.name,
            "evaluating shipment"
        );

        let origin_point = self.resolver.resolve(origin)?;
        let destination_point = self.resolver.resolve(destination)?;

        let road_route = self
            .router
            .route(&origin_point, &destination_point, params.profile)?;
        let road_only = self.road(&road_route, cargo_t, truck, params)?;

        let selector = PortSelector::new(&self.catalog);
        let filter = |port: &Port| {
            !self.require_sea_coverage || self.sea_matrix.covers(port)
        };
        let origin_port =
            selector.nearest_port_where(&origin_point.coordinates, PortRole::Origin, filter)?;
        let destination_port = selector.nearest_port_where(
            &destination_point.coordinates,
            PortRole::Destination,
            filter,
        )?;

        let origin_gate = origin_port.port.road_point(&origin_point.coordinates);
        let destination_gate = destination_port
            .port
            .road_point(&destination_point.coordinates);

        let first_mile = self
            .router
            .route(&origin_point, &origin_gate, params.profile)?;
        let last_mile = self
            .router
            .route(&destination_gate, &destination_point, params.profile)?;

        let sea_distance = SeaDistanceProvider::new(&self.catalog, &self.sea_matrix)
            .distance(&origin_port.port, &destination_port.port);
        let sea = sea_leg(sea_distance, cargo_t, &params.sea)?;

        let ops = port_ops(
            cargo_t,
            &origin_port.port,
            &destination_port.port,
            &self.hotel,
            &params.sea,
            &params.port_ops,
        )?;

        let origin_to_port = self.road(&first_mile, cargo_t, truck, params)?;
        let port_to_destination = self.road(&last_mile, cargo_t, truck, params)?;

        let totals = Metrics::sum([
            origin_to_port.leg.metrics(),
            sea.metrics(),
            ops.totals,
            port_to_destination.leg.metrics(),
        ]);
        let deltas = totals - road_only.leg.metrics();

        debug!(
            road_only_co2e_kg = road_only.leg.co2e_kg,
            cabotage_co2e_kg = totals.co2e_kg,
            sea_source = %sea_distance.source,
            "aggregated evaluation"
        );
        info!(
            origin_port = %origin_port.port.name,
            destination_port = %destination_port.port.name,
            delta_co2e_kg = deltas.co2e_kg,
            delta_cost_brl = deltas.cost_brl,
            "evaluation complete"
        );

        Ok(EvaluationResult {
            input: EvaluationInput {
                origin: origin.cache_repr(),
                destination: destination.cache_repr(),
                cargo_t,
                truck: truck.name.clone(),
                diesel_price_brl_l: params.diesel_price_brl_l,
                empty_backhaul_share: params.empty_backhaul_share,
                profile: params.profile,
            },
            origin: origin_point,
            destination: destination_point,
            selection: PortsSelected {
                origin_port,
                destination_port,
                profiles_used: ProfilesUsed {
                    road_only: RouteUsed::from(&road_route),
                    origin_to_port: RouteUsed::from(&first_mile),
                    port_to_destination: RouteUsed::from(&last_mile),
                },
            },
            road_only,
            cabotage: CabotageBreakdown {
                origin_to_port,
                sea,
                port_ops: ops,
                port_to_destination,
                totals,
            },
            deltas,
        })
    }

    /// Evaluate one origin against many destinations in parallel.
    ///
    /// Results come back in input order, one per destination. Shared legs
    /// are collapsed by whatever cache sits behind the router.
    pub fn evaluate_many(
        &self,
        origin: &Location,
        destinations: &[Location],
        cargo_t: f64,
        params: &EvaluationParams,
    ) -> Vec<Result<EvaluationResult>> {
        info!(destinations = destinations.len(), "starting bulk evaluation");
        destinations
            .par_iter()
            .map(|destination| self.evaluate(origin, destination, cargo_t, params))
            .collect()
    }

    fn road(
        &self,
        route: &RouteResponse,
        cargo_t: f64,
        truck: &TruckPreset,
        params: &EvaluationParams,
    ) -> Result<RoadLeg> {
        let mut leg = road_leg(
            route.distance_km,
            route.duration_h,
            cargo_t,
            truck,
            params.empty_backhaul_share,
            params.diesel_price_brl_l,
        )?;
        leg.leg.profile = Some(route.profile_used.to_string());
        Ok(leg)
    }
}
