//! Subcommand handlers.
//!
//! `main.rs` parses arguments and dispatches here. Shared loading of the
//! static data files and of the evaluator lives in this module.

pub mod batch;
pub mod evaluate;
pub mod ports;
pub mod sea_distance;
pub mod trucks;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use cabotage_lib::fuel::DEFAULT_TRUCK_PRESET;
use cabotage_lib::{
    CacheSettings, CachedResolver, CachedRouter, DataPaths, DieselPriceTable, Error as LibError,
    ErrorCategory, EvaluationParams, Evaluator, FallbackRouter, GeocodingResolver, HotelFactors,
    OrsClient, PortCatalog, RouteCache, RouteProfile, SeaMatrix, SqliteRouteCache,
};

/// Process exit codes, one per failure category.
pub mod exit_codes {
    pub const ERROR: i32 = 1;
    pub const INPUT: i32 = 2;
    pub const EXTERNAL: i32 = 3;
    pub const CONFIGURATION: i32 = 4;
    pub const STORAGE: i32 = 5;
    pub const DATA_COVERAGE: i32 = 6;
}

/// Exit code for a failed command, from the first library error in the chain.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    let Some(lib_err) = err.chain().find_map(|cause| cause.downcast_ref::<LibError>()) else {
        return exit_codes::ERROR;
    };
    match lib_err.category() {
        ErrorCategory::InputValidation => exit_codes::INPUT,
        ErrorCategory::ExternalResolution => exit_codes::EXTERNAL,
        ErrorCategory::ConfigurationIntegrity => exit_codes::CONFIGURATION,
        ErrorCategory::Storage => exit_codes::STORAGE,
        ErrorCategory::DataCoverage => exit_codes::DATA_COVERAGE,
    }
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub data_dir: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
}

/// Static data loaded once per invocation.
pub struct StaticData {
    pub catalog: Arc<PortCatalog>,
    pub sea_matrix: Arc<SeaMatrix>,
    pub hotel: Arc<HotelFactors>,
    pub diesel_prices: Option<DieselPriceTable>,
}

impl StaticData {
    pub fn load(global: &GlobalOptions, default_hotel_factor: Option<f64>) -> Result<Self> {
        let paths = DataPaths::resolve(global.data_dir.as_deref())
            .context("failed to resolve the data directory")?;

        let catalog = PortCatalog::from_path(&paths.ports)
            .with_context(|| format!("failed to load ports from {}", paths.ports.display()))?;
        let sea_matrix = SeaMatrix::from_path(&paths.sea_matrix, &catalog).with_context(|| {
            format!(
                "failed to load sea matrix from {}",
                paths.sea_matrix.display()
            )
        })?;
        let mut hotel = HotelFactors::from_path(&paths.hotel, &catalog).with_context(|| {
            format!(
                "failed to load hotel factors from {}",
                paths.hotel.display()
            )
        })?;
        if let Some(default) = default_hotel_factor {
            hotel = hotel.with_default(default)?;
        }
        let diesel_prices = paths
            .diesel_prices
            .as_deref()
            .map(|path| {
                DieselPriceTable::from_path(path).with_context(|| {
                    format!("failed to load diesel prices from {}", path.display())
                })
            })
            .transpose()?;

        info!(
            data_dir = %paths.dir.display(),
            ports = catalog.len(),
            sea_pairs = sea_matrix.len(),
            diesel_prices = diesel_prices.is_some(),
            "static data loaded"
        );

        Ok(Self {
            catalog: Arc::new(catalog),
            sea_matrix: Arc::new(sea_matrix),
            hotel: Arc::new(hotel),
            diesel_prices,
        })
    }

    /// Evaluator backed by OpenRouteService behind the persistent cache.
    pub fn evaluator(
        &self,
        global: &GlobalOptions,
        params: &EvaluationParams,
        require_sea_coverage: bool,
    ) -> Result<Evaluator> {
        let settings = CacheSettings::resolve(global.cache_path.as_deref())
            .context("failed to resolve the route cache location")?;
        let cache: Arc<dyn RouteCache> = Arc::new(
            SqliteRouteCache::open(&settings.path, settings.ttl).with_context(|| {
                format!("failed to open route cache at {}", settings.path.display())
            })?,
        );
        info!(cache = %settings.path.display(), "route cache ready");

        let ors = Arc::new(OrsClient::from_env().context("routing backend is not configured")?);
        let router = CachedRouter::new(
            FallbackRouter::new(Arc::clone(&ors), params.fallback_policy()),
            Arc::clone(&cache),
        );
        let resolver = CachedResolver::new(GeocodingResolver::new(ors), cache);

        Ok(Evaluator::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.sea_matrix),
            Arc::clone(&self.hotel),
            Arc::new(resolver),
            Arc::new(router),
        )
        .require_sea_coverage(require_sea_coverage))
    }
}

/// Knobs shared by `evaluate` and `batch`.
#[derive(Args, Debug, Clone)]
pub struct ParamArgs {
    /// Cargo mass in tonnes.
    #[arg(long = "cargo-t")]
    pub cargo_t: f64,

    /// Truck preset (see `cabotage trucks`).
    #[arg(long, default_value = DEFAULT_TRUCK_PRESET)]
    pub truck: String,

    /// Diesel price in BRL per liter.
    #[arg(long, conflicts_with_all = ["uf_origin", "uf_destination"])]
    pub diesel_price: Option<f64>,

    /// Origin state; with --uf-destination, averages prices from diesel_prices.csv.
    #[arg(long, requires = "uf_destination")]
    pub uf_origin: Option<String>,

    /// Destination state for the diesel price average.
    #[arg(long, requires = "uf_origin")]
    pub uf_destination: Option<String>,

    /// Share of each trip driven back empty, between 0 and 1.
    #[arg(long, default_value_t = 0.0)]
    pub empty_backhaul: f64,

    /// Routing profile for road legs.
    #[arg(long, default_value = "driving-hgv")]
    pub profile: RouteProfile,

    /// Do not retry with the car profile when no truck route exists.
    #[arg(long)]
    pub no_car_fallback: bool,

    /// Do not snap endpoints to the road network when no route exists.
    #[arg(long)]
    pub no_snap: bool,

    /// Only consider ports listed in the sea matrix.
    #[arg(long)]
    pub require_sea_coverage: bool,

    /// Sea fuel intensity in kg fuel per tonne-km.
    #[arg(long)]
    pub k_sea: Option<f64>,

    /// Marine gas oil price in BRL per tonne.
    #[arg(long)]
    pub mgo_price: Option<f64>,

    /// Vessel speed in km/h.
    #[arg(long)]
    pub sea_speed: Option<f64>,

    /// Handling hours per port call.
    #[arg(long)]
    pub handling_hours: Option<f64>,

    /// Handling cost in BRL per port call.
    #[arg(long)]
    pub handling_cost: Option<f64>,

    /// Hotel factor (kg fuel per tonne) for ports missing from hotel.json.
    #[arg(long)]
    pub default_hotel_factor: Option<f64>,
}

impl ParamArgs {
    /// Build evaluation parameters, resolving the diesel price.
    pub fn to_params(&self, diesel_prices: Option<&DieselPriceTable>) -> Result<EvaluationParams> {
        let defaults = EvaluationParams::default();
        let diesel_price_brl_l = match (&self.diesel_price, &self.uf_origin, &self.uf_destination)
        {
            (Some(price), _, _) => *price,
            (None, Some(uf_origin), Some(uf_destination)) => {
                let table = diesel_prices.context(
                    "--uf-origin/--uf-destination need diesel_prices.csv in the data directory",
                )?;
                let quote = table.average_for(uf_origin, uf_destination)?;
                info!(
                    uf_origin = %quote.uf_origin,
                    uf_destination = %quote.uf_destination,
                    price = quote.average_brl_l,
                    fallback_used = quote.fallback_used,
                    "diesel price from state table"
                );
                quote.average_brl_l
            }
            _ => defaults.diesel_price_brl_l,
        };

        let mut sea = defaults.sea;
        if let Some(k) = self.k_sea {
            sea.k_sea_kg_per_tkm = k;
        }
        if let Some(price) = self.mgo_price {
            sea.mgo_price_brl_per_t = price;
        }
        if let Some(speed) = self.sea_speed {
            sea.sea_speed_kmh = speed;
        }
        let mut port_ops = defaults.port_ops;
        if let Some(hours) = self.handling_hours {
            port_ops.handling_hours = hours;
        }
        if let Some(cost) = self.handling_cost {
            port_ops.handling_cost_brl = cost;
        }

        let params = EvaluationParams {
            truck: self.truck.clone(),
            diesel_price_brl_l,
            empty_backhaul_share: self.empty_backhaul,
            sea,
            port_ops,
            profile: self.profile,
            fallback_to_car: !self.no_car_fallback,
            snap_to_road: !self.no_snap,
        };
        params.validate()?;
        Ok(params)
    }
}
