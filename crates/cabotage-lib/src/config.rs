//! Evaluation parameters and on-disk locations.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::DEFAULT_TTL;
use crate::error::{Error, Result};
use crate::fuel::{validate_road_inputs, PortOpsParams, SeaLegParams, TruckPreset, DEFAULT_TRUCK_PRESET};
use crate::routing::{FallbackPolicy, RouteProfile};

pub const DATA_DIR_ENV: &str = "CABOTAGE_DATA_DIR";
pub const CACHE_PATH_ENV: &str = "CABOTAGE_CACHE_PATH";

pub const PORTS_FILENAME: &str = "ports.json";
pub const SEA_MATRIX_FILENAME: &str = "sea_matrix.json";
pub const HOTEL_FILENAME: &str = "hotel.json";
pub const DIESEL_PRICES_FILENAME: &str = "diesel_prices.csv";
pub const CACHE_FILENAME: &str = "route_cache.sqlite";

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("br", "cabotage", "cabotage").ok_or(Error::ProjectDirsUnavailable)
}

/// Per-evaluation knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationParams {
    /// Truck preset name.
    pub truck: String,
    pub diesel_price_brl_l: f64,
    /// Share of each trip's distance driven back empty, in `[0, 1]`.
    pub empty_backhaul_share: f64,
    pub sea: SeaLegParams,
    pub port_ops: PortOpsParams,
    pub profile: RouteProfile,
    pub fallback_to_car: bool,
    pub snap_to_road: bool,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            truck: DEFAULT_TRUCK_PRESET.to_string(),
            diesel_price_brl_l: 6.0,
            empty_backhaul_share: 0.0,
            sea: SeaLegParams::default(),
            port_ops: PortOpsParams::default(),
            profile: RouteProfile::DrivingHgv,
            fallback_to_car: true,
            snap_to_road: true,
        }
    }
}

impl EvaluationParams {
    /// Validate every parameter, resolving the truck preset.
    pub fn validate(&self) -> Result<&'static TruckPreset> {
        let truck = TruckPreset::by_name(&self.truck)?;
        // Cargo is checked separately; 1 t stands in here.
        validate_road_inputs(1.0, truck, self.empty_backhaul_share, self.diesel_price_brl_l)?;
        self.sea.validate()?;
        self.port_ops.validate()?;
        Ok(truck)
    }

    /// Router recovery steps implied by these parameters.
    pub fn fallback_policy(&self) -> FallbackPolicy {
        FallbackPolicy {
            snap: self.snap_to_road,
            fallback_profile: self.fallback_to_car.then_some(RouteProfile::DrivingCar),
        }
    }
}

/// Locations of the static data files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub dir: PathBuf,
    pub ports: PathBuf,
    pub sea_matrix: PathBuf,
    pub hotel: PathBuf,
    /// Present only when the file exists.
    pub diesel_prices: Option<PathBuf>,
}

impl DataPaths {
    /// Standard file names under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        let diesel = dir.join(DIESEL_PRICES_FILENAME);
        Self {
            dir: dir.to_path_buf(),
            ports: dir.join(PORTS_FILENAME),
            sea_matrix: dir.join(SEA_MATRIX_FILENAME),
            hotel: dir.join(HOTEL_FILENAME),
            diesel_prices: diesel.exists().then_some(diesel),
        }
    }

    /// Explicit directory, then `CABOTAGE_DATA_DIR`, then the platform data dir.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let dir = match explicit {
            Some(dir) => dir.to_path_buf(),
            None => match env::var_os(DATA_DIR_ENV) {
                Some(dir) => PathBuf::from(dir),
                None => project_dirs()?.data_dir().to_path_buf(),
            },
        };
        debug!(dir = %dir.display(), "resolved data directory");
        Ok(Self::in_dir(&dir))
    }
}

/// Where the route cache lives and how long entries stay fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub path: PathBuf,
    /// `None` disables expiry.
    pub ttl: Option<Duration>,
}

impl CacheSettings {
    /// Explicit path, then `CABOTAGE_CACHE_PATH`, then the platform cache dir.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match env::var_os(CACHE_PATH_ENV) {
                Some(path) => PathBuf::from(path),
                None => project_dirs()?.cache_dir().join(CACHE_FILENAME),
            },
        };
        Ok(Self {
            path,
            ttl: Some(DEFAULT_TTL),
        })
    }
}
