//! OpenRouteService backend.
//!
//! Blocking client for the directions, snap and geocode endpoints. Status
//! codes map onto typed errors; retries and backoff are left to callers.
//! Geocoding hits go through [`filter_hits`](super::geocode::filter_hits)
//! before they count as a resolved address.

use std::env;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geo::{Cep, Coordinates, Point};

use super::geocode::{
    geocode_text, resolve_postal_code, GeocodeHit, GeocodeSearch, PostalDirectory,
};
use super::viacep::{ViaCepClient, DEFAULT_VIACEP_URL};
use super::{Directions, Geocoder, RouteProfile, RoutingBackend};

pub const API_KEY_ENV: &str = "ORS_API_KEY";
pub const BASE_URL_ENV: &str = "ORS_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";
/// Set to `0` or `false` to skip the ViaCEP fallback for postal codes.
pub const ALLOW_VIACEP_ENV: &str = "CABOTAGE_ALLOW_VIACEP";

/// Candidates requested per geocoding query, before filtering.
const GEOCODE_SIZE: &str = "5";

/// Connection settings for [`OrsClient`].
#[derive(Debug, Clone)]
pub struct OrsConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub snap_radius_m: u32,
    /// ISO2 country used to bound geocoding queries.
    pub country: String,
    /// Fall back to ViaCEP when postal-code searches find nothing.
    pub allow_viacep: bool,
    pub viacep_url: String,
}

impl OrsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            snap_radius_m: 2500,
            country: "BR".to_string(),
            allow_viacep: true,
            viacep_url: DEFAULT_VIACEP_URL.to_string(),
        }
    }

    /// Read `ORS_API_KEY`, the optional `ORS_BASE_URL` override and
    /// `CABOTAGE_ALLOW_VIACEP`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var(API_KEY_ENV)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(Error::MissingApiKey)?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                config.base_url = base_url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(flag) = env::var(ALLOW_VIACEP_ENV) {
            config.allow_viacep = !matches!(flag.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no");
        }
        Ok(config)
    }
}

/// Blocking OpenRouteService client.
#[derive(Debug, Clone)]
pub struct OrsClient {
    client: Client,
    config: OrsConfig,
    viacep: Option<ViaCepClient>,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    summary: RouteSummary,
}

#[derive(Debug, Default, Deserialize)]
struct RouteSummary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct SnapResponse {
    #[serde(default)]
    locations: Vec<Option<SnapLocation>>,
}

#[derive(Debug, Deserialize)]
struct SnapLocation {
    location: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    #[serde(default)]
    geometry: Option<GeocodeGeometry>,
    #[serde(default)]
    properties: GeocodeProperties,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct GeocodeProperties {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    layer: Option<String>,
}

impl GeocodeResponse {
    /// Features with a `[lon, lat]` point, in provider order.
    fn into_hits(self) -> Vec<GeocodeHit> {
        self.features
            .into_iter()
            .filter_map(|feature| {
                let coords = feature.geometry?.coordinates;
                let [lon, lat] = coords.as_slice() else {
                    return None;
                };
                Some(GeocodeHit::new(
                    *lat,
                    *lon,
                    feature.properties.label,
                    feature.properties.layer.unwrap_or_default(),
                ))
            })
            .collect()
    }
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(user_agent())
            .build()
            .map_err(Error::Http)?;
        let viacep = if config.allow_viacep {
            Some(ViaCepClient::new(&config.viacep_url, config.timeout)?)
        } else {
            None
        };
        Ok(Self {
            client,
            config,
            viacep,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OrsConfig::from_env()?)
    }

    pub fn config(&self) -> &OrsConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn post(&self, path: &str, body: &serde_json::Value) -> Result<Response> {
        debug!(path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .header(AUTHORIZATION, &self.config.api_key)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()?;
        Ok(response)
    }

    fn geocode_get(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<GeocodeHit>> {
        debug!(path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .header(AUTHORIZATION, &self.config.api_key)
            .query(query)
            .send()?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited {
                retry_after_secs: response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok()),
            });
        }
        if !status.is_success() {
            return Err(Error::RoutingProvider {
                status: Some(status.as_u16()),
                message: format!("geocode request to {path} failed"),
            });
        }

        let parsed: GeocodeResponse = response.json()?;
        Ok(parsed.into_hits())
    }
}

/// Map a non-success response onto the error taxonomy.
fn check_status(response: Response, context: (&str, &str, RouteProfile)) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let (from, to, profile) = context;
    match status {
        StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => Err(Error::NoRoute {
            from: from.to_string(),
            to: to.to_string(),
            profile: profile.to_string(),
        }),
        StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimited {
            retry_after_secs: response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok()),
        }),
        _ => {
            let mut message = response.text().unwrap_or_default();
            message.truncate(200);
            Err(Error::RoutingProvider {
                status: Some(status.as_u16()),
                message,
            })
        }
    }
}

impl RoutingBackend for OrsClient {
    fn directions(
        &self,
        from: &Coordinates,
        to: &Coordinates,
        profile: RouteProfile,
    ) -> Result<Directions> {
        let body = json!({
            "coordinates": [[from.lon, from.lat], [to.lon, to.lat]],
            "units": "m",
            "preference": "fastest",
        });
        let path = format!("/v2/directions/{profile}");
        let response = self.post(&path, &body)?;
        let from_label = from.to_string();
        let to_label = to.to_string();
        let response = check_status(response, (&from_label, &to_label, profile))?;

        let parsed: DirectionsResponse = response.json()?;
        let route = parsed.routes.first().ok_or_else(|| Error::RoutingProvider {
            status: None,
            message: "directions response contained no routes".to_string(),
        })?;

        let directions = Directions {
            distance_km: route.summary.distance / 1000.0,
            duration_h: route.summary.duration / 3600.0,
        };
        info!(%profile, distance_km = directions.distance_km, "ORS directions ok");
        Ok(directions)
    }

    fn snap(
        &self,
        points: &[Coordinates],
        profile: RouteProfile,
    ) -> Result<Vec<Option<Coordinates>>> {
        let locations: Vec<[f64; 2]> = points.iter().map(|p| [p.lon, p.lat]).collect();
        let body = json!({
            "locations": locations,
            "radius": self.config.snap_radius_m,
        });
        let path = format!("/v2/snap/{profile}");
        let response = self.post(&path, &body)?;
        let response = check_status(response, ("snap", "snap", profile))?;
        let parsed: SnapResponse = response.json()?;

        let mut snapped = Vec::with_capacity(points.len());
        for idx in 0..points.len() {
            let point = parsed
                .locations
                .get(idx)
                .and_then(|loc| loc.as_ref())
                .and_then(|loc| Coordinates::new(loc.location[1], loc.location[0]).ok());
            snapped.push(point);
        }
        debug!(
            %profile,
            snapped = snapped.iter().filter(|p| p.is_some()).count(),
            "ORS snap ok"
        );
        Ok(snapped)
    }
}

impl GeocodeSearch for OrsClient {
    fn search_text(&self, text: &str) -> Result<Vec<GeocodeHit>> {
        self.geocode_get(
            "/geocode/search",
            &[
                ("text", text),
                ("size", GEOCODE_SIZE),
                ("boundary.country", self.config.country.as_str()),
            ],
        )
    }

    fn search_postal_code(&self, postal_code: &str) -> Result<Vec<GeocodeHit>> {
        self.geocode_get(
            "/geocode/search/structured",
            &[
                ("postalcode", postal_code),
                ("country", self.config.country.as_str()),
                ("size", GEOCODE_SIZE),
            ],
        )
    }
}

impl Geocoder for OrsClient {
    fn geocode(&self, query: &str) -> Result<Option<Point>> {
        let point = geocode_text(self, query)?;
        match &point {
            Some(point) => info!(query, label = %point.label, coordinates = %point.coordinates, "geocoded address"),
            None => debug!(query, "geocoder returned no acceptable hit"),
        }
        Ok(point)
    }

    fn geocode_postal_code(&self, cep: &Cep) -> Result<Option<Point>> {
        let directory = self.viacep.as_ref().map(|v| v as &dyn PostalDirectory);
        let point = resolve_postal_code(self, directory, cep)?;
        if let Some(point) = &point {
            info!(%cep, label = %point.label, coordinates = %point.coordinates, "geocoded postal code");
        }
        Ok(point)
    }
}

fn user_agent() -> String {
    format!("cabotage-lib/{}", env!("CARGO_PKG_VERSION"))
}
