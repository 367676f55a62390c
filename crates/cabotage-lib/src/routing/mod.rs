//! Road routing and address resolution.
//!
//! The engine consumes three narrow capabilities:
//!
//! - [`RoutingBackend`] - raw directions and snap-to-road calls against a provider
//! - [`RoutingClient`] - a road route between two points, reporting the
//!   profile and strategy that produced it
//! - [`AddressResolver`] - turns a caller-supplied [`Location`] into a [`Point`]
//!
//! [`FallbackRouter`] turns any backend into a client using an explicit
//! state machine. [`OrsClient`] is the OpenRouteService backend.

pub mod fallback;
pub mod geocode;
pub mod ors;
pub mod viacep;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geo::{Cep, Coordinates, Location, Point};

pub use fallback::{FallbackPolicy, FallbackRouter, RouteState};
pub use geocode::{GeocodeHit, GeocodeSearch, PostalAddress, PostalDirectory};
pub use ors::{OrsClient, OrsConfig};
pub use viacep::ViaCepClient;

/// Vehicle profile understood by the routing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteProfile {
    #[serde(rename = "driving-hgv")]
    DrivingHgv,
    #[serde(rename = "driving-car")]
    DrivingCar,
}

impl RouteProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteProfile::DrivingHgv => "driving-hgv",
            RouteProfile::DrivingCar => "driving-car",
        }
    }
}

impl fmt::Display for RouteProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving-hgv" | "hgv" => Ok(RouteProfile::DrivingHgv),
            "driving-car" | "car" => Ok(RouteProfile::DrivingCar),
            other => Err(Error::InvalidParameter {
                name: "profile".to_string(),
                message: format!("unsupported routing profile '{other}'"),
            }),
        }
    }
}

/// How a successful route was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStrategy {
    /// The requested endpoints were routed as given.
    Direct,
    /// Endpoints were snapped to the road network before routing.
    Snapped,
}

/// Raw result of one directions call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Directions {
    pub distance_km: f64,
    pub duration_h: f64,
}

/// Road route between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub distance_km: f64,
    pub duration_h: f64,
    pub profile_used: RouteProfile,
    pub strategy: RouteStrategy,
}

/// Provider-level routing calls. Implementations perform no retries.
pub trait RoutingBackend: Send + Sync {
    /// Route between two coordinates. Fails with [`Error::NoRoute`] when the
    /// provider finds no road connection.
    fn directions(
        &self,
        from: &Coordinates,
        to: &Coordinates,
        profile: RouteProfile,
    ) -> Result<Directions>;

    /// Snap points onto the road network. Returns one entry per input, `None`
    /// where no road was found within the search radius.
    fn snap(
        &self,
        points: &[Coordinates],
        profile: RouteProfile,
    ) -> Result<Vec<Option<Coordinates>>>;
}

/// A road route between resolved points.
pub trait RoutingClient: Send + Sync {
    fn route(
        &self,
        origin: &Point,
        destination: &Point,
        profile: RouteProfile,
    ) -> Result<RouteResponse>;
}

/// Free-text and postal-code geocoding.
pub trait Geocoder: Send + Sync {
    /// Best acceptable match for `query`, or `None` when the provider returns
    /// nothing usable.
    fn geocode(&self, query: &str) -> Result<Option<Point>>;

    /// Resolve a CEP. The default searches its hyphenated form as text.
    fn geocode_postal_code(&self, cep: &Cep) -> Result<Option<Point>> {
        self.geocode(&cep.hyphenated())
    }
}

/// Resolves caller-supplied locations to points.
pub trait AddressResolver: Send + Sync {
    fn resolve(&self, location: &Location) -> Result<Point>;
}

/// Resolver that answers coordinates locally and sends postal codes and text
/// to a geocoder.
#[derive(Debug, Clone)]
pub struct GeocodingResolver<G> {
    geocoder: G,
}

impl<G: Geocoder> GeocodingResolver<G> {
    pub fn new(geocoder: G) -> Self {
        Self { geocoder }
    }
}

impl<G: Geocoder> AddressResolver for GeocodingResolver<G> {
    fn resolve(&self, location: &Location) -> Result<Point> {
        match location {
            Location::Coordinates(coords) => Ok(Point::new(coords.to_string(), *coords)),
            Location::PostalCode(cep) => {
                debug!(%cep, "geocoding postal code");
                self.geocoder
                    .geocode_postal_code(cep)?
                    .ok_or_else(|| Error::UnresolvedAddress {
                        query: location.to_string(),
                    })
            }
            Location::Text(text) => {
                debug!(query = %text, "geocoding address");
                self.geocoder
                    .geocode(text)?
                    .ok_or_else(|| Error::UnresolvedAddress {
                        query: text.clone(),
                    })
            }
        }
    }
}

/// Resolver for callers that only ever pass coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateResolver;

impl AddressResolver for CoordinateResolver {
    fn resolve(&self, location: &Location) -> Result<Point> {
        match location {
            Location::Coordinates(coords) => Ok(Point::new(coords.to_string(), *coords)),
            Location::PostalCode(_) | Location::Text(_) => Err(Error::UnresolvedAddress {
                query: location.to_string(),
            }),
        }
    }
}

impl<T: RoutingBackend + ?Sized> RoutingBackend for std::sync::Arc<T> {
    fn directions(
        &self,
        from: &Coordinates,
        to: &Coordinates,
        profile: RouteProfile,
    ) -> Result<Directions> {
        (**self).directions(from, to, profile)
    }

    fn snap(
        &self,
        points: &[Coordinates],
        profile: RouteProfile,
    ) -> Result<Vec<Option<Coordinates>>> {
        (**self).snap(points, profile)
    }
}

impl<T: Geocoder + ?Sized> Geocoder for std::sync::Arc<T> {
    fn geocode(&self, query: &str) -> Result<Option<Point>> {
        (**self).geocode(query)
    }

    fn geocode_postal_code(&self, cep: &Cep) -> Result<Option<Point>> {
        (**self).geocode_postal_code(cep)
    }
}

impl<T: RoutingClient + ?Sized> RoutingClient for std::sync::Arc<T> {
    fn route(
        &self,
        origin: &Point,
        destination: &Point,
        profile: RouteProfile,
    ) -> Result<RouteResponse> {
        (**self).route(origin, destination, profile)
    }
}

impl<T: AddressResolver + ?Sized> AddressResolver for std::sync::Arc<T> {
    fn resolve(&self, location: &Location) -> Result<Point> {
        (**self).resolve(location)
    }
}
