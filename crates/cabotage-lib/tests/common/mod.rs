#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use cabotage_lib::cache::{CachedResolver, CachedRouter, RouteCache};
use cabotage_lib::geo::haversine_km;
use cabotage_lib::routing::{
    AddressResolver, Directions, FallbackPolicy, FallbackRouter, RouteProfile, RoutingBackend,
};
use cabotage_lib::{Coordinates, Error, Evaluator, HotelFactors, Location, PortCatalog, Point, Result, SeaMatrix};

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

pub fn fixture_catalog() -> PortCatalog {
    PortCatalog::from_path(&fixtures_dir().join("ports.json")).expect("load fixture ports.json")
}

pub fn fixture_matrix(catalog: &PortCatalog) -> SeaMatrix {
    SeaMatrix::from_path(&fixtures_dir().join("sea_matrix.json"), catalog)
        .expect("load fixture sea_matrix.json")
}

pub fn fixture_hotel(catalog: &PortCatalog) -> HotelFactors {
    HotelFactors::from_path(&fixtures_dir().join("hotel.json"), catalog)
        .expect("load fixture hotel.json")
}

pub fn coords(lat: f64, lon: f64) -> Coordinates {
    Coordinates::new(lat, lon).expect("valid coordinates")
}

pub fn sao_paulo() -> Coordinates {
    coords(-23.5505, -46.6333)
}

pub fn recife() -> Coordinates {
    coords(-8.0476, -34.8770)
}

pub fn fortaleza() -> Coordinates {
    coords(-3.7319, -38.5267)
}

pub fn joinville() -> Coordinates {
    coords(-26.3045, -48.8487)
}

/// How the fake routing backend responds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Every request succeeds.
    Ok,
    /// `NoRoute` until a snap call has happened.
    NoRouteUntilSnapped,
    /// `NoRoute` for the HGV profile; snap leaves points unchanged.
    NoRouteOnHgv,
    /// `NoRoute` for every profile.
    NoRouteAlways,
    /// Every request is rate limited.
    RateLimited,
}

/// Deterministic routing backend: road distance is 1.25 × great-circle at 60 km/h.
#[derive(Debug)]
pub struct FakeBackend {
    behavior: Behavior,
    snapped: AtomicBool,
    pub directions_calls: AtomicUsize,
    pub snap_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            snapped: AtomicBool::new(false),
            directions_calls: AtomicUsize::new(0),
            snap_calls: AtomicUsize::new(0),
        })
    }

    pub fn directions_calls(&self) -> usize {
        self.directions_calls.load(Ordering::SeqCst)
    }

    pub fn snap_calls(&self) -> usize {
        self.snap_calls.load(Ordering::SeqCst)
    }

    pub fn road_km(from: &Coordinates, to: &Coordinates) -> f64 {
        haversine_km(from, to) * 1.25
    }
}

impl RoutingBackend for FakeBackend {
    fn directions(
        &self,
        from: &Coordinates,
        to: &Coordinates,
        profile: RouteProfile,
    ) -> Result<Directions> {
        self.directions_calls.fetch_add(1, Ordering::SeqCst);
        let no_route = || Error::NoRoute {
            from: from.to_string(),
            to: to.to_string(),
            profile: profile.to_string(),
        };
        match self.behavior {
            Behavior::Ok => {}
            Behavior::NoRouteUntilSnapped if !self.snapped.load(Ordering::SeqCst) => {
                return Err(no_route())
            }
            Behavior::NoRouteUntilSnapped => {}
            Behavior::NoRouteOnHgv if profile == RouteProfile::DrivingHgv => {
                return Err(no_route())
            }
            Behavior::NoRouteOnHgv => {}
            Behavior::NoRouteAlways => return Err(no_route()),
            Behavior::RateLimited => {
                return Err(Error::RateLimited {
                    retry_after_secs: Some(60),
                })
            }
        }
        let distance_km = Self::road_km(from, to);
        Ok(Directions {
            distance_km,
            duration_h: distance_km / 60.0,
        })
    }

    fn snap(
        &self,
        points: &[Coordinates],
        _profile: RouteProfile,
    ) -> Result<Vec<Option<Coordinates>>> {
        self.snap_calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::NoRouteUntilSnapped => {
                self.snapped.store(true, Ordering::SeqCst);
                Ok(points
                    .iter()
                    .map(|p| Coordinates::new(p.lat + 0.001, p.lon).ok())
                    .collect())
            }
            _ => Ok(points.iter().map(|_| None).collect()),
        }
    }
}

/// Resolver with a fixed gazetteer that counts geocoding calls.
#[derive(Debug, Default)]
pub struct FakeResolver {
    places: HashMap<String, Coordinates>,
    pub geocode_calls: AtomicUsize,
}

impl FakeResolver {
    pub fn new() -> Arc<Self> {
        let mut places = HashMap::new();
        places.insert("são paulo, sp".to_string(), sao_paulo());
        places.insert("recife, pe".to_string(), recife());
        places.insert("fortaleza, ce".to_string(), fortaleza());
        places.insert("joinville, sc".to_string(), joinville());
        places.insert("cep:01310200".to_string(), sao_paulo());
        Arc::new(Self {
            places,
            geocode_calls: AtomicUsize::new(0),
        })
    }

    pub fn geocode_calls(&self) -> usize {
        self.geocode_calls.load(Ordering::SeqCst)
    }
}

impl AddressResolver for FakeResolver {
    fn resolve(&self, location: &Location) -> Result<Point> {
        match location {
            Location::Coordinates(c) => Ok(Point::new(c.to_string(), *c)),
            Location::PostalCode(_) | Location::Text(_) => {
                self.geocode_calls.fetch_add(1, Ordering::SeqCst);
                let query = location.cache_repr();
                self.places
                    .get(&query.to_lowercase())
                    .map(|c| Point::new(query.clone(), *c))
                    .ok_or_else(|| Error::UnresolvedAddress { query })
            }
        }
    }
}

/// Evaluator over fixture data with the fake backend behind a cache.
pub fn evaluator(
    backend: Arc<FakeBackend>,
    resolver: Arc<FakeResolver>,
    cache: Arc<dyn RouteCache>,
) -> Evaluator {
    let catalog = fixture_catalog();
    let matrix = fixture_matrix(&catalog);
    let hotel = fixture_hotel(&catalog);
    let router = CachedRouter::new(
        FallbackRouter::new(backend, FallbackPolicy::default()),
        Arc::clone(&cache),
    );
    let resolver = CachedResolver::new(resolver, cache);
    Evaluator::new(
        Arc::new(catalog),
        Arc::new(matrix),
        Arc::new(hotel),
        Arc::new(resolver),
        Arc::new(router),
    )
}
