//! Geocoder hit filtering and postal-code resolution.
//!
//! Providers return candidate hits with a layer (`address`, `locality`,
//! `country`, ...). Country-level hits and hits sitting on Brazil's
//! geographic centroid are what a vague query falls back to, so they never
//! count as a resolved address. [`resolve_postal_code`] runs the CEP search
//! ladder over any [`GeocodeSearch`] implementation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::geo::{Cep, Coordinates, Point};

/// Layers accepted for free-text queries.
pub const DEFAULT_LAYERS: &[&str] = &[
    "address",
    "street",
    "venue",
    "postalcode",
    "postcode",
    "neighbourhood",
    "locality",
    "localadmin",
    "borough",
    "municipality",
];

/// Layers accepted for structured postal-code searches.
pub const STRUCTURED_POSTAL_LAYERS: &[&str] =
    &["postalcode", "postcode", "address", "street", "locality"];

/// Layers accepted when a CEP is searched as plain text.
pub const TEXT_POSTAL_LAYERS: &[&str] = &["postalcode", "postcode"];

const BRAZIL_CENTROID: (f64, f64) = (-10.0, -55.0);
const CENTROID_TOLERANCE_DEG: f64 = 0.5;

/// One raw geocoder candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeHit {
    pub lat: f64,
    pub lon: f64,
    pub label: Option<String>,
    /// Lower-cased provider layer; empty when the provider omits it.
    pub layer: String,
}

impl GeocodeHit {
    pub fn new(lat: f64, lon: f64, label: Option<String>, layer: impl Into<String>) -> Self {
        Self {
            lat,
            lon,
            label,
            layer: layer.into().to_lowercase(),
        }
    }

    fn into_point(self, fallback_label: &str) -> Option<Point> {
        let coordinates = Coordinates::new(self.lat, self.lon).ok()?;
        let label = self
            .label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| fallback_label.to_string());
        Some(Point::new(label, coordinates))
    }
}

/// Street-level address behind a CEP, from a postal directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub street: String,
    pub neighbourhood: String,
    pub city: String,
    pub uf: String,
}

impl PostalAddress {
    /// Comma-joined non-empty parts, suitable for a text search.
    pub fn query(&self) -> String {
        [&self.street, &self.neighbourhood, &self.city, &self.uf]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Raw search calls against a geocoding provider. Hits are returned
/// unfiltered, in provider order.
pub trait GeocodeSearch: Send + Sync {
    fn search_text(&self, text: &str) -> Result<Vec<GeocodeHit>>;

    /// Structured search on the postal-code field only.
    fn search_postal_code(&self, postal_code: &str) -> Result<Vec<GeocodeHit>>;
}

/// Maps a CEP to its street address.
pub trait PostalDirectory: Send + Sync {
    /// `Ok(None)` when the directory does not know the CEP.
    fn lookup(&self, cep: &Cep) -> Result<Option<PostalAddress>>;
}

/// Whether coordinates sit on Brazil's geographic centroid, where
/// country-level fallbacks land.
pub fn is_brazil_centroid(coordinates: &Coordinates) -> bool {
    (coordinates.lat - BRAZIL_CENTROID.0).abs() < CENTROID_TOLERANCE_DEG
        && (coordinates.lon - BRAZIL_CENTROID.1).abs() < CENTROID_TOLERANCE_DEG
}

/// Keep hits with valid coordinates, off the country layer and the Brazil
/// centroid, and in `allowed_layers`. A hit without a layer is kept.
pub fn filter_hits(hits: Vec<GeocodeHit>, allowed_layers: &[&str]) -> Vec<GeocodeHit> {
    hits.into_iter()
        .filter(|hit| {
            let Ok(coordinates) = Coordinates::new(hit.lat, hit.lon) else {
                debug!(lat = hit.lat, lon = hit.lon, "dropping hit with invalid coordinates");
                return false;
            };
            if hit.layer == "country" || is_brazil_centroid(&coordinates) {
                debug!(layer = %hit.layer, %coordinates, "dropping country-level hit");
                return false;
            }
            if !hit.layer.is_empty() && !allowed_layers.contains(&hit.layer.as_str()) {
                debug!(layer = %hit.layer, "dropping hit outside allowed layers");
                return false;
            }
            true
        })
        .collect()
}

/// First acceptable hit for a free-text query.
pub fn geocode_text(search: &dyn GeocodeSearch, query: &str) -> Result<Option<Point>> {
    let hits = filter_hits(search.search_text(query)?, DEFAULT_LAYERS);
    Ok(hits.into_iter().find_map(|hit| hit.into_point(query)))
}

/// Resolve a CEP through a ladder of searches.
///
/// The ladder is: a structured search on the digits, then on the hyphenated
/// form, then a text search restricted to postal layers. If all of those
/// fail, the CEP is looked up in `directory` and its street address is
/// geocoded. Directory failures are logged and treated as "not found".
///
/// # Errors
///
/// Propagates provider errors from `search` (rate limiting, HTTP failures).
pub fn resolve_postal_code(
    search: &dyn GeocodeSearch,
    directory: Option<&dyn PostalDirectory>,
    cep: &Cep,
) -> Result<Option<Point>> {
    let hyphenated = cep.hyphenated();

    for postal_code in [cep.digits(), hyphenated.as_str()] {
        let hits = filter_hits(search.search_postal_code(postal_code)?, STRUCTURED_POSTAL_LAYERS);
        if let Some(point) = hits.into_iter().find_map(|hit| hit.into_point(&hyphenated)) {
            debug!(%cep, step = "structured", "resolved postal code");
            return Ok(Some(point));
        }
    }

    let hits = filter_hits(search.search_text(&hyphenated)?, TEXT_POSTAL_LAYERS);
    if let Some(point) = hits.into_iter().find_map(|hit| hit.into_point(&hyphenated)) {
        debug!(%cep, step = "text", "resolved postal code");
        return Ok(Some(point));
    }

    let Some(directory) = directory else {
        return Ok(None);
    };
    let address = match directory.lookup(cep) {
        Ok(Some(address)) => address,
        Ok(None) => return Ok(None),
        Err(err) => {
            warn!(%cep, error = %err, "postal directory lookup failed");
            return Ok(None);
        }
    };
    let query = address.query();
    if query.is_empty() {
        return Ok(None);
    }
    debug!(%cep, %query, step = "directory", "geocoding postal directory address");
    geocode_text(search, &query)
}
