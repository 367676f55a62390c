//! Geographic primitives: coordinates, resolved points and caller-supplied
//! locations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean Earth radius in kilometres (WGS84 sphere approximation).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Build validated coordinates.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(Error::InvalidCoordinates {
                message: format!("latitude must be within [-90, 90], got {lat}"),
            });
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(Error::InvalidCoordinates {
                message: format!("longitude must be within [-180, 180], got {lon}"),
            });
        }
        Ok(Self { lat, lon })
    }

    /// Great-circle distance to another coordinate pair, in kilometres.
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(self, other)
    }

    /// Stable textual form used in cache keys (6 decimal places, ~0.1 m).
    pub fn cache_repr(&self) -> String {
        format!("{:.6},{:.6}", self.lat, self.lon)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lon)
    }
}

/// Great-circle distance between two coordinates, in kilometres.
pub fn haversine_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // Clamp guards against rounding pushing `h` above 1 for antipodal points.
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// A resolved location: coordinates plus a human-readable label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub label: String,
    pub coordinates: Coordinates,
}

impl Point {
    pub fn new(label: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            label: label.into(),
            coordinates,
        }
    }
}

/// Brazilian postal code (CEP), stored as its eight digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cep(String);

impl Cep {
    /// Recognize `NNNNN-NNN` or `NNNNNNNN`, ignoring surrounding whitespace.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let digits: String = match trimmed.as_bytes().get(5) {
            Some(b'-') if trimmed.len() == 9 => {
                let (head, tail) = trimmed.split_at(5);
                format!("{head}{}", &tail[1..])
            }
            _ => trimmed.to_string(),
        };
        (digits.len() == 8 && digits.bytes().all(|b| b.is_ascii_digit())).then_some(Self(digits))
    }

    /// Digits only, e.g. `01310200`.
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Conventional `01310-200` form.
    pub fn hyphenated(&self) -> String {
        format!("{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hyphenated())
    }
}

/// Caller-supplied origin or destination, before resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Explicit coordinates; resolved locally without any external call.
    Coordinates(Coordinates),
    /// Postal code; resolved through a structured postal-code search.
    PostalCode(Cep),
    /// Free-text address or city name; requires geocoding.
    Text(String),
}

impl Location {
    /// Stable representation used for cache keys and result echoes.
    pub fn cache_repr(&self) -> String {
        match self {
            Location::Coordinates(coords) => coords.cache_repr(),
            Location::PostalCode(cep) => format!("cep:{}", cep.digits()),
            Location::Text(text) => text.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Coordinates(coords) => write!(f, "{coords}"),
            Location::PostalCode(cep) => write!(f, "CEP {cep}"),
            Location::Text(text) => f.write_str(text),
        }
    }
}

impl From<Coordinates> for Location {
    fn from(value: Coordinates) -> Self {
        Location::Coordinates(value)
    }
}

impl FromStr for Location {
    type Err = Error;

    /// Parse `"lat,lon"` into coordinates, a CEP into a postal code and
    /// anything else into free text.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidParameter {
                name: "location".to_string(),
                message: "location must not be empty".to_string(),
            });
        }

        if let Some((lat, lon)) = trimmed.split_once(',') {
            if let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
                return Coordinates::new(lat, lon).map(Location::Coordinates);
            }
        }

        if let Some(cep) = Cep::parse(trimmed) {
            return Ok(Location::PostalCode(cep));
        }

        Ok(Location::Text(trimmed.to_string()))
    }
}
