use std::fmt;

use thiserror::Error;

/// Convenient result alias for the cabotage library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a port label or alias does not match any catalog entry.
    #[error("unknown port: {name}{}", format_suggestions(.suggestions))]
    UnknownPort {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when two catalog records share the same canonical name.
    #[error("duplicate port name encountered: {name}")]
    DuplicatePortName { name: String },

    /// Raised when two canonical ports claim the same normalized alias.
    #[error("alias '{alias}' is claimed by both '{first}' and '{second}'")]
    AliasCollision {
        alias: String,
        first: String,
        second: String,
    },

    /// Raised when the port catalog has no usable records.
    #[error("port catalog is empty")]
    EmptyPortCatalog,

    /// Raised when a port record fails validation.
    #[error("invalid port data: {message}")]
    PortDataValidation { message: String },

    /// Raised when the sea distance matrix fails validation.
    #[error("invalid sea matrix: {message}")]
    SeaMatrixValidation { message: String },

    /// Raised when the hotel factor table fails validation.
    #[error("invalid hotel factor table: {message}")]
    HotelFactorValidation { message: String },

    /// Raised when the diesel price table fails validation.
    #[error("invalid diesel price table: {message}")]
    DieselPriceValidation { message: String },

    /// Raised when neither state of a pair has a diesel price.
    #[error("no diesel price for states '{uf_origin}' or '{uf_destination}'")]
    DieselPriceUnavailable {
        uf_origin: String,
        uf_destination: String,
    },

    /// Raised when no port survives the candidate filter.
    #[error("no catalog port is available for the {role} side with the current filters")]
    NoPortAvailable { role: String },

    /// Raised when a truck preset name is not configured.
    #[error("unknown truck preset: {name}{}", format_suggestions(.suggestions))]
    UnknownTruckPreset {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when an axle count has no baseline efficiency.
    #[error("no baseline km/L configured for {axles} axles")]
    UnsupportedVehicleConfiguration { axles: u32 },

    /// Raised when the cargo mass is zero, negative or not finite.
    #[error("cargo mass must be finite and positive, got {cargo_t} t")]
    InvalidCargoMass { cargo_t: f64 },

    /// Raised when a numeric parameter is out of range.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    /// Raised when coordinates are malformed or out of range.
    #[error("invalid coordinates: {message}")]
    InvalidCoordinates { message: String },

    /// Raised when an address could not be geocoded.
    #[error("could not resolve address: {query}")]
    UnresolvedAddress { query: String },

    /// Raised when the routing provider finds no road route.
    #[error("no route found between {from} and {to} ({profile})")]
    NoRoute {
        from: String,
        to: String,
        profile: String,
    },

    /// Raised when the routing provider rejects the request for quota reasons.
    #[error("routing provider rate limit exceeded")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Raised for any other routing provider failure.
    #[error("routing provider error{}: {message}", format_status(.status))]
    RoutingProvider {
        status: Option<u16>,
        message: String,
    },

    /// Raised when the routing API key is not configured.
    #[error("ORS_API_KEY is not set")]
    MissingApiKey,

    /// No suitable project directories could be resolved for this platform.
    #[error("failed to resolve project directories for data and cache files")]
    ProjectDirsUnavailable,

    /// Raised when a cached payload cannot be decoded.
    #[error("corrupt cache entry for key {key}: {message}")]
    CachePayload { key: String, message: String },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Wrapper for JSON errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for CSV errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Coarse classification of failures, used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad caller input; rejected before any external call and never retried.
    InputValidation,
    /// Geocoding or routing failure reported by an external collaborator.
    ExternalResolution,
    /// Broken static data; detected at load time.
    ConfigurationIntegrity,
    /// Valid input and data, but the static data does not cover the request
    /// (for example no port passes the sea-coverage filter).
    DataCoverage,
    /// Local persistence or filesystem failure.
    Storage,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ErrorCategory::InputValidation => "input_validation",
            ErrorCategory::ExternalResolution => "external_resolution",
            ErrorCategory::ConfigurationIntegrity => "configuration_integrity",
            ErrorCategory::DataCoverage => "data_coverage",
            ErrorCategory::Storage => "storage",
        };
        f.write_str(value)
    }
}

impl Error {
    /// Classify the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownPort { .. }
            | Error::UnknownTruckPreset { .. }
            | Error::UnsupportedVehicleConfiguration { .. }
            | Error::InvalidCargoMass { .. }
            | Error::InvalidParameter { .. }
            | Error::InvalidCoordinates { .. }
            | Error::DieselPriceUnavailable { .. } => ErrorCategory::InputValidation,
            Error::UnresolvedAddress { .. }
            | Error::NoRoute { .. }
            | Error::RateLimited { .. }
            | Error::RoutingProvider { .. }
            | Error::Http(_) => ErrorCategory::ExternalResolution,
            Error::NoPortAvailable { .. } => ErrorCategory::DataCoverage,
            Error::DuplicatePortName { .. }
            | Error::AliasCollision { .. }
            | Error::EmptyPortCatalog
            | Error::PortDataValidation { .. }
            | Error::SeaMatrixValidation { .. }
            | Error::HotelFactorValidation { .. }
            | Error::DieselPriceValidation { .. }
            | Error::MissingApiKey
            | Error::ProjectDirsUnavailable => ErrorCategory::ConfigurationIntegrity,
            Error::CachePayload { .. }
            | Error::Sqlite(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Csv(_) => ErrorCategory::Storage,
        }
    }

    /// Whether retrying the whole evaluation later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimited { .. } | Error::Http(_) => true,
            Error::RoutingProvider { status, .. } => matches!(status, Some(500..=599) | None),
            _ => false,
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}
