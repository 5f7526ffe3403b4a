use std::path::PathBuf;

use thiserror::Error;

/// Refused operations on the place registry. State is never changed when
/// one of these is returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown place: {0}")]
    PlaceNotFound(String),

    #[error("unknown data source {source_name:?} for place {place:?}")]
    DataSourceNotFound { place: String, source_name: String },

    #[error("place key {0:?} is defined more than once (keys are case-insensitive)")]
    DuplicatePlace(String),

    #[error("invalid configuration for {context}: {message}")]
    Invalid { context: String, message: String },

    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Why a record could not be turned into a marker position.
///
/// Never fatal: the orchestrator skips the record and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateExtractionFailure {
    #[error("data source has no coordinate accessor")]
    NoAccessor,

    #[error("field {0:?} is absent")]
    FieldAbsent(String),

    #[error("field {field:?} holds a non-numeric value: {value}")]
    Unparseable { field: String, value: String },

    #[error("coordinate ({lat}, {lng}) is out of range")]
    OutOfRange { lat: f64, lng: f64 },
}

/// A fetch that did not produce a record set.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("expected a JSON array of records, got {0}")]
    NotAnArray(&'static str),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("geocoding service answered {status}: {message}")]
    Status { status: String, message: String },

    #[error("no geocoding result for {0:?}")]
    NoResults(String),
}
