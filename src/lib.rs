//! placemap - Plot open-data point records on a map centered on a configured place

pub mod api;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod registry;
pub mod view;

pub use controller::{LoadOrchestrator, LoadReport, LoadState};
pub use error::{ConfigError, CoordinateExtractionFailure, GeocodeError, LoadError, TransportError};
pub use registry::{PlaceRegistry, Session};
