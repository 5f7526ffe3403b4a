pub mod coord;
pub mod place;
pub mod source;

pub use coord::LatLng;
pub use place::{Location, MAX_ZOOM, MapOptions, Place};
pub use source::{CoordinateAccessor, DataSource, Endpoint};
