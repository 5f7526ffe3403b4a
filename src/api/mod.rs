pub mod address;
pub mod endpoint;
pub mod fetch;
pub mod geocode;

pub use address::filter_address;
pub use endpoint::{
    encode_query_value, full_address, resolve_endpoint, resolve_geocode_endpoint,
    resolve_source_endpoint,
};
pub use fetch::{Fetcher, HttpFetcher, fetch_records};
pub use geocode::{GeocodeMatch, Geocoder, parse_geocode_response};
