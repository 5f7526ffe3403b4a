//! Query URL assembly for data sources and the geocoding service.
//!
//! Parts are concatenated positionally: base URL, extra parameters, API key.
//! No separator is inserted between the base URL and what follows, so a base
//! URL that does not already end in `?` or `&` produces a malformed query.
//! Some upstream endpoints are configured around that, so it is kept.

use super::address::filter_address;
use crate::domain::Endpoint;
use crate::error::ConfigError;
use crate::registry::PlaceRegistry;

/// Builds the request URL for `endpoint`.
///
/// Spaces in `extra_params` become `+`; nothing else is encoded, so callers
/// may pass several `&`-joined parameters. Values that may contain reserved
/// characters go through [`encode_query_value`] first. The API key is joined
/// to the extra parameters with `&`, or appended directly when there are none.
///
/// # Arguments
/// * `endpoint` - Base URL and optional API-key parameter
/// * `extra_params` - Query text placed between the base URL and the key
///
/// # Returns
/// * The concatenated URL, e.g. `...json?address=1+Main+St&key=abc`
pub fn resolve_endpoint(endpoint: &Endpoint, extra_params: Option<&str>) -> String {
    let mut url = endpoint.query_url.clone();

    let params = extra_params.filter(|p| !p.is_empty());
    if let Some(params) = params {
        url.push_str(&params.replace(' ', "+"));
    }

    if let Some((name, value)) = endpoint.api_key_param() {
        if params.is_some() {
            url.push('&');
        }
        url.push_str(name);
        url.push('=');
        url.push_str(value);
    }

    url
}

/// Endpoint for a named data source of a place.
///
/// # Returns
/// * `Ok(url)` - As built by [`resolve_endpoint`]
/// * `Err` - [`ConfigError::PlaceNotFound`] or [`ConfigError::DataSourceNotFound`]
pub fn resolve_source_endpoint(
    registry: &PlaceRegistry,
    place: &str,
    data_source: &str,
    extra_params: Option<&str>,
) -> Result<String, ConfigError> {
    let source = registry.data_source(place, data_source)?;
    Ok(resolve_endpoint(&source.endpoint, extra_params))
}

/// `street` with noise tokens removed, followed by `,city` and `,state`
/// when the place defines them.
pub fn full_address(
    registry: &PlaceRegistry,
    place: &str,
    street: &str,
) -> Result<String, ConfigError> {
    let mut address = filter_address(street);
    if let Some(city) = registry.city(place)? {
        address.push(',');
        address.push_str(city);
    }
    if let Some(state) = registry.state(place)? {
        address.push(',');
        address.push_str(state);
    }
    Ok(address)
}

/// Percent-encodes a query value word by word.
///
/// Reserved characters such as `&`, `#`, `+` and `=` are escaped, while
/// spaces still become `+` and commas between address parts stay literal.
pub fn encode_query_value(value: &str) -> String {
    value
        .split(',')
        .map(|part| {
            part.split(' ')
                .map(|word| urlencoding::encode(word).into_owned())
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Geocoding request URL for a street address inside `place`.
///
/// # Arguments
/// * `registry` - Supplies the geocoding descriptor and the place's city/state
/// * `place` - Place key (case-insensitive)
/// * `street` - Raw street address as found in a record
///
/// # Returns
/// * `Ok(url)` - `address=<street>,<city>,<state>` plus the API key
/// * `Err` - If `place` is unknown
pub fn resolve_geocode_endpoint(
    registry: &PlaceRegistry,
    place: &str,
    street: &str,
) -> Result<String, ConfigError> {
    let address = full_address(registry, place, street)?;
    let url = resolve_endpoint(
        registry.geocode_endpoint(),
        Some(&format!("address={}", encode_query_value(&address))),
    );
    log::debug!("Geocode endpoint for {street:?}: {url}");
    Ok(url)
}
