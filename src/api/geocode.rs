use serde::Deserialize;
use serde_json::Value;

use super::endpoint::resolve_geocode_endpoint;
use super::fetch::Fetcher;
use crate::domain::LatLng;
use crate::error::GeocodeError;
use crate::registry::PlaceRegistry;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: Option<String>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

/// Best match for a street address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub position: LatLng,
    pub formatted_address: Option<String>,
}

/// Turns street addresses inside a known place into coordinates.
///
/// The upstream service throttles aggressively; `OVER_QUERY_LIMIT` is
/// returned to the caller as-is rather than retried.
pub struct Geocoder<'a, F> {
    registry: &'a PlaceRegistry,
    fetcher: F,
}

impl<'a, F: Fetcher> Geocoder<'a, F> {
    pub fn new(registry: &'a PlaceRegistry, fetcher: F) -> Self {
        Self { registry, fetcher }
    }

    /// Geocode a street address to latitude/longitude coordinates.
    ///
    /// The address is filtered and completed with the place's city and
    /// state before the request is sent.
    ///
    /// # Arguments
    /// * `place` - Place key the address belongs to (e.g., "austin")
    /// * `street` - Street address (e.g., "2400 BLOCK E RIVERSIDE DR")
    ///
    /// # Returns
    /// * `Ok(GeocodeMatch)` - Position of the first result
    /// * `Err` - Unknown place, transport failure, or a non-`OK` status
    pub fn geocode(&self, place: &str, street: &str) -> Result<GeocodeMatch, GeocodeError> {
        let url = resolve_geocode_endpoint(self.registry, place, street)?;
        let body = self.fetcher.fetch_json(&url)?;
        let found = parse_geocode_response(body, street)?;
        log::info!("Geocoded {street:?} -> {}", found.position);
        Ok(found)
    }
}

/// Extracts the first result from a geocoding response body.
pub fn parse_geocode_response(body: Value, query: &str) -> Result<GeocodeMatch, GeocodeError> {
    let GeocodeResponse {
        status,
        error_message,
        results,
    } = serde_json::from_value(body).map_err(|e| GeocodeError::Transport(e.into()))?;

    match status.as_str() {
        "OK" => results
            .into_iter()
            .next()
            .map(|result| GeocodeMatch {
                position: result.geometry.location,
                formatted_address: result.formatted_address,
            })
            .ok_or_else(|| GeocodeError::NoResults(query.to_string())),
        "ZERO_RESULTS" => Err(GeocodeError::NoResults(query.to_string())),
        other => Err(GeocodeError::Status {
            status: other.to_string(),
            message: error_message.unwrap_or_else(|| "no message".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::registry::fixtures;
    use serde_json::json;
    use std::sync::Mutex;

    struct Recording {
        body: Value,
        urls: Mutex<Vec<String>>,
    }

    impl Fetcher for Recording {
        fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    fn ok_body() -> Value {
        json!({
            "status": "OK",
            "results": [{
                "formatted_address": "2400 E Riverside Dr, Austin, TX 78741, USA",
                "geometry": {"location": {"lat": 30.2367, "lng": -97.7224}}
            }]
        })
    }

    #[test]
    fn test_parse_first_result() {
        let found = parse_geocode_response(ok_body(), "2400 E Riverside Dr").unwrap();
        assert_eq!(found.position, LatLng::new(30.2367, -97.7224));
        assert_eq!(
            found.formatted_address.as_deref(),
            Some("2400 E Riverside Dr, Austin, TX 78741, USA")
        );
    }

    #[test]
    fn test_parse_statuses() {
        let zero = json!({"status": "ZERO_RESULTS", "results": []});
        assert!(matches!(
            parse_geocode_response(zero, "nowhere"),
            Err(GeocodeError::NoResults(q)) if q == "nowhere"
        ));

        let throttled = json!({
            "status": "OVER_QUERY_LIMIT",
            "error_message": "You have exceeded your rate-limit for this API."
        });
        assert!(matches!(
            parse_geocode_response(throttled, "x"),
            Err(GeocodeError::Status { status, .. }) if status == "OVER_QUERY_LIMIT"
        ));

        let malformed = json!({"results": []});
        assert!(matches!(
            parse_geocode_response(malformed, "x"),
            Err(GeocodeError::Transport(TransportError::Decode(_)))
        ));
    }

    #[test]
    fn test_geocoder_requests_resolved_endpoint() {
        let registry = fixtures::registry();
        let fetcher = Recording {
            body: ok_body(),
            urls: Mutex::new(Vec::new()),
        };
        let geocoder = Geocoder::new(&registry, &fetcher);

        let found = geocoder.geocode("austin", "2400 BLOCK E RIVERSIDE DR").unwrap();
        assert_eq!(found.position, LatLng::new(30.2367, -97.7224));
        assert_eq!(
            fetcher.urls.lock().unwrap().as_slice(),
            ["https://maps.googleapis.com/maps/api/geocode/json?address=2400+BLOCK+E+RIVERSIDE+DR,austin,texas&key=KEY"]
        );
    }

    #[test]
    fn test_geocoder_unknown_place() {
        let registry = fixtures::registry();
        let fetcher = Recording {
            body: ok_body(),
            urls: Mutex::new(Vec::new()),
        };
        let geocoder = Geocoder::new(&registry, &fetcher);
        assert!(matches!(
            geocoder.geocode("timbuktu", "1 Main St"),
            Err(GeocodeError::Config(_))
        ));
        assert!(fetcher.urls.lock().unwrap().is_empty());
    }
}
