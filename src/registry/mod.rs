//! Place registry: the read-only table of places and their data sources.
//!
//! Built once from a [`FileConfig`] and shared by reference. The only
//! mutable state in the application, the selected place, lives in
//! [`Session`].

mod session;

pub use session::Session;

use std::collections::BTreeMap;

use crate::config::FileConfig;
use crate::domain::{DataSource, Endpoint, LatLng, MAX_ZOOM, Place};
use crate::error::ConfigError;

/// Class shared by every map anchor element.
pub const MAP_ANCHOR_CLASS: &str = "map";

#[derive(Debug, Clone)]
pub struct PlaceRegistry {
    app_name: String,
    geocode: Endpoint,
    places: BTreeMap<String, Place>,
    /// Sorted place keys. Derived from `places` on construction.
    known_places: Vec<String>,
}

impl PlaceRegistry {
    /// Builds a registry from configuration. Keys are lower-cased; two keys
    /// that differ only by case are rejected.
    pub fn new(
        app_name: impl Into<String>,
        geocode: Endpoint,
        places: impl IntoIterator<Item = (String, Place)>,
    ) -> Result<Self, ConfigError> {
        let mut normalized = BTreeMap::new();
        for (key, place) in places {
            let key = normalize_key(&key);
            if normalized.insert(key.clone(), place).is_some() {
                return Err(ConfigError::DuplicatePlace(key));
            }
        }

        let known_places = normalized.keys().cloned().collect();
        Ok(Self {
            app_name: app_name.into(),
            geocode,
            places: normalized,
            known_places,
        })
    }

    /// Builds and validates a registry from a parsed config file.
    pub fn from_config(config: FileConfig) -> Result<Self, ConfigError> {
        let registry = Self::new(config.app_name, config.geocode, config.places)?;
        registry.validate()?;
        log::debug!(
            "Registry ready with {} places: {}",
            registry.known_places.len(),
            registry.known_places.join(", ")
        );
        Ok(registry)
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn geocode_endpoint(&self) -> &Endpoint {
        &self.geocode
    }

    pub fn known_places(&self) -> &[String] {
        &self.known_places
    }

    pub fn is_known_place(&self, key: &str) -> bool {
        let known = self.canonical_key(key).is_some();
        if !known {
            log::debug!("Unknown place: {key}");
        }
        known
    }

    /// The stored (lower-case) form of `key`, if the place exists.
    pub fn canonical_key(&self, key: &str) -> Option<&str> {
        let key = normalize_key(key);
        self.known_places
            .binary_search(&key)
            .ok()
            .map(|i| self.known_places[i].as_str())
    }

    /// Look up a place by key.
    ///
    /// # Arguments
    /// * `key` - Place key, matched case-insensitively
    ///
    /// # Returns
    /// * `Ok(&Place)` - The configured place
    /// * `Err(ConfigError::PlaceNotFound)` - If no place has that key
    pub fn place(&self, key: &str) -> Result<&Place, ConfigError> {
        self.places
            .get(&normalize_key(key))
            .ok_or_else(|| ConfigError::PlaceNotFound(key.to_string()))
    }

    /// Data-source names for a place, in name order.
    pub fn data_sources(&self, place: &str) -> Result<Vec<&str>, ConfigError> {
        Ok(self
            .place(place)?
            .data_sources
            .keys()
            .map(String::as_str)
            .collect())
    }

    pub fn data_source(&self, place: &str, name: &str) -> Result<&DataSource, ConfigError> {
        self.place(place)?
            .data_source(name)
            .ok_or_else(|| ConfigError::DataSourceNotFound {
                place: place.to_string(),
                source_name: name.to_string(),
            })
    }

    pub fn place_coord(&self, place: &str) -> Result<LatLng, ConfigError> {
        Ok(self.place(place)?.center())
    }

    pub fn map_zoom(&self, place: &str) -> Result<u8, ConfigError> {
        Ok(self.place(place)?.zoom())
    }

    pub fn city(&self, place: &str) -> Result<Option<&str>, ConfigError> {
        let city = self.place(place)?.city();
        if city.is_none() {
            log::debug!("No city defined for place {place}");
        }
        Ok(city)
    }

    pub fn state(&self, place: &str) -> Result<Option<&str>, ConfigError> {
        Ok(self.place(place)?.state())
    }

    pub fn state_abbrev(&self, place: &str) -> Result<Option<&str>, ConfigError> {
        Ok(self.place(place)?.state_abbrev())
    }

    /// Element id for a place's map, e.g. `map-austin` or
    /// `map-austin-crimeData` when the map is dedicated to one source.
    pub fn map_anchor_id(&self, place: &str, data_source: Option<&str>) -> String {
        let key = self
            .canonical_key(place)
            .map(str::to_string)
            .unwrap_or_else(|| normalize_key(place));
        let mut id = format!("map-{key}");
        if let Some(source) = data_source.filter(|s| !s.is_empty()) {
            id.push('-');
            id.push_str(source);
        }
        id
    }

    /// Rejects places a map view could not display.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.geocode.query_url.trim().is_empty() {
            return Err(invalid("geocode", "query_url is empty"));
        }

        for (key, place) in &self.places {
            if !place.center().is_valid() {
                return Err(invalid(key, format!("center {} is out of range", place.center())));
            }
            if place.zoom() > MAX_ZOOM {
                return Err(invalid(
                    key,
                    format!("zoom {} exceeds {}", place.zoom(), MAX_ZOOM),
                ));
            }
            for (name, source) in &place.data_sources {
                if source.endpoint.query_url.trim().is_empty() {
                    return Err(invalid(&format!("{key}.{name}"), "query_url is empty"));
                }
                if source.coordinates.is_none() {
                    log::warn!("{key}.{name} has no coordinate accessor; its records cannot be plotted");
                }
            }
        }
        Ok(())
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

fn invalid(context: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        context: context.to_string(),
        message: message.into(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_places_sorted_and_unique() {
        let registry = fixtures::registry();
        assert_eq!(registry.known_places(), ["austin", "connecticut"]);
    }

    #[test]
    fn test_is_known_place_ignores_case() {
        let registry = fixtures::registry();
        assert!(registry.is_known_place("austin"));
        assert!(registry.is_known_place("Austin"));
        assert!(registry.is_known_place("AUSTIN"));
        assert!(!registry.is_known_place("timbuktu"));
        assert_eq!(registry.canonical_key("Connecticut"), Some("connecticut"));
    }

    #[test]
    fn test_keys_are_lowercased_and_collisions_rejected() {
        let place = Place::new(LatLng::new(1.0, 1.0), 5);
        let registry = PlaceRegistry::new(
            "x",
            Endpoint::new("geo", "https://example.org/?"),
            [
                ("Zeta".to_string(), place.clone()),
                ("alpha".to_string(), place.clone()),
            ],
        )
        .unwrap();
        assert_eq!(registry.known_places(), ["alpha", "zeta"]);

        let err = PlaceRegistry::new(
            "x",
            Endpoint::new("geo", "https://example.org/?"),
            [
                ("Austin".to_string(), place.clone()),
                ("austin".to_string(), place),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePlace(key) if key == "austin"));
    }

    #[test]
    fn test_place_accessors() {
        let registry = fixtures::registry();

        let coord = registry.place_coord("austin").unwrap();
        assert_eq!(coord, LatLng::new(30.27504, -97.73855469999999));
        assert_eq!(registry.map_zoom("connecticut").unwrap(), 8);
        assert_eq!(
            registry.data_sources("austin").unwrap(),
            vec!["crimeData", "trafficData"]
        );
        assert_eq!(registry.city("austin").unwrap(), Some("austin"));
        assert_eq!(registry.city("connecticut").unwrap(), None);
        assert_eq!(registry.state("austin").unwrap(), Some("texas"));
        assert_eq!(registry.state_abbrev("austin").unwrap(), Some("tx"));
    }

    #[test]
    fn test_unknown_lookups_are_config_errors() {
        let registry = fixtures::registry();
        assert!(matches!(
            registry.place("timbuktu"),
            Err(ConfigError::PlaceNotFound(_))
        ));
        assert!(matches!(
            registry.data_source("austin", "weatherData"),
            Err(ConfigError::DataSourceNotFound { .. })
        ));
        assert!(registry.data_sources("timbuktu").is_err());
    }

    #[test]
    fn test_map_anchor_id() {
        let registry = fixtures::registry();
        assert_eq!(registry.map_anchor_id("austin", None), "map-austin");
        assert_eq!(
            registry.map_anchor_id("austin", Some("crimeData")),
            "map-austin-crimeData"
        );
        assert_eq!(registry.map_anchor_id("austin", Some("")), "map-austin");
        assert_eq!(registry.map_anchor_id("Austin", None), "map-austin");
        assert_eq!(
            registry.map_anchor_id(" CONNECTICUT ", Some("schoolDistricts")),
            "map-connecticut-schoolDistricts"
        );
    }

    #[test]
    fn test_validate_rejects_bad_zoom_and_center() {
        let geocode = Endpoint::new("geo", "https://example.org/?");

        let too_deep = Place::new(LatLng::new(30.0, -97.0), 19);
        let registry =
            PlaceRegistry::new("x", geocode.clone(), [("deep".to_string(), too_deep)]).unwrap();
        assert!(matches!(
            registry.validate(),
            Err(ConfigError::Invalid { context, .. }) if context == "deep"
        ));

        let off_planet = Place::new(LatLng::new(130.0, -97.0), 10);
        let registry =
            PlaceRegistry::new("x", geocode, [("void".to_string(), off_planet)]).unwrap();
        assert!(registry.validate().is_err());

        assert!(fixtures::registry().validate().is_ok());
    }

    #[test]
    fn test_builtin_config_builds_registry() {
        let registry = PlaceRegistry::from_config(FileConfig::builtin().unwrap()).unwrap();
        assert_eq!(registry.app_name(), "Austin Aware");
        assert_eq!(registry.known_places(), ["austin", "connecticut"]);
        assert_eq!(
            registry.data_sources("connecticut").unwrap(),
            vec!["schoolDistricts"]
        );
    }
}
