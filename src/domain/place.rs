use serde::Deserialize;
use std::collections::BTreeMap;

use super::{DataSource, LatLng};

pub const MAX_ZOOM: u8 = 18;

fn default_zoom() -> u8 {
    11
}

/// Where a place sits and what it is called, for address completion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub state_abbrev: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapOptions {
    /// 11 suits a city, 8 a state.
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default)]
    pub background_image: Option<String>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            background_image: None,
        }
    }
}

/// A named area of interest and the feeds plotted on it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    pub location: Location,
    #[serde(default)]
    pub map_options: MapOptions,
    #[serde(default)]
    pub data_sources: BTreeMap<String, DataSource>,
}

impl Place {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            location: Location {
                lat: center.lat,
                lng: center.lng,
                city: None,
                state: None,
                state_abbrev: None,
            },
            map_options: MapOptions {
                zoom,
                background_image: None,
            },
            data_sources: BTreeMap::new(),
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.location.city = Some(city.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>, abbrev: impl Into<String>) -> Self {
        self.location.state = Some(state.into());
        self.location.state_abbrev = Some(abbrev.into());
        self
    }

    pub fn with_data_source(mut self, name: impl Into<String>, source: DataSource) -> Self {
        self.data_sources.insert(name.into(), source);
        self
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(self.location.lat, self.location.lng)
    }

    pub fn zoom(&self) -> u8 {
        self.map_options.zoom
    }

    pub fn city(&self) -> Option<&str> {
        non_empty(self.location.city.as_deref())
    }

    pub fn state(&self) -> Option<&str> {
        non_empty(self.location.state.as_deref())
    }

    pub fn state_abbrev(&self) -> Option<&str> {
        non_empty(self.location.state_abbrev.as_deref())
    }

    pub fn data_source(&self, name: &str) -> Option<&DataSource> {
        self.data_sources.get(name)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
