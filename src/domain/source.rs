use serde::Deserialize;
use serde_json::Value;

use super::LatLng;
use crate::error::CoordinateExtractionFailure;

/// A queryable URL plus the optional API-key parameter appended to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoint {
    /// Display string, shown as map attribution.
    pub description: String,
    /// Base query URL. Must already end with whatever separator the
    /// appended parameters need.
    pub query_url: String,
    #[serde(default)]
    pub api_key_name: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Endpoint {
    pub fn new(description: impl Into<String>, query_url: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            query_url: query_url.into(),
            api_key_name: None,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.api_key_name = Some(name.into());
        self.api_key = Some(value.into());
        self
    }

    /// The `(name, value)` pair, only when both halves are non-empty.
    pub fn api_key_param(&self) -> Option<(&str, &str)> {
        let name = self.api_key_name.as_deref().filter(|s| !s.is_empty())?;
        let value = self.api_key.as_deref().filter(|s| !s.is_empty())?;
        Some((name, value))
    }
}

/// A named open-data feed belonging to a place.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataSource {
    #[serde(flatten)]
    pub endpoint: Endpoint,
    /// How to find a position inside one record of this feed.
    #[serde(default)]
    pub coordinates: Option<CoordinateAccessor>,
    /// Record fields joined with ", " to title each marker.
    #[serde(default)]
    pub title_fields: Vec<String>,
}

impl DataSource {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            coordinates: None,
            title_fields: Vec::new(),
        }
    }

    pub fn with_coordinates(mut self, accessor: CoordinateAccessor) -> Self {
        self.coordinates = Some(accessor);
        self
    }

    pub fn with_title_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.title_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn description(&self) -> &str {
        &self.endpoint.description
    }

    pub fn extract_coordinate(&self, record: &Value) -> Result<LatLng, CoordinateExtractionFailure> {
        self.coordinates
            .as_ref()
            .ok_or(CoordinateExtractionFailure::NoAccessor)?
            .extract(record)
    }

    /// Joins the title fields present in `record`, skipping absent and
    /// blank ones.
    pub fn marker_title(&self, record: &Value) -> Option<String> {
        let parts: Vec<String> = self
            .title_fields
            .iter()
            .filter_map(|field| record.get(field).and_then(scalar_text))
            .filter(|text| !text.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// The geometry layouts open-data feeds use for point records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinateAccessor {
    /// Two top-level fields holding numbers or numeric strings.
    Fields { lat: String, lng: String },
    /// Socrata location object: `{"latitude": "41.7", "longitude": "-72.6"}`.
    /// A GeoJSON point stored under the same field is accepted too.
    Location { field: String },
    /// GeoJSON point: `{"type": "Point", "coordinates": [lng, lat]}`.
    Point { field: String },
}

impl CoordinateAccessor {
    pub fn extract(&self, record: &Value) -> Result<LatLng, CoordinateExtractionFailure> {
        let coord = match self {
            Self::Fields { lat, lng } => LatLng::new(
                number_field(record, lat, lat)?,
                number_field(record, lng, lng)?,
            ),
            Self::Location { field } => {
                let location = present(record, field)?;
                if location.get("coordinates").is_some() {
                    geojson_point(location, field)?
                } else {
                    LatLng::new(
                        number_field(location, "latitude", &format!("{field}.latitude"))?,
                        number_field(location, "longitude", &format!("{field}.longitude"))?,
                    )
                }
            }
            Self::Point { field } => geojson_point(present(record, field)?, field)?,
        };

        // (0, 0) is what several feeds write for "not geocoded".
        if !coord.is_valid() || (coord.lat == 0.0 && coord.lng == 0.0) {
            return Err(CoordinateExtractionFailure::OutOfRange {
                lat: coord.lat,
                lng: coord.lng,
            });
        }
        Ok(coord)
    }
}

fn present<'a>(record: &'a Value, field: &str) -> Result<&'a Value, CoordinateExtractionFailure> {
    match record.get(field) {
        None | Some(Value::Null) => Err(CoordinateExtractionFailure::FieldAbsent(field.to_string())),
        Some(value) => Ok(value),
    }
}

fn number_field(
    record: &Value,
    field: &str,
    label: &str,
) -> Result<f64, CoordinateExtractionFailure> {
    let value = present(record, field)
        .map_err(|_| CoordinateExtractionFailure::FieldAbsent(label.to_string()))?;
    number_value(value, label)
}

fn number_value(value: &Value, label: &str) -> Result<f64, CoordinateExtractionFailure> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| CoordinateExtractionFailure::Unparseable {
        field: label.to_string(),
        value: value.to_string(),
    })
}

fn geojson_point(point: &Value, field: &str) -> Result<LatLng, CoordinateExtractionFailure> {
    let label = format!("{field}.coordinates");
    let coords = point
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| CoordinateExtractionFailure::FieldAbsent(label.clone()))?;

    match coords.as_slice() {
        [lng, lat, ..] => Ok(LatLng::new(
            number_value(lat, &label)?,
            number_value(lng, &label)?,
        )),
        _ => Err(CoordinateExtractionFailure::Unparseable {
            field: label,
            value: Value::Array(coords.clone()).to_string(),
        }),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn location_source() -> DataSource {
        DataSource::new(Endpoint::new(
            "School Districts",
            "https://data.ct.gov/resource/9k2y-kqxn.json",
        ))
        .with_coordinates(CoordinateAccessor::Location {
            field: "location_1".to_string(),
        })
        .with_title_fields(["name", "town"])
    }

    #[test]
    fn test_socrata_location() {
        let record = json!({
            "name": "Hartford School District",
            "location_1": {"latitude": "41.76", "longitude": "-72.67", "human_address": "{}"}
        });
        let coord = location_source().extract_coordinate(&record).unwrap();
        assert!((coord.lat - 41.76).abs() < 1e-9);
        assert!((coord.lng - -72.67).abs() < 1e-9);
    }

    #[test]
    fn test_location_field_holding_geojson() {
        let record = json!({"location_1": {"type": "Point", "coordinates": [-72.67, 41.76]}});
        let coord = location_source().extract_coordinate(&record).unwrap();
        assert!((coord.lat - 41.76).abs() < 1e-9);
    }

    #[test]
    fn test_geojson_point() {
        let accessor = CoordinateAccessor::Point {
            field: "location".to_string(),
        };
        let record = json!({"location": {"type": "Point", "coordinates": [-97.74, 30.27]}});
        assert_eq!(accessor.extract(&record).unwrap(), LatLng::new(30.27, -97.74));
    }

    #[test]
    fn test_separate_fields_mixed_types() {
        let accessor = CoordinateAccessor::Fields {
            lat: "latitude".to_string(),
            lng: "longitude".to_string(),
        };
        let record = json!({"latitude": "30.2", "longitude": -97.7});
        assert_eq!(accessor.extract(&record).unwrap(), LatLng::new(30.2, -97.7));
    }

    #[test]
    fn test_failures_are_distinguished() {
        let source = location_source();

        let aggregate = json!({"count": "42"});
        assert_eq!(
            source.extract_coordinate(&aggregate),
            Err(CoordinateExtractionFailure::FieldAbsent("location_1".to_string()))
        );

        let half = json!({"location_1": {"latitude": "41.7"}});
        assert_eq!(
            source.extract_coordinate(&half),
            Err(CoordinateExtractionFailure::FieldAbsent(
                "location_1.longitude".to_string()
            ))
        );

        let garbage = json!({"location_1": {"latitude": "n/a", "longitude": "-72.6"}});
        assert!(matches!(
            source.extract_coordinate(&garbage),
            Err(CoordinateExtractionFailure::Unparseable { .. })
        ));

        let null_island = json!({"location_1": {"latitude": "0", "longitude": "0"}});
        assert!(matches!(
            source.extract_coordinate(&null_island),
            Err(CoordinateExtractionFailure::OutOfRange { .. })
        ));

        let no_accessor = DataSource::new(Endpoint::new("x", "https://example.org/x.json"));
        assert_eq!(
            no_accessor.extract_coordinate(&aggregate),
            Err(CoordinateExtractionFailure::NoAccessor)
        );
    }

    #[test]
    fn test_marker_title_skips_missing_fields() {
        let source = location_source();
        let record = json!({"name": "Hartford School District", "town": "Hartford"});
        assert_eq!(
            source.marker_title(&record).as_deref(),
            Some("Hartford School District, Hartford")
        );

        let partial = json!({"name": "Region 10", "town": "  "});
        assert_eq!(source.marker_title(&partial).as_deref(), Some("Region 10"));
        assert_eq!(source.marker_title(&json!({})), None);
    }

    #[test]
    fn test_api_key_param_requires_both_halves() {
        let endpoint = Endpoint::new("x", "https://example.org/x.json?");
        assert_eq!(endpoint.api_key_param(), None);
        assert_eq!(endpoint.clone().with_api_key("token", "").api_key_param(), None);
        assert_eq!(
            endpoint.with_api_key("token", "abc").api_key_param(),
            Some(("token", "abc"))
        );
    }

    #[test]
    fn test_deserialize_from_toml() {
        let source: DataSource = toml::from_str(
            r#"
            description = "Austin Traffic Incidents"
            query_url = "https://data.austintexas.gov/resource/i3kd-c47g.json"
            title_fields = ["issue_reported", "address"]

            [coordinates]
            type = "fields"
            lat = "latitude"
            lng = "longitude"
            "#,
        )
        .unwrap();
        assert_eq!(source.description(), "Austin Traffic Incidents");
        assert_eq!(source.endpoint.api_key_param(), None);
        assert_eq!(
            source.coordinates,
            Some(CoordinateAccessor::Fields {
                lat: "latitude".to_string(),
                lng: "longitude".to_string()
            })
        );
    }
}
