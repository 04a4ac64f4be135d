//! Polygon features read from GeoJSON
//!
//! Building footprint datasets are distributed as GeoJSON feature
//! collections of polygons. Only Polygon and MultiPolygon geometries are
//! kept; other geometry types are skipped.

use crate::error::{Error, Result};
use geo_types::{MultiPolygon, Polygon};
use geojson::feature::Id;
use geojson::GeoJson;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Attribute value types
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<serde_json::Value> for AttributeValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            other => Self::String(other.to_string()),
        }
    }
}

/// A polygonal feature with attributes
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: MultiPolygon<f64>,
    pub properties: HashMap<String, AttributeValue>,
    pub id: Option<String>,
}

impl Feature {
    pub fn new(geometry: MultiPolygon<f64>) -> Self {
        Self {
            geometry,
            properties: HashMap::new(),
            id: None,
        }
    }

    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self::new(MultiPolygon::new(vec![polygon]))
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

/// Collection of polygon features
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new() }
    }

    /// Read a GeoJSON FeatureCollection from disk
    pub fn from_geojson_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_geojson_str(&text)
    }

    /// Parse a GeoJSON FeatureCollection
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let collection = match text.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(fc) => fc,
            GeoJson::Feature(_) => {
                return Err(Error::InvalidGeometry(
                    "expected a FeatureCollection, got a Feature".into(),
                ))
            }
            GeoJson::Geometry(_) => {
                return Err(Error::InvalidGeometry(
                    "expected a FeatureCollection, got a bare Geometry".into(),
                ))
            }
        };

        let mut out = FeatureCollection::new();
        let mut skipped = 0usize;
        for raw in collection.features {
            let Some(geometry) = raw.geometry.map(|g| multi_polygon(g.value)).transpose()?.flatten()
            else {
                skipped += 1;
                continue;
            };
            let mut feature = Feature::new(geometry);
            feature.id = raw.id.map(|id| match id {
                Id::String(s) => s,
                Id::Number(n) => n.to_string(),
            });
            for (key, value) in raw.properties.unwrap_or_default() {
                feature.set_property(key, value.into());
            }
            out.push(feature);
        }
        if skipped > 0 {
            debug!(skipped, "skipped features without polygon geometry");
        }
        Ok(out)
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

/// Polygonal geometries as a MultiPolygon; `None` for every other type
fn multi_polygon(value: geojson::Value) -> Result<Option<MultiPolygon<f64>>> {
    match value {
        geojson::Value::Polygon(_) => {
            let polygon = Polygon::<f64>::try_from(value)?;
            Ok(Some(MultiPolygon::new(vec![polygon])))
        }
        geojson::Value::MultiPolygon(_) => Ok(Some(MultiPolygon::<f64>::try_from(value)?)),
        _ => Ok(None),
    }
}
