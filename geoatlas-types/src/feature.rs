use crate::JsonObject;
use crate::geometry::Geometry;
use serde::{Deserialize, Serialize};

/// The `"type": "Feature"` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FeatureType {
    #[default]
    Feature,
}

/// The `"type": "FeatureCollection"` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CollectionType {
    #[default]
    FeatureCollection,
}

/// Feature identifier on the wire.
///
/// Stored features carry integer ids assigned at ingest; aggregated
/// cluster features carry synthetic string ids such as `"province-0"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Int(u64),
    Str(String),
}

impl From<u64> for FeatureId {
    fn from(id: u64) -> Self {
        FeatureId::Int(id)
    }
}

impl From<String> for FeatureId {
    fn from(id: String) -> Self {
        FeatureId::Str(id)
    }
}

/// One geometry + property record, serialized as a GeoJSON Feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    pub marker: FeatureType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: JsonObject,
}

impl Feature {
    pub fn new(id: impl Into<FeatureId>, geometry: Geometry, properties: JsonObject) -> Self {
        Self {
            marker: FeatureType::Feature,
            id: Some(id.into()),
            geometry,
            properties,
        }
    }

    /// A feature without an id, as produced by the tile builder.
    pub fn without_id(geometry: Geometry, properties: JsonObject) -> Self {
        Self {
            marker: FeatureType::Feature,
            id: None,
            geometry,
            properties,
        }
    }
}

/// The standard feature-collection envelope returned by every query
/// endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub marker: CollectionType,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            marker: CollectionType::FeatureCollection,
            features,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
