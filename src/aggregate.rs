//! Eager hierarchical clustering of point layers.
//!
//! Low-zoom browsing must never scan the full POI set, so after the POI
//! layer loads we precompute one summary row per distinct administrative
//! key at each level: province, province:city, province:city:district.
//! The output is immutable until the layer reloads.

use crate::store::StoredFeature;
use geoatlas_types::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator joining the property values of a grouping chain into a key.
const KEY_SEPARATOR: &str = ":";

/// Hierarchical grouping granularity for POI clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationLevel {
    Province,
    City,
    District,
}

impl AggregationLevel {
    pub const ALL: [AggregationLevel; 3] = [
        AggregationLevel::Province,
        AggregationLevel::City,
        AggregationLevel::District,
    ];

    /// The ordered property-key chain this level groups by.
    pub fn chain(&self) -> &'static [&'static str] {
        match self {
            AggregationLevel::Province => &["province"],
            AggregationLevel::City => &["province", "city"],
            AggregationLevel::District => &["province", "city", "district"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationLevel::Province => "province",
            AggregationLevel::City => "city",
            AggregationLevel::District => "district",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "province" => Some(AggregationLevel::Province),
            "city" => Some(AggregationLevel::City),
            "district" => Some(AggregationLevel::District),
            _ => None,
        }
    }
}

/// One cluster summary: a distinct group key with its member count and
/// centroid (arithmetic mean of member coordinates, not area-weighted).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedPoint {
    pub name: String,
    pub key: String,
    pub count: u64,
    pub lng: f64,
    pub lat: f64,
    pub level: AggregationLevel,
}

/// Precomputed aggregations for every level, built once at load time.
#[derive(Debug, Default)]
pub struct AggregateSet {
    levels: BTreeMap<AggregationLevel, Vec<AggregatedPoint>>,
}

impl AggregateSet {
    /// Aggregate a point layer over the given levels.
    ///
    /// A point with a null or missing value anywhere in a level's chain is
    /// excluded from that level (not an error); non-point features never
    /// contribute. Grouping goes through a `BTreeMap` and sums follow
    /// feature id order, so re-running on unchanged input is byte-identical.
    pub fn build(features: &[StoredFeature], levels: &[AggregationLevel]) -> Self {
        let mut set = Self::default();
        for level in levels {
            set.levels
                .insert(*level, aggregate_level(features, *level));
        }
        set
    }

    pub fn get(&self, level: AggregationLevel) -> &[AggregatedPoint] {
        self.levels.get(&level).map_or(&[], Vec::as_slice)
    }

    /// Cluster centroids as Point features, the serving representation.
    pub fn to_feature_collection(&self, level: AggregationLevel) -> FeatureCollection {
        self.get(level)
            .iter()
            .enumerate()
            .map(|(idx, point)| {
                let mut properties = JsonObject::new();
                properties.insert("name".to_string(), point.name.clone().into());
                properties.insert("key".to_string(), point.key.clone().into());
                properties.insert("count".to_string(), point.count.into());
                properties.insert("level".to_string(), level.as_str().into());
                properties.insert("isCluster".to_string(), true.into());
                Feature::new(
                    format!("{}-{}", level.as_str(), idx),
                    Geometry::Point([point.lng, point.lat]),
                    properties,
                )
            })
            .collect()
    }
}

struct Group {
    name: String,
    count: u64,
    sum_lng: f64,
    sum_lat: f64,
}

fn aggregate_level(features: &[StoredFeature], level: AggregationLevel) -> Vec<AggregatedPoint> {
    let chain = level.chain();
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();

    for feature in features {
        let Geometry::Point([lng, lat]) = feature.geometry else {
            continue;
        };
        let Some(values) = chain_values(&feature.properties, chain) else {
            continue;
        };
        let key = values.join(KEY_SEPARATOR);
        let name = values.last().expect("chain is never empty").to_string();

        let group = groups.entry(key).or_insert_with(|| Group {
            name,
            count: 0,
            sum_lng: 0.0,
            sum_lat: 0.0,
        });
        group.count += 1;
        group.sum_lng += lng;
        group.sum_lat += lat;
    }

    groups
        .into_iter()
        .map(|(key, group)| AggregatedPoint {
            name: group.name,
            key,
            count: group.count,
            lng: group.sum_lng / group.count as f64,
            lat: group.sum_lat / group.count as f64,
            level,
        })
        .collect()
}

/// String values of the chain properties; `None` if any is null, missing,
/// or not a string.
fn chain_values<'a>(properties: &'a JsonObject, chain: &[&str]) -> Option<Vec<&'a str>> {
    chain
        .iter()
        .map(|key| properties.get(*key).and_then(|v| v.as_str()))
        .collect()
}
