//! The (bbox, zoom) query contract over all loaded layers.
//!
//! `QueryService` is the one context object the serving layer talks to. It
//! is assembled once at startup from the loaded store, the precomputed
//! aggregations, and the tile indexes, and is read-only from then on, so a
//! shared reference can be handed to every request handler.

use crate::aggregate::{AggregateSet, AggregationLevel};
use crate::config::AppConfig;
use crate::error::{AtlasError, Result};
use crate::store::GeometryStore;
use crate::tile::{self, TileIndex};
use geoatlas_types::{BoundingBox, FeatureCollection};
use rustc_hash::FxHashMap;

pub const LAYER_BOUNDARIES: &str = "boundaries";
pub const LAYER_CITIES: &str = "cities";
pub const LAYER_CELLS: &str = "cells";
pub const LAYER_POIS: &str = "pois";

#[derive(Debug)]
pub struct QueryService {
    store: GeometryStore,
    aggregates: AggregateSet,
    tiles: FxHashMap<String, TileIndex>,
    config: AppConfig,
}

impl QueryService {
    pub fn new(
        store: GeometryStore,
        aggregates: AggregateSet,
        tiles: FxHashMap<String, TileIndex>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            aggregates,
            tiles,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Feature count of a layer, for health reporting.
    pub fn layer_len(&self, layer: &str) -> usize {
        self.store.len(layer)
    }

    /// The full boundary layer. Small, never filtered.
    pub fn boundaries(&self) -> Result<FeatureCollection> {
        Ok(self
            .store
            .get_all(LAYER_BOUNDARIES)?
            .iter()
            .map(|f| f.to_feature())
            .collect())
    }

    /// City boundaries, index-filtered when a viewport is given.
    pub fn cities(&self, bbox: Option<&BoundingBox>) -> Result<FeatureCollection> {
        match bbox {
            Some(bbox) => Ok(self
                .store
                .query(LAYER_CITIES, bbox)?
                .into_iter()
                .map(|f| f.to_feature())
                .collect()),
            None => Ok(self
                .store
                .get_all(LAYER_CITIES)?
                .iter()
                .map(|f| f.to_feature())
                .collect()),
        }
    }

    /// Grid cells in the viewport.
    ///
    /// Below `show_cells` the answer is always empty, no bbox required.
    /// At or above it the layer is too large to serve whole, so a missing
    /// viewport is rejected rather than answered with everything.
    pub fn cells(&self, bbox: Option<&BoundingBox>, zoom: u8) -> Result<FeatureCollection> {
        if zoom < self.config.zoom_config.show_cells {
            return Ok(FeatureCollection::empty());
        }
        let bbox = bbox.ok_or_else(|| {
            AtlasError::BadRequest("bbox is required at cell display zoom".to_string())
        })?;
        Ok(self
            .store
            .query(LAYER_CELLS, bbox)?
            .into_iter()
            .map(|f| f.to_feature())
            .collect())
    }

    pub fn cell_by_id(&self, id: u64) -> Result<FeatureCollection> {
        let feature = self.store.get_by_id(LAYER_CELLS, id)?;
        Ok(FeatureCollection::new(vec![feature.to_feature()]))
    }

    /// Raw POIs in the viewport, served only at detail zoom and above;
    /// below that clients use `pois_aggregated`.
    pub fn pois(&self, bbox: Option<&BoundingBox>, zoom: u8) -> Result<FeatureCollection> {
        if zoom < self.config.zoom_config.poi_levels.detail {
            return Ok(FeatureCollection::empty());
        }
        let bbox = bbox.ok_or_else(|| {
            AtlasError::BadRequest("bbox is required at POI detail zoom".to_string())
        })?;
        Ok(self
            .store
            .query(LAYER_POIS, bbox)?
            .into_iter()
            .map(|f| f.to_feature())
            .collect())
    }

    /// Precomputed POI cluster centroids at one administrative level.
    pub fn pois_aggregated(&self, level: &str) -> Result<FeatureCollection> {
        let level = AggregationLevel::parse(level).ok_or_else(|| {
            AtlasError::BadRequest(format!(
                "unknown aggregation level '{level}', expected province, city, or district"
            ))
        })?;
        Ok(self.aggregates.to_feature_collection(level))
    }

    /// One vector tile of a tiled layer, as WGS84 GeoJSON features. A tile
    /// with nothing in it is an empty collection, not an error.
    pub fn tile(&self, layer: &str, z: u8, x: u32, y: u32) -> Result<FeatureCollection> {
        let index = self
            .tiles
            .get(layer)
            .ok_or_else(|| AtlasError::NotFound(format!("layer '{layer}' is not tiled")))?;
        Ok(match index.get_tile(z, x, y) {
            Some(features) => FeatureCollection::new(tile::to_features(&features)),
            None => FeatureCollection::empty(),
        })
    }
}
