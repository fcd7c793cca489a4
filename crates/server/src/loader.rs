//! One-time startup ingest: GeoJSON files on disk to a ready `QueryService`.

use anyhow::Context;
use geoatlas::aggregate::{AggregateSet, AggregationLevel};
use geoatlas::query::{LAYER_BOUNDARIES, LAYER_CELLS, LAYER_CITIES, LAYER_POIS, QueryService};
use geoatlas::schema::SchemaMapping;
use geoatlas::store::{GeometryStore, IngestFeature, LoadReport};
use geoatlas::tile::{TileIndex, TileOptions};
use geoatlas::{AppConfig, AtlasError};
use geoatlas_types::Feature;
use rustc_hash::FxHashMap;
use std::path::Path;
use tracing::{info, warn};

const INGEST_CHUNK: usize = 10_000;

const LAYERS: [(&str, &str); 4] = [
    (LAYER_BOUNDARIES, "boundaries.geojson"),
    (LAYER_CITIES, "cities.geojson"),
    (LAYER_CELLS, "cells.geojson"),
    (LAYER_POIS, "pois.geojson"),
];

/// Load every layer from `data_dir`, build indexes, aggregate POIs, and
/// build tile indexes. A missing layer file is a warning and an empty
/// layer; an unreadable data dir aborts startup.
pub fn load_service(data_dir: &Path, config: AppConfig) -> anyhow::Result<QueryService> {
    if !data_dir.is_dir() {
        return Err(AtlasError::Upstream(format!(
            "data directory '{}' is not readable",
            data_dir.display()
        ))
        .into());
    }

    let mut store = GeometryStore::new();
    for (layer, file) in LAYERS {
        store.create_layer(layer);
        let path = data_dir.join(file);
        if !path.is_file() {
            warn!(layer, file, "layer file missing, serving empty layer");
            continue;
        }
        let schema = layer_schema(layer);
        let report = load_layer(&mut store, layer, &path, schema.as_ref())
            .with_context(|| format!("loading layer '{layer}' from {}", path.display()))?;
        info!(
            layer,
            loaded = report.loaded,
            skipped = report.skipped,
            "layer loaded"
        );
    }

    for (layer, _) in LAYERS {
        store.build_index(layer)?;
    }

    let aggregates =
        AggregateSet::build(store.get_all(LAYER_POIS)?, &AggregationLevel::ALL);
    for level in AggregationLevel::ALL {
        info!(
            level = level.as_str(),
            clusters = aggregates.get(level).len(),
            "aggregation ready"
        );
    }

    let mut tiles = FxHashMap::default();
    for layer in [LAYER_CELLS, LAYER_POIS] {
        tiles.insert(
            layer.to_string(),
            TileIndex::build(store.get_all(layer)?, TileOptions::default()),
        );
    }

    Ok(QueryService::new(store, aggregates, tiles, config))
}

fn layer_schema(layer: &str) -> Option<SchemaMapping> {
    match layer {
        LAYER_CELLS => Some(SchemaMapping::cells()),
        LAYER_CITIES => Some(SchemaMapping::cities()),
        _ => None,
    }
}

/// Parse one GeoJSON FeatureCollection file and ingest it in chunks.
///
/// Features are deserialized one by one so a single malformed or
/// unsupported feature is skipped without losing the rest of the file.
fn load_layer(
    store: &mut GeometryStore,
    layer: &str,
    path: &Path,
    schema: Option<&SchemaMapping>,
) -> anyhow::Result<LoadReport> {
    let raw = std::fs::read_to_string(path)?;
    let mut doc: serde_json::Value = serde_json::from_str(&raw)?;
    let features = doc
        .get_mut("features")
        .and_then(|f| f.as_array_mut())
        .context("not a GeoJSON FeatureCollection")?;

    let mut report = LoadReport::default();
    let mut chunk = Vec::with_capacity(INGEST_CHUNK);
    for value in features.drain(..) {
        match serde_json::from_value::<Feature>(value) {
            Ok(feature) => chunk.push(IngestFeature {
                geometry: feature.geometry,
                properties: feature.properties,
            }),
            Err(_) => report.skipped += 1,
        }
        if chunk.len() == INGEST_CHUNK {
            report.merge(store.load(layer, std::mem::take(&mut chunk), schema));
            info!(layer, loaded = report.loaded, "ingest progress");
        }
    }
    if !chunk.is_empty() {
        report.merge(store.load(layer, chunk, schema));
    }
    Ok(report)
}

/// Read the optional JSON config file, falling back to defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Ok(AppConfig::from_json(&raw)?)
        }
        None => Ok(AppConfig::default()),
    }
}
