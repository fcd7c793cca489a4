//! End-to-end engine pipeline: ingest, index, aggregate, tile, query.

use geoatlas::aggregate::{AggregateSet, AggregationLevel};
use geoatlas::query::{LAYER_BOUNDARIES, LAYER_CELLS, LAYER_CITIES, LAYER_POIS, QueryService};
use geoatlas::schema::SchemaMapping;
use geoatlas::store::{GeometryStore, IngestFeature};
use geoatlas::tile::{TileIndex, TileOptions};
use geoatlas::{AppConfig, AtlasError, BoundingBox, Geometry};
use rustc_hash::FxHashMap;
use serde_json::json;

fn square(x: f64, y: f64, size: f64, props: serde_json::Value) -> IngestFeature {
    IngestFeature {
        geometry: Geometry::Polygon(vec![vec![
            [x, y],
            [x + size, y],
            [x + size, y + size],
            [x, y + size],
            [x, y],
        ]]),
        properties: props.as_object().unwrap().clone(),
    }
}

fn point(lng: f64, lat: f64, props: serde_json::Value) -> IngestFeature {
    IngestFeature {
        geometry: Geometry::Point([lng, lat]),
        properties: props.as_object().unwrap().clone(),
    }
}

/// The full startup pipeline over a small realistic dataset.
fn build_service() -> QueryService {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut store = GeometryStore::new();
    store.create_layer(LAYER_BOUNDARIES);

    store.load(
        LAYER_CITIES,
        vec![
            square(115.5, 39.5, 1.5, json!({"City_name_CN": "Beijing"})),
            square(120.8, 30.7, 1.2, json!({"city": "Shanghai"})),
        ],
        Some(&SchemaMapping::cities()),
    );

    store.load(
        LAYER_CELLS,
        vec![
            square(116.30, 39.90, 0.01, json!({"wpop_change": -0.12, "pop6-11_change": 0.05})),
            square(116.31, 39.90, 0.01, json!({"wpop_change": 0.08})),
            square(121.45, 31.20, 0.01, json!({"wpop_change": 0.31})),
        ],
        Some(&SchemaMapping::cells()),
    );

    store.load(
        LAYER_POIS,
        vec![
            point(116.32, 39.98, json!({"name": "School A", "province": "Beijing", "city": "Beijing", "district": "Haidian"})),
            point(116.34, 39.96, json!({"name": "School B", "province": "Beijing", "city": "Beijing", "district": "Haidian"})),
            point(116.45, 39.92, json!({"name": "School C", "province": "Beijing", "city": "Beijing", "district": "Chaoyang"})),
            point(121.50, 31.22, json!({"name": "School D", "province": "Shanghai", "city": "Shanghai", "district": "Pudong"})),
        ],
        None,
    );

    for layer in [LAYER_CITIES, LAYER_CELLS, LAYER_POIS] {
        store.build_index(layer).unwrap();
    }

    let aggregates =
        AggregateSet::build(store.get_all(LAYER_POIS).unwrap(), &AggregationLevel::ALL);

    let mut tiles = FxHashMap::default();
    for layer in [LAYER_CELLS, LAYER_POIS] {
        tiles.insert(
            layer.to_string(),
            TileIndex::build(store.get_all(layer).unwrap(), TileOptions::default()),
        );
    }

    QueryService::new(store, aggregates, tiles, AppConfig::default())
}

#[test]
fn cities_filter_by_viewport() {
    let service = build_service();

    let beijing = BoundingBox::new(115.0, 39.0, 117.5, 41.0);
    let fc = service.cities(Some(&beijing)).unwrap();
    assert_eq!(fc.len(), 1);
    // Alias canonicalized at ingest.
    assert_eq!(fc.features[0].properties["name"], "Beijing");

    let pacific = BoundingBox::new(-160.0, 10.0, -150.0, 20.0);
    assert!(service.cities(Some(&pacific)).unwrap().is_empty());
}

#[test]
fn cells_zoom_gating_and_schema() {
    let service = build_service();
    let viewport = BoundingBox::new(116.0, 39.5, 117.0, 40.5);

    assert!(service.cells(Some(&viewport), 7).unwrap().is_empty());

    let fc = service.cells(Some(&viewport), 10).unwrap();
    assert_eq!(fc.len(), 2);
    let with_pop = fc
        .features
        .iter()
        .find(|f| f.properties.contains_key("pop_6_11_change"))
        .expect("canonicalized cell property");
    assert!(!with_pop.properties.contains_key("pop6-11_change"));

    assert!(matches!(
        service.cells(None, 10),
        Err(AtlasError::BadRequest(_))
    ));
}

#[test]
fn cell_by_id_round_trip_and_miss() {
    let service = build_service();
    let fc = service.cell_by_id(0).unwrap();
    assert_eq!(fc.len(), 1);
    assert!(matches!(
        service.cell_by_id(1000),
        Err(AtlasError::NotFound(_))
    ));
}

#[test]
fn cell_by_id_on_empty_store_is_not_found() {
    let mut store = GeometryStore::new();
    store.create_layer(LAYER_CELLS);
    let service = QueryService::new(
        store,
        AggregateSet::default(),
        FxHashMap::default(),
        AppConfig::default(),
    );
    assert!(matches!(
        service.cell_by_id(0),
        Err(AtlasError::NotFound(_))
    ));
}

#[test]
fn poi_aggregation_example() {
    let service = build_service();

    let provinces = service.pois_aggregated("province").unwrap();
    assert_eq!(provinces.len(), 2);
    let beijing = provinces
        .features
        .iter()
        .find(|f| f.properties["key"] == "Beijing")
        .unwrap();
    assert_eq!(beijing.properties["count"], 3);
    let Geometry::Point([lng, lat]) = beijing.geometry else {
        panic!("cluster must be a point");
    };
    // Centroid of the three Beijing schools.
    assert!((lng - (116.32 + 116.34 + 116.45) / 3.0).abs() < 1e-9);
    assert!((lat - (39.98 + 39.96 + 39.92) / 3.0).abs() < 1e-9);

    let districts = service.pois_aggregated("district").unwrap();
    assert!(districts
        .features
        .iter()
        .any(|f| f.properties["key"] == "Beijing:Beijing:Haidian"
            && f.properties["count"] == 2));
}

#[test]
fn pois_detail_zoom_serves_raw_points() {
    let service = build_service();
    let viewport = BoundingBox::new(116.0, 39.5, 117.0, 40.5);

    assert!(service.pois(Some(&viewport), 11).unwrap().is_empty());
    let fc = service.pois(Some(&viewport), 14).unwrap();
    assert_eq!(fc.len(), 3);
    assert!(fc.features.iter().all(|f| f.properties.contains_key("name")));
}

#[test]
fn tiles_cover_only_their_extent() {
    let service = build_service();

    // Every cell geometry served from a tile must lie near that tile's
    // geographic footprint (within the clip buffer).
    let z = 10u8;
    let z2 = f64::from(1u32 << z);
    // Tile containing the Beijing cells at lng 116.30-116.32.
    let (tx, ty) = (842u32, 388u32);
    let fc = service.tile(LAYER_CELLS, z, tx, ty).unwrap();
    assert!(!fc.is_empty());

    let west = (f64::from(tx) / z2 - 0.5) * 360.0;
    let east = ((f64::from(tx) + 1.0) / z2 - 0.5) * 360.0;
    let margin = 360.0 / z2 * (64.0 / 4096.0);
    for feature in &fc.features {
        let Geometry::Polygon(rings) = &feature.geometry else {
            panic!("cell tiles hold polygons");
        };
        for p in rings.iter().flatten() {
            assert!(p[0] >= west - margin - 1e-9 && p[0] <= east + margin + 1e-9);
        }
    }
}

#[test]
fn tile_unknown_layer_is_not_found() {
    let service = build_service();
    assert!(matches!(
        service.tile(LAYER_BOUNDARIES, 0, 0, 0),
        Err(AtlasError::NotFound(_))
    ));
}
