//! In-process geospatial query engine: layered feature storage, R-tree
//! viewport filtering, hierarchical POI aggregation, and lazy vector-tile
//! slicing.
//!
//! ```rust
//! use geoatlas::{GeometryStore, IngestFeature};
//! use geoatlas_types::{BoundingBox, Geometry, JsonObject};
//!
//! let mut store = GeometryStore::new();
//! store.load(
//!     "pois",
//!     vec![IngestFeature {
//!         geometry: Geometry::Point([116.4, 39.9]),
//!         properties: JsonObject::new(),
//!     }],
//!     None,
//! );
//! store.build_index("pois")?;
//!
//! let viewport = BoundingBox::new(116.0, 39.0, 117.0, 40.0);
//! let hits = store.query("pois", &viewport)?;
//! assert_eq!(hits.len(), 1);
//! # Ok::<(), geoatlas::AtlasError>(())
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod index;
pub mod query;
pub mod schema;
pub mod store;
pub mod tile;

pub use aggregate::{AggregateSet, AggregatedPoint, AggregationLevel};
pub use config::{AppConfig, DisplayField, PoiLevels, ZoomConfig};
pub use error::{AtlasError, Result};
pub use index::SpatialIndex;
pub use query::QueryService;
pub use schema::SchemaMapping;
pub use store::{GeometryStore, IngestFeature, LoadReport, StoredFeature};
pub use tile::{TileFeature, TileIndex, TileOptions};

pub use geoatlas_types::{BoundingBox, Feature, FeatureCollection, Geometry, JsonObject};
