//! Core spatial data types shared by the geoatlas engine and its server.
//!
//! Everything here serializes to plain GeoJSON, so the types double as the
//! wire format of the query service.

pub mod bbox;
pub mod feature;
pub mod geometry;

pub use bbox::BoundingBox;
pub use feature::{Feature, FeatureCollection, FeatureId};
pub use geometry::{Geometry, Position};

/// Property bag of a feature, keys are canonical after ingest.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;
