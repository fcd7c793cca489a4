//! Durable per-layer feature storage with derived bounding boxes.
//!
//! The store owns all feature data. Ingest happens once, at startup or
//! offline; after the load phase nothing mutates, so serve-time reads need
//! no locking. Ids are assigned by insertion order within a layer and
//! survive across chunked `load` calls, which keeps peak memory bounded
//! when importing layers with hundreds of thousands of features.

use crate::error::{AtlasError, Result};
use crate::index::SpatialIndex;
use crate::schema::SchemaMapping;
use geoatlas_types::{BoundingBox, Feature, Geometry, JsonObject};
use rustc_hash::FxHashMap;

/// A raw feature handed to `load`, before validation and id assignment.
#[derive(Debug, Clone)]
pub struct IngestFeature {
    pub geometry: Geometry,
    pub properties: JsonObject,
}

/// A validated feature at rest: payload plus its derived bounding box.
#[derive(Debug, Clone)]
pub struct StoredFeature {
    pub id: u64,
    pub bbox: BoundingBox,
    pub geometry: Geometry,
    pub properties: JsonObject,
}

impl StoredFeature {
    /// Wire representation of this feature.
    pub fn to_feature(&self) -> Feature {
        Feature::new(self.id, self.geometry.clone(), self.properties.clone())
    }
}

/// Outcome of one batch ingest: invalid features never abort a layer load,
/// they are skipped and counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

impl LoadReport {
    pub fn merge(&mut self, other: LoadReport) {
        self.loaded += other.loaded;
        self.skipped += other.skipped;
    }
}

#[derive(Debug, Default)]
struct Layer {
    features: Vec<StoredFeature>,
    index: Option<SpatialIndex>,
}

/// The geometry store: named layers of features, each with its own
/// optional spatial index.
#[derive(Debug, Default)]
pub struct GeometryStore {
    layers: FxHashMap<String, Layer>,
}

impl GeometryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a layer exists, possibly empty. Ingesting into a missing
    /// layer creates it implicitly; this is for layers whose source file
    /// was absent but which must still answer queries with empty results.
    pub fn create_layer(&mut self, layer: &str) {
        self.layers.entry(layer.to_string()).or_default();
    }

    /// Ingest a batch of features into a layer.
    ///
    /// Each feature is validated (finite, in-range, correctly populated
    /// coordinates), its properties canonicalized through `schema` if one
    /// is given, and its bounding box derived. Invalid features are
    /// skipped and counted. Repeated calls append, so large imports can
    /// stream in chunks; any previously built index is dropped and must be
    /// rebuilt after the last chunk.
    pub fn load(
        &mut self,
        layer: &str,
        features: Vec<IngestFeature>,
        schema: Option<&SchemaMapping>,
    ) -> LoadReport {
        let entry = self.layers.entry(layer.to_string()).or_default();
        entry.index = None;

        let mut report = LoadReport::default();
        for mut feature in features {
            if let Err(e) = validate_geometry(&feature.geometry) {
                log::debug!("skipping feature in layer '{layer}': {e}");
                report.skipped += 1;
                continue;
            }
            // from_geometry cannot fail past validation, but stay defensive
            // against future geometry variants.
            let Some(bbox) = BoundingBox::from_geometry(&feature.geometry) else {
                report.skipped += 1;
                continue;
            };
            if let Some(schema) = schema {
                schema.canonicalize(&mut feature.properties);
            }
            let id = entry.features.len() as u64;
            entry.features.push(StoredFeature {
                id,
                bbox,
                geometry: feature.geometry,
                properties: feature.properties,
            });
            report.loaded += 1;
        }
        if report.skipped > 0 {
            log::warn!(
                "layer '{layer}': skipped {} invalid feature(s) in this batch",
                report.skipped
            );
        }
        report
    }

    /// Build (or rebuild) the layer's spatial index from all stored
    /// bounding boxes.
    pub fn build_index(&mut self, layer: &str) -> Result<()> {
        let entry = self
            .layers
            .get_mut(layer)
            .ok_or_else(|| AtlasError::unknown_layer(layer))?;
        entry.index = Some(SpatialIndex::build(
            entry.features.iter().map(|f| (f.id, f.bbox)),
        ));
        Ok(())
    }

    /// Features whose bounding box intersects `bbox`, in id order.
    pub fn query(&self, layer: &str, bbox: &BoundingBox) -> Result<Vec<&StoredFeature>> {
        let entry = self
            .layers
            .get(layer)
            .ok_or_else(|| AtlasError::unknown_layer(layer))?;
        let index = entry
            .index
            .as_ref()
            .ok_or_else(|| AtlasError::IndexNotBuilt(layer.to_string()))?;
        Ok(index
            .query(bbox)
            .into_iter()
            .map(|id| &entry.features[id as usize])
            .collect())
    }

    pub fn get_by_id(&self, layer: &str, id: u64) -> Result<&StoredFeature> {
        self.layers
            .get(layer)
            .ok_or_else(|| AtlasError::unknown_layer(layer))?
            .features
            .get(id as usize)
            .ok_or_else(|| AtlasError::not_found(layer, id))
    }

    /// The full feature set of a layer. Only sensible for small layers
    /// such as boundaries.
    pub fn get_all(&self, layer: &str) -> Result<&[StoredFeature]> {
        self.layers
            .get(layer)
            .map(|entry| entry.features.as_slice())
            .ok_or_else(|| AtlasError::unknown_layer(layer))
    }

    /// Feature count of a layer, zero if the layer does not exist.
    pub fn len(&self, layer: &str) -> usize {
        self.layers.get(layer).map_or(0, |entry| entry.features.len())
    }

    pub fn has_layer(&self, layer: &str) -> bool {
        self.layers.contains_key(layer)
    }
}

/// Ingest-time validation: coordinates must be present, finite, and within
/// WGS84 range. Wrong nesting is already rejected when the tagged geometry
/// deserializes.
fn validate_geometry(geometry: &Geometry) -> Result<()> {
    if geometry.is_empty() {
        return Err(AtlasError::Ingest("empty coordinates".to_string()));
    }
    match geometry {
        Geometry::LineString(line) if line.len() < 2 => {
            return Err(AtlasError::Ingest(
                "LineString needs at least 2 positions".to_string(),
            ));
        }
        Geometry::Polygon(rings) => validate_rings(rings)?,
        Geometry::MultiPolygon(polys) => {
            for rings in polys {
                validate_rings(rings)?;
            }
        }
        _ => {}
    }

    let mut error = None;
    geometry.for_each_position(|[x, y]| {
        if error.is_some() {
            return;
        }
        if !x.is_finite() || !y.is_finite() {
            error = Some("non-finite coordinate".to_string());
        } else if !(-180.0..=180.0).contains(&x) {
            error = Some(format!("longitude {x} out of [-180, 180]"));
        } else if !(-90.0..=90.0).contains(&y) {
            error = Some(format!("latitude {y} out of [-90, 90]"));
        }
    });
    match error {
        Some(e) => Err(AtlasError::Ingest(e)),
        None => Ok(()),
    }
}

fn validate_rings(rings: &[Vec<geoatlas_types::Position>]) -> Result<()> {
    for ring in rings {
        if ring.len() < 4 {
            return Err(AtlasError::Ingest(
                "polygon ring needs at least 4 positions".to_string(),
            ));
        }
    }
    Ok(())
}
