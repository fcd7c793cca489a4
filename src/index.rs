//! Bounding-box spatial index, one per layer.
//!
//! An R-tree over feature bounding boxes answering "which features
//! intersect this box" in O(log n + k). Bbox intersection IS the
//! containment semantic here: there is no secondary exact-geometry pass,
//! so a fine-grained shape (a thin diagonal polygon, say) is returned
//! whenever its box intersects the viewport even if the geometry itself
//! does not. Callers must not rely on exact-geometry filtering.

use geoatlas_types::BoundingBox;
use rstar::{AABB, RTree, RTreeObject};

/// R-tree entry: a feature id with its bounding-box envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedBox {
    pub id: u64,
    envelope: AABB<[f64; 2]>,
}

impl IndexedBox {
    pub fn new(id: u64, bbox: &BoundingBox) -> Self {
        Self {
            id,
            envelope: AABB::from_corners(
                [bbox.min_x(), bbox.min_y()],
                [bbox.max_x(), bbox.max_y()],
            ),
        }
    }
}

impl RTreeObject for IndexedBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Per-layer bounding-box index.
///
/// Built in full after a layer loads; `insert` supports streaming imports
/// that index as they go. Immutable at serve time.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<IndexedBox>,
}

impl SpatialIndex {
    /// Create an empty index for incremental insertion.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk-load the index from every bounding box in a layer.
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u64, BoundingBox)>,
    {
        let boxes: Vec<IndexedBox> = entries
            .into_iter()
            .map(|(id, bbox)| IndexedBox::new(id, &bbox))
            .collect();
        Self {
            tree: RTree::bulk_load(boxes),
        }
    }

    /// Add a single feature, for streaming ingest.
    pub fn insert(&mut self, id: u64, bbox: &BoundingBox) {
        self.tree.insert(IndexedBox::new(id, bbox));
    }

    /// Ids of every feature whose bounding box intersects `query`
    /// (closed intervals; a degenerate query box matches point features at
    /// that exact location plus any box containing it).
    ///
    /// Results are sorted by id so repeated queries are deterministic.
    pub fn query(&self, query: &BoundingBox) -> Vec<u64> {
        let envelope = AABB::from_corners(
            [query.min_x(), query.min_y()],
            [query.max_x(), query.max_y()],
        );
        let mut ids: Vec<u64> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
