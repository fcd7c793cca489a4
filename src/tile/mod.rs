//! On-demand z/x/y vector-tile slicing with a compute-once cache.
//!
//! A `TileIndex` projects a layer into [0,1] web-mercator space once,
//! pre-subdivides it down to `index_max_zoom` (deeper where a tile still
//! holds more than `index_max_points` coordinates), and derives any other
//! tile lazily by clipping down from the nearest built ancestor. Built
//! tiles are immutable and cached forever; the source layer cannot change
//! at serve time, so a full rebuild is the only invalidation.
//!
//! Internally features carry the classic numeric geometry codes
//! (1 = Point, 2 = LineString, 3 = Polygon); they are mapped back to named
//! GeoJSON geometry, in WGS84, at the serving boundary.

mod clip;

use crate::store::StoredFeature;
use geoatlas_types::{Feature, Geometry, JsonObject, Position};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::f64::consts::PI;
use std::sync::Arc;

/// Tiling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileOptions {
    /// Deepest zoom tiles are generated for; requests below reuse the
    /// deepest data.
    pub max_zoom: u8,
    /// Zoom up to which the layer is subdivided eagerly at build time.
    pub index_max_zoom: u8,
    /// Coordinate budget above which a tile is subdivided past
    /// `index_max_zoom` anyway.
    pub index_max_points: usize,
    /// Tile extent in internal pixel units; the buffer is relative to it.
    pub extent: u16,
    /// Clip buffer around each tile in extent units, so features straddling
    /// an edge render without seams.
    pub buffer: u16,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            max_zoom: 20,
            index_max_zoom: 5,
            index_max_points: 100_000,
            extent: 4096,
            buffer: 64,
        }
    }
}

/// Internal geometry type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileGeomType {
    Point = 1,
    Line = 2,
    Polygon = 3,
}

impl TileGeomType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// A feature in projected tile space.
///
/// `rings` is interpreted per kind: for points, one single-coordinate ring
/// per point; for lines, one ring per part; for polygons, the ring list
/// (shells of a MultiPolygon are flattened in, matching the tile format).
#[derive(Debug, Clone)]
pub struct TileFeature {
    pub kind: TileGeomType,
    pub rings: Vec<Vec<Position>>,
    pub tags: JsonObject,
    pub(crate) min: Position,
    pub(crate) max: Position,
}

impl TileFeature {
    /// Build a tile feature, computing its projected bounds. `None` if no
    /// coordinates remain.
    pub(crate) fn new(
        kind: TileGeomType,
        rings: Vec<Vec<Position>>,
        tags: JsonObject,
    ) -> Option<Self> {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for p in rings.iter().flatten() {
            for axis in 0..2 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        if min[0] > max[0] {
            return None;
        }
        Some(Self {
            kind,
            rings,
            tags,
            min,
            max,
        })
    }

    pub fn num_points(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }
}

/// Project WGS84 degrees into [0,1] web-mercator space.
pub(crate) fn project(lng: f64, lat: f64) -> Position {
    let x = lng / 360.0 + 0.5;
    let sin = lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    [x, y.clamp(0.0, 1.0)]
}

/// Inverse of `project`.
pub(crate) fn unproject(p: Position) -> Position {
    let lng = (p[0] - 0.5) * 360.0;
    let lat = (PI * (1.0 - 2.0 * p[1])).sinh().atan().to_degrees();
    [lng, lat]
}

fn project_feature(feature: &StoredFeature) -> Option<TileFeature> {
    let project_line = |line: &[Position]| line.iter().map(|&[x, y]| project(x, y)).collect();
    let (kind, rings): (TileGeomType, Vec<Vec<Position>>) = match &feature.geometry {
        Geometry::Point([x, y]) => (TileGeomType::Point, vec![vec![project(*x, *y)]]),
        Geometry::LineString(line) => (TileGeomType::Line, vec![project_line(line)]),
        Geometry::Polygon(rings) => (
            TileGeomType::Polygon,
            rings.iter().map(|r| project_line(r)).collect(),
        ),
        Geometry::MultiPolygon(polys) => (
            TileGeomType::Polygon,
            polys
                .iter()
                .flat_map(|rings| rings.iter().map(|r| project_line(r)))
                .collect(),
        ),
    };
    TileFeature::new(kind, rings, feature.properties.clone())
}

type TileKey = (u8, u32, u32);

#[derive(Debug, Clone)]
struct TileSlot {
    features: Arc<Vec<TileFeature>>,
}

/// Multi-resolution tile index over one layer.
#[derive(Debug)]
pub struct TileIndex {
    opts: TileOptions,
    tiles: RwLock<FxHashMap<TileKey, TileSlot>>,
}

impl TileIndex {
    /// Project the layer and pre-subdivide it.
    pub fn build(features: &[StoredFeature], opts: TileOptions) -> Self {
        let projected: Vec<TileFeature> = features.iter().filter_map(project_feature).collect();
        let index = Self {
            opts,
            tiles: RwLock::new(FxHashMap::default()),
        };
        {
            let mut tiles = index.tiles.write();
            let mut stack: Vec<(TileKey, Vec<TileFeature>)> = vec![((0, 0, 0), projected)];
            while let Some((key, features)) = stack.pop() {
                let (z, x, y) = key;
                let num_points: usize = features.iter().map(TileFeature::num_points).sum();
                let subdivide = !features.is_empty()
                    && z < opts.max_zoom
                    && (z < opts.index_max_zoom || num_points > opts.index_max_points);
                let slot = TileSlot {
                    features: Arc::new(features),
                };
                if subdivide {
                    for (cx, cy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                        let child = (z + 1, 2 * x + cx, 2 * y + cy);
                        let clipped = index.clip_to_tile(&slot.features, child);
                        if !clipped.is_empty() {
                            stack.push((child, clipped));
                        }
                    }
                }
                tiles.insert(key, slot);
            }
        }
        index
    }

    /// Fetch (building on demand) the tile at z/x/y.
    ///
    /// Out-of-range coordinates return `None`, never an error. Requests
    /// deeper than `max_zoom` are answered with the deepest generated
    /// data. Memoized per key: concurrent requests for the same missing
    /// tile serialize on the write lock and all but the first hit the
    /// cache.
    pub fn get_tile(&self, z: u8, x: u32, y: u32) -> Option<Arc<Vec<TileFeature>>> {
        let (z, x, y) = if z > self.opts.max_zoom {
            let shift = z - self.opts.max_zoom;
            if shift >= 32 {
                return None;
            }
            (self.opts.max_zoom, x >> shift, y >> shift)
        } else {
            (z, x, y)
        };
        let z2 = 1u64 << z;
        if u64::from(x) >= z2 || u64::from(y) >= z2 {
            return None;
        }

        if let Some(slot) = self.tiles.read().get(&(z, x, y)) {
            return nonempty(slot);
        }

        let mut tiles = self.tiles.write();
        if let Some(slot) = tiles.get(&(z, x, y)) {
            return nonempty(slot);
        }

        // Walk up to the nearest built ancestor, then clip back down the
        // path, caching every intermediate tile.
        let (mut az, mut ax, mut ay) = (z, x, y);
        while az > 0 && !tiles.contains_key(&(az, ax, ay)) {
            az -= 1;
            ax >>= 1;
            ay >>= 1;
        }
        tiles.get(&(az, ax, ay))?;

        for level in (az + 1)..=z {
            let shift = z - level;
            let (cx, cy) = (x >> shift, y >> shift);
            let parent = tiles
                .get(&(level - 1, cx >> 1, cy >> 1))
                .expect("parent built on previous step")
                .clone();
            let clipped = self.clip_to_tile(&parent.features, (level, cx, cy));
            tiles.insert(
                (level, cx, cy),
                TileSlot {
                    features: Arc::new(clipped),
                },
            );
        }
        tiles.get(&(z, x, y)).and_then(nonempty)
    }

    fn clip_to_tile(&self, features: &[TileFeature], (z, x, y): TileKey) -> Vec<TileFeature> {
        let z2 = (1u64 << z) as f64;
        let buf = f64::from(self.opts.buffer) / f64::from(self.opts.extent);
        let clipped_x = clip::clip(
            features,
            0,
            (f64::from(x) - buf) / z2,
            (f64::from(x) + 1.0 + buf) / z2,
        );
        clip::clip(
            &clipped_x,
            1,
            (f64::from(y) - buf) / z2,
            (f64::from(y) + 1.0 + buf) / z2,
        )
    }

    pub fn options(&self) -> &TileOptions {
        &self.opts
    }
}

fn nonempty(slot: &TileSlot) -> Option<Arc<Vec<TileFeature>>> {
    if slot.features.is_empty() {
        None
    } else {
        Some(slot.features.clone())
    }
}

/// Map tile features back to named GeoJSON geometry in WGS84.
///
/// Line features clipped into several parts become one LineString feature
/// per part; point features one Point per coordinate; polygon rings stay
/// together as one Polygon.
pub fn to_features(features: &[TileFeature]) -> Vec<Feature> {
    let unproject_ring = |ring: &Vec<Position>| -> Vec<Position> {
        ring.iter().map(|&p| unproject(p)).collect()
    };
    let mut out = Vec::new();
    for feature in features {
        match feature.kind {
            TileGeomType::Point => {
                for ring in &feature.rings {
                    for &p in ring {
                        out.push(Feature::without_id(
                            Geometry::Point(unproject(p)),
                            feature.tags.clone(),
                        ));
                    }
                }
            }
            TileGeomType::Line => {
                for part in &feature.rings {
                    out.push(Feature::without_id(
                        Geometry::LineString(unproject_ring(part)),
                        feature.tags.clone(),
                    ));
                }
            }
            TileGeomType::Polygon => {
                out.push(Feature::without_id(
                    Geometry::Polygon(feature.rings.iter().map(unproject_ring).collect()),
                    feature.tags.clone(),
                ));
            }
        }
    }
    out
}
