//! Axis-aligned clipping of projected tile features.
//!
//! Tiles are cut by clipping twice per subdivision: once along x, once
//! along y, each time to the slab `k1 <= coord[axis] <= k2` in projected
//! [0,1] units. Lines may split into multiple parts; polygon rings go
//! through Sutherland-Hodgman against the two half-planes. There is no
//! simplification pass.

use super::{TileFeature, TileGeomType};
use geoatlas_types::Position;

/// Clip a feature set to a slab along one axis (0 = x, 1 = y).
pub(super) fn clip(features: &[TileFeature], axis: usize, k1: f64, k2: f64) -> Vec<TileFeature> {
    let mut out = Vec::new();
    for feature in features {
        let fmin = feature.min[axis];
        let fmax = feature.max[axis];
        if fmin > k2 || fmax < k1 {
            continue;
        }
        if fmin >= k1 && fmax <= k2 {
            out.push(feature.clone());
            continue;
        }
        let rings = match feature.kind {
            TileGeomType::Point => clip_points(&feature.rings, axis, k1, k2),
            TileGeomType::Line => feature
                .rings
                .iter()
                .flat_map(|line| clip_line(line, axis, k1, k2))
                .collect(),
            TileGeomType::Polygon => feature
                .rings
                .iter()
                .filter_map(|ring| clip_ring(ring, axis, k1, k2))
                .collect(),
        };
        if let Some(clipped) = TileFeature::new(feature.kind, rings, feature.tags.clone()) {
            out.push(clipped);
        }
    }
    out
}

fn clip_points(rings: &[Vec<Position>], axis: usize, k1: f64, k2: f64) -> Vec<Vec<Position>> {
    rings
        .iter()
        .flatten()
        .filter(|p| p[axis] >= k1 && p[axis] <= k2)
        .map(|p| vec![*p])
        .collect()
}

/// Clip one line to the slab, splitting it into parts where it leaves.
fn clip_line(line: &[Position], axis: usize, k1: f64, k2: f64) -> Vec<Vec<Position>> {
    let mut parts: Vec<Vec<Position>> = Vec::new();
    let mut part: Vec<Position> = Vec::new();

    for segment in line.windows(2) {
        let (a, b) = (segment[0], segment[1]);
        let (av, bv) = (a[axis], b[axis]);

        if (av < k1 && bv < k1) || (av > k2 && bv > k2) {
            if part.len() >= 2 {
                parts.push(std::mem::take(&mut part));
            } else {
                part.clear();
            }
            continue;
        }

        let mut ca = a;
        if av < k1 {
            ca = intersect(a, b, axis, k1);
        } else if av > k2 {
            ca = intersect(a, b, axis, k2);
        }
        let mut cb = b;
        if bv < k1 {
            cb = intersect(a, b, axis, k1);
        } else if bv > k2 {
            cb = intersect(a, b, axis, k2);
        }

        match part.last() {
            None => part.push(ca),
            Some(last) if *last != ca => {
                if part.len() >= 2 {
                    parts.push(std::mem::take(&mut part));
                } else {
                    part.clear();
                }
                part.push(ca);
            }
            _ => {}
        }
        part.push(cb);

        // Exited the slab: this part is finished.
        if cb != b {
            if part.len() >= 2 {
                parts.push(std::mem::take(&mut part));
            } else {
                part.clear();
            }
        }
    }
    if part.len() >= 2 {
        parts.push(part);
    }
    parts
}

/// Sutherland-Hodgman: clip a ring against `>= k1` then `<= k2`.
fn clip_ring(ring: &[Position], axis: usize, k1: f64, k2: f64) -> Option<Vec<Position>> {
    // Work on the open ring; the closing point is re-added at the end.
    let open = match ring.split_last() {
        Some((last, rest)) if !rest.is_empty() && last == &rest[0] => rest,
        _ => ring,
    };
    let lower = clip_ring_half(open, axis, k1, true);
    let mut clipped = clip_ring_half(&lower, axis, k2, false);
    if clipped.len() < 3 {
        return None;
    }
    let first = clipped[0];
    clipped.push(first);
    Some(clipped)
}

fn clip_ring_half(ring: &[Position], axis: usize, k: f64, keep_greater: bool) -> Vec<Position> {
    let inside = |p: &Position| {
        if keep_greater {
            p[axis] >= k
        } else {
            p[axis] <= k
        }
    };
    let mut out = Vec::with_capacity(ring.len() + 2);
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        if inside(&b) {
            if !inside(&a) {
                out.push(intersect(a, b, axis, k));
            }
            out.push(b);
        } else if inside(&a) {
            out.push(intersect(a, b, axis, k));
        }
    }
    out
}

/// Point where segment a->b crosses the boundary `coord[axis] == k`.
fn intersect(a: Position, b: Position, axis: usize, k: f64) -> Position {
    let t = (k - a[axis]) / (b[axis] - a[axis]);
    let other = 1 - axis;
    let mut p = [0.0; 2];
    p[axis] = k;
    p[other] = a[other] + (b[other] - a[other]) * t;
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoatlas_types::JsonObject;

    fn feature(kind: TileGeomType, rings: Vec<Vec<Position>>) -> TileFeature {
        TileFeature::new(kind, rings, JsonObject::new()).unwrap()
    }

    #[test]
    fn test_points_filtered_by_slab() {
        let f = feature(
            TileGeomType::Point,
            vec![vec![[0.1, 0.5]], vec![[0.4, 0.5]], vec![[0.9, 0.5]]],
        );
        let out = clip(&[f], 0, 0.25, 0.75);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rings, vec![vec![[0.4, 0.5]]]);
    }

    #[test]
    fn test_fully_inside_passes_through() {
        let f = feature(TileGeomType::Line, vec![vec![[0.3, 0.3], [0.4, 0.4]]]);
        let out = clip(&[f.clone()], 0, 0.0, 1.0);
        assert_eq!(out[0].rings, f.rings);
    }

    #[test]
    fn test_fully_outside_dropped() {
        let f = feature(TileGeomType::Line, vec![vec![[0.8, 0.3], [0.9, 0.4]]]);
        assert!(clip(&[f], 0, 0.0, 0.5).is_empty());
    }

    #[test]
    fn test_line_split_into_parts() {
        // Crosses the slab [0.25, 0.75], leaves, and comes back.
        let f = feature(
            TileGeomType::Line,
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 0.1], [0.0, 0.1]]],
        );
        let out = clip(&[f], 0, 0.25, 0.75);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rings.len(), 2);
        for part in &out[0].rings {
            for p in part {
                assert!(p[0] >= 0.25 && p[0] <= 0.75);
            }
        }
    }

    #[test]
    fn test_polygon_clipped_to_slab() {
        let f = feature(
            TileGeomType::Polygon,
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]],
        );
        let out = clip(&[f], 0, 0.25, 0.75);
        assert_eq!(out.len(), 1);
        let ring = &out[0].rings[0];
        assert!(ring.len() >= 4);
        assert_eq!(ring.first(), ring.last());
        for p in ring {
            assert!(p[0] >= 0.25 && p[0] <= 0.75);
        }
    }

    #[test]
    fn test_polygon_outside_slab_dropped() {
        let f = feature(
            TileGeomType::Polygon,
            vec![vec![[0.0, 0.0], [0.1, 0.0], [0.1, 0.1], [0.0, 0.1], [0.0, 0.0]]],
        );
        assert!(clip(&[f], 0, 0.5, 0.9).is_empty());
    }
}
