use crate::geometry::{Geometry, Position};
use geo::Rect;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A 2D axis-aligned bounding box in WGS84 degrees.
///
/// Thin wrapper around `geo::Rect` that adds derivation from feature
/// geometry and the viewport query-parameter format. Degenerate boxes
/// (`min == max`, e.g. a point feature) are valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// The underlying geometric rectangle
    pub rect: Rect,
}

impl BoundingBox {
    /// Create a bounding box from corner coordinates.
    ///
    /// Corners may be given in any order; `geo::Rect` normalizes them so
    /// the `min_x <= max_x`, `min_y <= max_y` invariant always holds.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            rect: Rect::new(
                geo::coord! { x: min_x, y: min_y },
                geo::coord! { x: max_x, y: max_y },
            ),
        }
    }

    /// Derive the box enclosing every coordinate of a geometry.
    ///
    /// Returns `None` for geometries without coordinates.
    pub fn from_geometry(geometry: &Geometry) -> Option<Self> {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        geometry.for_each_position(|[x, y]: Position| {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        });

        if min_x > max_x {
            return None;
        }
        Some(Self::new(min_x, min_y, max_x, max_y))
    }

    pub fn min_x(&self) -> f64 {
        self.rect.min().x
    }

    pub fn min_y(&self) -> f64 {
        self.rect.min().y
    }

    pub fn max_x(&self) -> f64 {
        self.rect.max().x
    }

    pub fn max_y(&self) -> f64 {
        self.rect.max().y
    }

    /// Check if a point lies within this box (boundaries inclusive).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x() && x <= self.max_x() && y >= self.min_y() && y <= self.max_y()
    }

    /// Closed-interval intersection test with another box.
    ///
    /// Touching edges count as intersecting, and degenerate boxes behave
    /// like points.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.max_x() < other.min_x()
            || self.min_x() > other.max_x()
            || self.max_y() < other.min_y()
            || self.min_y() > other.max_y())
    }
}

/// Parse the `west,south,east,north` viewport query-parameter format.
impl FromStr for BoundingBox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(format!(
                "bbox must be 'west,south,east,north', got {} values",
                parts.len()
            ));
        }
        let mut coords = [0.0f64; 4];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            let value: f64 = part
                .trim()
                .parse()
                .map_err(|_| format!("bbox component '{}' is not a number", part))?;
            if !value.is_finite() {
                return Err(format!("bbox component '{}' is not finite", part));
            }
            *slot = value;
        }
        let [west, south, east, north] = coords;
        Ok(BoundingBox::new(west, south, east, north))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_geometry_polygon() {
        let geom = Geometry::Polygon(vec![vec![
            [100.0, 10.0],
            [105.0, 10.0],
            [105.0, 15.0],
            [100.0, 10.0],
        ]]);
        let bbox = BoundingBox::from_geometry(&geom).unwrap();
        assert_eq!(bbox.min_x(), 100.0);
        assert_eq!(bbox.min_y(), 10.0);
        assert_eq!(bbox.max_x(), 105.0);
        assert_eq!(bbox.max_y(), 15.0);
    }

    #[test]
    fn test_from_geometry_point_is_degenerate() {
        let bbox = BoundingBox::from_geometry(&Geometry::Point([116.4, 39.9])).unwrap();
        assert_eq!(bbox.min_x(), bbox.max_x());
        assert_eq!(bbox.min_y(), bbox.max_y());
        assert!(bbox.min_x() <= bbox.max_x());
    }

    #[test]
    fn test_from_empty_geometry() {
        assert!(BoundingBox::from_geometry(&Geometry::LineString(vec![])).is_none());
    }

    #[test]
    fn test_intersects_touching_edges() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
        let c = BoundingBox::new(10.1, 0.0, 20.0, 10.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_degenerate_query_box() {
        let cell = BoundingBox::new(100.0, 10.0, 105.0, 15.0);
        let probe = BoundingBox::new(102.0, 12.0, 102.0, 12.0);
        assert!(cell.intersects(&probe));
        assert!(probe.intersects(&cell));
    }

    #[test]
    fn test_parse_bbox_param() {
        let bbox: BoundingBox = "110,20,120,30".parse().unwrap();
        assert_eq!(bbox.min_x(), 110.0);
        assert_eq!(bbox.min_y(), 20.0);
        assert_eq!(bbox.max_x(), 120.0);
        assert_eq!(bbox.max_y(), 30.0);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("110,20,120".parse::<BoundingBox>().is_err());
        assert!("110,20,abc,30".parse::<BoundingBox>().is_err());
        assert!("110,20,NaN,30".parse::<BoundingBox>().is_err());
        assert!("".parse::<BoundingBox>().is_err());
    }

    #[test]
    fn test_contains_point() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(bbox.contains_point(5.0, 5.0));
        assert!(bbox.contains_point(10.0, 10.0));
        assert!(!bbox.contains_point(10.5, 5.0));
    }
}
