use serde::{Deserialize, Serialize};

/// A `[longitude, latitude]` pair in WGS84 degrees.
pub type Position = [f64; 2];

/// Feature geometry as a tagged union with explicitly typed coordinate
/// nesting.
///
/// The serde representation is exact GeoJSON: `{"type": "Point",
/// "coordinates": [lng, lat]}` and so on. Deserializing rejects wrongly
/// nested coordinates up front, so downstream code never branches on
/// coordinate depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// GeoJSON type name of this geometry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// True if the geometry carries no coordinates at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(_) => false,
            Geometry::LineString(line) => line.is_empty(),
            Geometry::Polygon(rings) => rings.iter().all(|r| r.is_empty()),
            Geometry::MultiPolygon(polys) => {
                polys.iter().all(|p| p.iter().all(|r| r.is_empty()))
            }
        }
    }

    /// Visit every coordinate pair in the geometry.
    pub fn for_each_position<F: FnMut(Position)>(&self, mut f: F) {
        match self {
            Geometry::Point(p) => f(*p),
            Geometry::LineString(line) => line.iter().copied().for_each(f),
            Geometry::Polygon(rings) => {
                rings.iter().flatten().copied().for_each(f);
            }
            Geometry::MultiPolygon(polys) => {
                polys.iter().flatten().flatten().copied().for_each(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_serializes_as_geojson() {
        let geom = Geometry::Point([116.4, 39.9]);
        let json = serde_json::to_value(&geom).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "Point", "coordinates": [116.4, 39.9]})
        );
    }

    #[test]
    fn test_polygon_roundtrip() {
        let json = r#"{"type":"Polygon","coordinates":[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]]}"#;
        let geom: Geometry = serde_json::from_str(json).unwrap();
        assert_eq!(geom.type_name(), "Polygon");
        let back = serde_json::to_string(&geom).unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn test_wrong_nesting_rejected() {
        // Polygon coordinates given with LineString nesting.
        let json = r#"{"type":"Polygon","coordinates":[[0.0,0.0],[1.0,1.0]]}"#;
        assert!(serde_json::from_str::<Geometry>(json).is_err());
    }

    #[test]
    fn test_for_each_position_counts() {
        let geom = Geometry::MultiPolygon(vec![
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
            vec![vec![[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 5.0]]],
        ]);
        let mut n = 0;
        geom.for_each_position(|_| n += 1);
        assert_eq!(n, 8);
    }

    #[test]
    fn test_empty_geometry() {
        assert!(Geometry::LineString(vec![]).is_empty());
        assert!(Geometry::Polygon(vec![]).is_empty());
        assert!(!Geometry::Point([0.0, 0.0]).is_empty());
    }
}
