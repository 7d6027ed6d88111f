//! GeoJSON geometry handling shared by the geometry loader and the stores.
//!
//! Canonical storage happens in the database engine, which reprojects into
//! [`CANONICAL_SRID`] and repairs validity. The helpers here decode GeoJSON
//! into `geo` types so callers can inspect input validity locally and so the
//! in-memory store can keep the polygonal parts of what it is given.

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon, Validation,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// EPSG code of Irish Transverse Mercator, the frame all stored geometry uses.
pub const CANONICAL_SRID: i32 = 2157;

/// EPSG code of WGS84, the GeoJSON default.
pub const WGS84_SRID: i32 = 4326;

/// One geometry upsert, keyed by townland identity.
///
/// `geometry` is the feature's GeoJSON geometry in `source_srid`; `feature`
/// is the complete original feature kept verbatim for provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryRecord<'a> {
    /// Internal identity of the owning townland.
    pub townland_id: i64,
    /// GeoJSON geometry object as found in the feature.
    pub geometry: &'a Value,
    /// Spatial reference the coordinates are expressed in.
    pub source_srid: i32,
    /// The whole feature (id, properties, geometry).
    pub feature: &'a Value,
}

/// Errors raised when a GeoJSON geometry cannot be decoded.
#[derive(Debug, Error)]
pub enum GeometryDecodeError {
    /// The object is not a recognised GeoJSON geometry.
    #[error("unsupported GeoJSON geometry: {source}")]
    Shape {
        /// Deserialisation failure.
        #[source]
        source: serde_json::Error,
    },
    /// A position carried fewer than two ordinates.
    #[error("GeoJSON position must have at least two ordinates, found {found}")]
    ShortPosition {
        /// Number of ordinates present.
        found: usize,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Point {
        coordinates: Vec<f64>,
    },
    MultiPoint {
        coordinates: Vec<Vec<f64>>,
    },
    LineString {
        coordinates: Vec<Vec<f64>>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    GeometryCollection {
        geometries: Vec<RawGeometry>,
    },
}

impl RawGeometry {
    fn into_geo(self) -> Result<Geometry<f64>, GeometryDecodeError> {
        Ok(match self {
            Self::Point { coordinates } => Geometry::Point(Point::from(coord(&coordinates)?)),
            Self::MultiPoint { coordinates } => Geometry::MultiPoint(MultiPoint::new(
                coordinates
                    .iter()
                    .map(|position| coord(position).map(Point::from))
                    .collect::<Result<_, _>>()?,
            )),
            Self::LineString { coordinates } => Geometry::LineString(line(&coordinates)?),
            Self::MultiLineString { coordinates } => Geometry::MultiLineString(
                MultiLineString::new(coordinates.iter().map(|l| line(l)).collect::<Result<_, _>>()?),
            ),
            Self::Polygon { coordinates } => Geometry::Polygon(polygon(&coordinates)?),
            Self::MultiPolygon { coordinates } => Geometry::MultiPolygon(MultiPolygon::new(
                coordinates
                    .iter()
                    .map(|rings| polygon(rings))
                    .collect::<Result<_, _>>()?,
            )),
            Self::GeometryCollection { geometries } => {
                Geometry::GeometryCollection(GeometryCollection(
                    geometries
                        .into_iter()
                        .map(Self::into_geo)
                        .collect::<Result<Vec<_>, _>>()?,
                ))
            }
        })
    }
}

fn coord(position: &[f64]) -> Result<Coord<f64>, GeometryDecodeError> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(GeometryDecodeError::ShortPosition {
            found: position.len(),
        }),
    }
}

fn line(positions: &[Vec<f64>]) -> Result<LineString<f64>, GeometryDecodeError> {
    positions
        .iter()
        .map(|position| coord(position))
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>, GeometryDecodeError> {
    let mut decoded = rings
        .iter()
        .map(|ring| line(ring))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();
    let exterior = decoded.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Ok(Polygon::new(exterior, decoded.collect()))
}

/// Decode a GeoJSON geometry object into `geo` types.
///
/// # Examples
/// ```
/// use geo::Geometry;
/// use serde_json::json;
/// use townlands_core::geometry::decode_geojson_geometry;
///
/// let value = json!({"type": "Point", "coordinates": [-8.47, 51.9]});
/// let geometry = decode_geojson_geometry(&value)?;
/// assert!(matches!(geometry, Geometry::Point(_)));
/// # Ok::<(), townlands_core::geometry::GeometryDecodeError>(())
/// ```
pub fn decode_geojson_geometry(value: &Value) -> Result<Geometry<f64>, GeometryDecodeError> {
    RawGeometry::deserialize(value)
        .map_err(|source| GeometryDecodeError::Shape { source })?
        .into_geo()
}

/// Keep only the polygonal parts of a geometry, as a multi-polygon.
///
/// Points and lines are discarded and nested collections are flattened, so a
/// single polygon becomes a one-member multi-polygon.
#[must_use]
pub fn polygonal_parts(geometry: Geometry<f64>) -> MultiPolygon<f64> {
    let mut polygons = Vec::new();
    collect_polygons(geometry, &mut polygons);
    MultiPolygon::new(polygons)
}

fn collect_polygons(geometry: Geometry<f64>, polygons: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(polygon) => polygons.push(polygon),
        Geometry::MultiPolygon(multi) => polygons.extend(multi.0),
        Geometry::Rect(rect) => polygons.push(rect.to_polygon()),
        Geometry::Triangle(triangle) => polygons.push(triangle.to_polygon()),
        Geometry::GeometryCollection(collection) => {
            for member in collection.0 {
                collect_polygons(member, polygons);
            }
        }
        Geometry::Point(_)
        | Geometry::Line(_)
        | Geometry::LineString(_)
        | Geometry::MultiPoint(_)
        | Geometry::MultiLineString(_) => {}
    }
}

/// Report whether a geometry is valid under OGC simple-feature rules.
///
/// Self-intersecting rings, holes outside their shell and similar defects make the
/// geometry invalid; the database repairs these on write.
#[must_use]
pub fn is_valid_geometry(geometry: &Geometry<f64>) -> bool {
    geometry.is_valid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn bowtie() -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [2.0, 2.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]]]
        })
    }

    fn square() -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
        })
    }

    #[rstest]
    fn decodes_polygon_with_hole() {
        let value = json!({
            "type": "Polygon",
            "coordinates": [
                [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
                [[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 2.0], [1.0, 1.0]]
            ]
        });
        let geometry = decode_geojson_geometry(&value).expect("decode polygon");
        let Geometry::Polygon(polygon) = geometry else {
            panic!("expected polygon");
        };
        assert_eq!(polygon.interiors().len(), 1);
        assert_eq!(polygon.exterior().0.len(), 5);
    }

    #[rstest]
    fn single_polygon_becomes_multi_polygon() {
        let geometry = decode_geojson_geometry(&square()).expect("decode square");
        let multi = polygonal_parts(geometry);
        assert_eq!(multi.0.len(), 1);
    }

    #[rstest]
    fn collection_keeps_only_polygons() {
        let value = json!({
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Point", "coordinates": [0.0, 0.0]},
                {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]},
                square(),
                {"type": "MultiPolygon", "coordinates": [square()["coordinates"].clone()]}
            ]
        });
        let geometry = decode_geojson_geometry(&value).expect("decode collection");
        assert_eq!(polygonal_parts(geometry).0.len(), 2);
    }

    #[rstest]
    fn self_intersecting_polygon_is_invalid() {
        let geometry = decode_geojson_geometry(&bowtie()).expect("decode bowtie");
        assert!(!is_valid_geometry(&geometry));
    }

    #[rstest]
    fn simple_square_is_valid() {
        let geometry = decode_geojson_geometry(&square()).expect("decode square");
        assert!(is_valid_geometry(&geometry));
    }

    #[rstest]
    #[case(json!({"type": "Point", "coordinates": [1.0]}))]
    #[case(json!({"type": "Circle", "coordinates": [1.0, 2.0]}))]
    #[case(json!({"coordinates": [1.0, 2.0]}))]
    #[case(json!("Polygon"))]
    fn rejects_malformed_geometry(#[case] value: Value) {
        assert!(decode_geojson_geometry(&value).is_err());
    }

    #[rstest]
    fn third_ordinate_is_ignored() {
        let value = json!({"type": "Point", "coordinates": [1.0, 2.0, 30.0]});
        let geometry = decode_geojson_geometry(&value).expect("decode point");
        assert_eq!(geometry, Geometry::Point(Point::new(1.0, 2.0)));
    }
}
