//! Geographic primitives.
//!
//! Positions are WGS84 degrees. The directions service and GeoJSON both
//! order coordinates `lng,lat`; `Position` keeps the named fields so the
//! order only matters at those two edges.

use geo::{BoundingRect, Coord, Haversine, Length, LineString};
use serde::{Deserialize, Serialize};

/// A geographic coordinate chosen by the user or reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Shift by the same number of degrees on both axes.
    pub fn offset(self, delta_deg: f64) -> Self {
        Self {
            lat: self.lat + delta_deg,
            lng: self.lng + delta_deg,
        }
    }

    /// Build from a GeoJSON position (`[lng, lat, ...]`).
    pub fn from_lng_lat(coords: &[f64]) -> Option<Self> {
        match coords {
            [lng, lat, ..] => Some(Self::new(*lat, *lng)),
            _ => None,
        }
    }

    pub fn to_lng_lat(self) -> Vec<f64> {
        vec![self.lng, self.lat]
    }

    /// `lng,lat` as used in a directions request path.
    pub fn to_coord_pair(self) -> String {
        format!("{},{}", format_degrees(self.lng), format_degrees(self.lat))
    }
}

impl From<Position> for Coord<f64> {
    fn from(p: Position) -> Self {
        Coord { x: p.lng, y: p.lat }
    }
}

/// Join positions into the `lng,lat;lng,lat` path segment.
pub fn coordinate_string(positions: &[Position]) -> String {
    positions
        .iter()
        .map(|p| p.to_coord_pair())
        .collect::<Vec<_>>()
        .join(";")
}

/// Plain decimal with at least one fractional digit, never exponent form.
fn format_degrees(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || !value.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    /// Bounding box of a path, or None for an empty path.
    pub fn of(path: &[Position]) -> Option<Self> {
        let line: LineString<f64> = path.iter().map(|p| Coord::from(*p)).collect();
        line.bounding_rect().map(|rect| Bounds {
            west: rect.min().x,
            south: rect.min().y,
            east: rect.max().x,
            north: rect.max().y,
        })
    }

    /// GeoJSON bbox order: `[west, south, east, north]`.
    pub fn to_bbox(self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
}

/// Great-circle length of a path in meters.
pub fn path_length(points: &[Position]) -> f64 {
    let line: LineString<f64> = points.iter().map(|p| Coord::from(*p)).collect();
    Haversine.length(&line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_string_orders_lng_first() {
        let path = [Position::new(35.0, 139.0), Position::new(35.1, 139.1)];
        assert_eq!(coordinate_string(&path), "139.0,35.0;139.1,35.1");
    }

    #[test]
    fn coordinate_string_keeps_precision() {
        let path = [Position::new(35.6809591, 139.7673068)];
        assert_eq!(coordinate_string(&path), "139.7673068,35.6809591");
    }

    #[test]
    fn format_degrees_never_uses_exponent() {
        assert_eq!(format_degrees(0.00000001), "0.00000001");
        assert_eq!(format_degrees(-12.0), "-12.0");
    }

    #[test]
    fn from_lng_lat_swaps_axes() {
        let p = Position::from_lng_lat(&[139.0, 35.0]).unwrap();
        assert_eq!(p, Position::new(35.0, 139.0));
        assert!(Position::from_lng_lat(&[139.0]).is_none());
    }

    #[test]
    fn bounds_cover_all_points() {
        let path = [
            Position::new(35.0, 139.0),
            Position::new(35.2, 139.05),
            Position::new(35.1, 139.1),
        ];
        let b = Bounds::of(&path).unwrap();
        assert_eq!(b.to_bbox(), [139.0, 35.0, 139.1, 35.2]);
    }

    #[test]
    fn bounds_of_empty_path() {
        assert!(Bounds::of(&[]).is_none());
    }

    #[test]
    fn path_length_between_stations() {
        let tokyo = Position::new(35.6809591, 139.7673068);
        let shinjuku = Position::new(35.6896, 139.7006);
        let len = path_length(&[tokyo, shinjuku]);
        assert!((5_500.0..6_700.0).contains(&len), "got {len:.0} m");
    }

    #[test]
    fn path_length_along_equator() {
        let path = [
            Position::new(0.0, 0.0),
            Position::new(0.0, 1.0),
            Position::new(0.0, 2.0),
        ];
        let len = path_length(&path);
        assert!((222_000.0..223_000.0).contains(&len), "got {len:.0} m");
    }

    #[test]
    fn path_length_of_single_point_is_zero() {
        assert_eq!(path_length(&[Position::new(35.0, 139.0)]), 0.0);
    }
}
