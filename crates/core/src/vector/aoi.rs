//! Area of interest
//!
//! Every query is constrained by a closed lon/lat polygon. Closure is
//! checked when the AOI is built, so downstream code never sees an open ring.

use crate::error::{Error, Result};
use geo::{Area, BoundingRect, Intersects};
use geo_types::{Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

/// Axis-aligned lon/lat bounding box `[west, south, east, north]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self { west, south, east, north }
    }

    /// Build from a `[west, south, east, north]` slice
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match values {
            [w, s, e, n] if w <= e && s <= n => Ok(Self::new(*w, *s, *e, *n)),
            _ => Err(Error::InvalidGeometry(format!(
                "bbox must be [west, south, east, north], got {:?}",
                values
            ))),
        }
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.west <= other.east
            && self.east >= other.west
            && self.south <= other.north
            && self.north >= other.south
    }

    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }
}

/// A closed lon/lat polygon constraining all spatial queries
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOfInterest {
    polygon: Polygon<f64>,
    bounds: BBox,
}

impl AreaOfInterest {
    /// Build an AOI from a closed ring (first vertex equals last).
    pub fn new(vertices: &[[f64; 2]]) -> Result<Self> {
        if vertices.len() < 4 {
            return Err(Error::InvalidGeometry(format!(
                "AOI needs at least 4 vertices including the closing one, got {}",
                vertices.len()
            )));
        }
        if vertices.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::InvalidGeometry("AOI has non-finite coordinates".into()));
        }
        let (first, last) = (vertices[0], vertices[vertices.len() - 1]);
        if first != last {
            return Err(Error::InvalidGeometry(format!(
                "AOI ring is not closed: first vertex {:?} != last vertex {:?}",
                first, last
            )));
        }

        let ring: LineString<f64> = vertices
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect();
        let polygon = Polygon::new(ring, vec![]);

        let rect = polygon
            .bounding_rect()
            .ok_or_else(|| Error::InvalidGeometry("AOI has no extent".into()))?;
        let bounds = BBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(Error::InvalidGeometry("AOI is degenerate (zero area)".into()));
        }

        Ok(Self { polygon, bounds })
    }

    /// Build an AOI from an open ring, appending the first vertex to close it.
    pub fn from_open_ring(vertices: &[[f64; 2]]) -> Result<Self> {
        let mut closed = vertices.to_vec();
        if let (Some(&first), Some(&last)) = (vertices.first(), vertices.last()) {
            if first != last {
                closed.push(first);
            }
        }
        Self::new(&closed)
    }

    /// Parse `"lon,lat;lon,lat;..."`, closing the ring if needed.
    pub fn parse(text: &str) -> Result<Self> {
        let vertices = text
            .split(';')
            .filter(|pair| !pair.trim().is_empty())
            .map(|pair| {
                let parts: Vec<&str> = pair.split(',').map(str::trim).collect();
                match parts.as_slice() {
                    [lon, lat] => {
                        let lon = lon.parse::<f64>();
                        let lat = lat.parse::<f64>();
                        match (lon, lat) {
                            (Ok(lon), Ok(lat)) => Ok([lon, lat]),
                            _ => Err(Error::InvalidGeometry(format!("bad vertex '{}'", pair))),
                        }
                    }
                    _ => Err(Error::InvalidGeometry(format!(
                        "vertex must be 'lon,lat', got '{}'",
                        pair
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_open_ring(&vertices)
    }

    /// Bounding box of the polygon
    pub fn bounds(&self) -> BBox {
        self.bounds
    }

    /// Whether a lon/lat point lies inside the polygon or on its boundary
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.bounds.contains_point(lon, lat) && self.polygon.intersects(&Point::new(lon, lat))
    }

    /// Whether a polygon touches or overlaps the AOI
    pub fn intersects(&self, other: &Polygon<f64>) -> bool {
        self.polygon.intersects(other)
    }

    /// Planar area in square degrees
    pub fn area_deg2(&self) -> f64 {
        self.polygon.unsigned_area()
    }

    /// Closed ring vertices
    pub fn vertices(&self) -> Vec<[f64; 2]> {
        self.polygon.exterior().coords().map(|c| [c.x, c.y]).collect()
    }

    pub fn as_polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<[f64; 2]> {
        vec![[34.44, 31.49], [34.50, 31.49], [34.50, 31.54], [34.44, 31.54], [34.44, 31.49]]
    }

    #[test]
    fn closed_ring_is_accepted() {
        let aoi = AreaOfInterest::new(&square()).unwrap();
        let b = aoi.bounds();
        assert_relative_eq!(b.west, 34.44);
        assert_relative_eq!(b.north, 31.54);
        assert_relative_eq!(aoi.area_deg2(), 0.06 * 0.05, epsilon = 1e-12);
    }

    #[test]
    fn open_ring_is_rejected() {
        let mut open = square();
        open.pop();
        match AreaOfInterest::new(&open) {
            Err(Error::InvalidGeometry(msg)) => assert!(msg.contains("not closed")),
            other => panic!("expected InvalidGeometry, got {:?}", other),
        }
    }

    #[test]
    fn open_ring_can_be_closed_explicitly() {
        let mut open = square();
        open.pop();
        let aoi = AreaOfInterest::from_open_ring(&open).unwrap();
        let v = aoi.vertices();
        assert_eq!(v.first(), v.last());
    }

    #[test]
    fn degenerate_rings_are_rejected() {
        assert!(AreaOfInterest::new(&[[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]).is_err());
        assert!(AreaOfInterest::new(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [0.0, 0.0]]).is_err());
        assert!(AreaOfInterest::new(&[[0.0, 0.0], [f64::NAN, 0.0], [1.0, 1.0], [0.0, 0.0]]).is_err());
    }

    #[test]
    fn contains_point() {
        let aoi = AreaOfInterest::new(&square()).unwrap();
        assert!(aoi.contains(34.47, 31.51));
        assert!(!aoi.contains(34.60, 31.51));
    }

    #[test]
    fn parse_vertex_list() {
        let aoi = AreaOfInterest::parse("32.50,15.57; 32.58,15.57; 32.58,15.63; 32.50,15.63").unwrap();
        assert_eq!(aoi.vertices().len(), 5);
        assert!(AreaOfInterest::parse("32.50;15.57").is_err());
    }

    #[test]
    fn bbox_intersection() {
        let a = BBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(a.intersects(&BBox::new(0.5, 0.5, 2.0, 2.0)));
        assert!(!a.intersects(&BBox::new(1.5, 1.5, 2.0, 2.0)));
        assert!(BBox::from_slice(&[1.0, 0.0, 0.0, 1.0]).is_err());
    }
}
