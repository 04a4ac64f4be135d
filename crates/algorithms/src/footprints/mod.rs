//! Building footprint overlay
//!
//! Footprints are read-only context: they are selected by intersection with
//! the AOI, counted and drawn over the change layers. No statistic is
//! derived from them.

use crate::maybe_rayon::*;
use geo::{BoundingRect, Intersects, Point};
use rubblescan_core::raster::Raster;
use rubblescan_core::{AreaOfInterest, Feature, FeatureCollection, Result};
use tracing::{debug, warn};

/// AOI area (square degrees) above which the footprint join gets slow.
/// About 1 km x 1 km is 0.0001 deg², so this is a city-sized box.
pub const LARGE_AOI_DEG2: f64 = 0.01;

/// Keep the footprints that touch or overlap the AOI
pub fn footprints_in_aoi(footprints: &FeatureCollection, aoi: &AreaOfInterest) -> FeatureCollection {
    if aoi.area_deg2() > LARGE_AOI_DEG2 {
        warn!(
            area_deg2 = aoi.area_deg2(),
            limit = LARGE_AOI_DEG2,
            "AOI is large; the footprint overlay may be slow or incomplete"
        );
    }

    let selected: FeatureCollection = footprints
        .iter()
        .filter(|f| f.geometry.iter().any(|poly| aoi.intersects(poly)))
        .cloned()
        .collect();
    debug!(total = footprints.len(), selected = selected.len(), "footprints in AOI");
    selected
}

/// Rasterize footprints onto the grid of `template`.
///
/// A cell is 1 when its centre lies inside (or on the edge of) a footprint.
pub fn rasterize_footprints(
    footprints: &FeatureCollection,
    template: &Raster<f64>,
) -> Result<Raster<u8>> {
    let (rows, cols) = template.shape();
    let (west, south, east, north) = template.bounds();
    let candidates: Vec<&Feature> = footprints
        .iter()
        .filter(|f| {
            f.geometry.bounding_rect().is_some_and(|r| {
                r.min().x <= east && r.max().x >= west && r.min().y <= north && r.max().y >= south
            })
        })
        .collect();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let (x, y) = template.pixel_to_geo(col, row);
                let centre = Point::new(x, y);
                if candidates.iter().any(|f| f.geometry.intersects(&centre)) {
                    *out = 1;
                }
            }
            row_data
        })
        .collect();

    template.derive(data, Some(0))
}
