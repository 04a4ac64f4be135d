//! # Rubblescan Core
//!
//! Shared types and I/O for the rubblescan damage-indicator workspace.
//!
//! This crate provides:
//! - `Raster<T>`: generic georeferenced grid, `NaN` marks masked cells in `f64` rasters
//! - `BandStack`: named bands of one multi-band scene on a common grid
//! - `AreaOfInterest`: closed lon/lat polygon that constrains every query
//! - `FeatureCollection`: polygon footprints read from GeoJSON
//! - GeoTIFF reading and writing

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{BandStack, GeoTransform, Raster, RasterElement};
pub use vector::{AreaOfInterest, BBox, Feature, FeatureCollection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{BandStack, GeoTransform, Raster, RasterElement};
    pub use crate::vector::{AreaOfInterest, BBox};
}
