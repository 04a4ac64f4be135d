//! Raster data structures and operations

mod bands;
mod element;
mod geotransform;
mod grid;

pub use bands::BandStack;
pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
