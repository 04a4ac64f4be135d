//! GeoTIFF reading and writing
//!
//! Scenes are stored one band per file. Only the subset of GeoTIFF needed
//! here is handled: pixel scale + tiepoint georeferencing, the EPSG code from
//! the GeoKey directory and the GDAL no-data tag.

mod native;

pub use native::{
    read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer,
};
