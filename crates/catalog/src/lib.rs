//! # Rubblescan Catalog
//!
//! Local stand-in for a hosted image collection. A JSON manifest lists
//! scenes with their acquisition time, footprint bbox and one GeoTIFF per
//! band. Collections are filtered by date range and AOI bounds without
//! touching pixels; pixels are only read when a mosaic is requested.
//!
//! ```ignore
//! use rubblescan_catalog::{DateRange, ImageCollection};
//!
//! let pre = ImageCollection::open("scenes/catalog.json")?
//!     .filter_date(&DateRange::parse("2023-09-01", "2023-10-01")?)
//!     .filter_bounds(&aoi)
//!     .mosaic(&["B2", "B3", "B4", "B8", "SCL"])?;
//! ```

pub mod collection;
pub mod dates;
pub mod error;
pub mod manifest;

pub use collection::{clip_to_aoi, ImageCollection, Scene, SceneData};
pub use dates::DateRange;
pub use error::{CatalogError, Result};
pub use manifest::{CatalogManifest, ManifestScene};

/// Sentinel-2 surface-reflectance collection the presets are tuned for
pub const SENTINEL2_SR: &str = "COPERNICUS/S2_SR_HARMONIZED";
