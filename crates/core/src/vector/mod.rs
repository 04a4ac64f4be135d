//! Vector types: the AOI polygon and polygon feature collections

mod aoi;
mod feature;

pub use aoi::{AreaOfInterest, BBox};
pub use feature::{AttributeValue, Feature, FeatureCollection};
