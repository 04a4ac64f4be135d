//! Imagery preparation
//!
//! - Spectral index: NDVI from the red and near-infrared bands
//! - Cloud/vegetation keep-mask from the SCL classification and NDVI
//! - Reflectance scaling from sensor digital numbers
//! - Band math: element-wise functions over one or two rasters

mod band_math;
mod indices;
mod mask;

pub use band_math::{band_math, band_math_binary, BandMathOp};
pub use indices::{ndvi, normalized_difference};
pub use mask::{
    apply_mask, cloud_vegetation_mask, mask_and_scale, scale_reflectance, MaskParams,
    NDVI_THRESHOLD, REFLECTANCE_SCALE, SCL_KEEP_CLASSES,
};
