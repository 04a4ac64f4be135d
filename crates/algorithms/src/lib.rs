//! # Rubblescan Algorithms
//!
//! Per-pixel processing for the damage-indicator pipeline.
//!
//! - **imagery**: NDVI, SCL/NDVI keep-mask, reflectance scaling, band math
//! - **texture**: 64-level quantization, GLCM homogeneity/dissimilarity, band-averaged metrics
//! - **change**: absolute difference between epochs and summary statistics
//! - **footprints**: building footprint selection and rasterization over an AOI

pub mod change;
pub mod footprints;
pub mod imagery;
pub mod texture;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::change::{absolute_difference, change_summary, ChangeSummary};
    pub use crate::footprints::{footprints_in_aoi, rasterize_footprints};
    pub use crate::imagery::{
        apply_mask, cloud_vegetation_mask, mask_and_scale, ndvi, scale_reflectance, MaskParams,
    };
    pub use crate::texture::{
        combined_texture, glcm_texture, quantize, TextureMetric, QUANTIZATION_LEVELS,
        TEXTURE_BANDS,
    };
    pub use rubblescan_core::prelude::*;
}
