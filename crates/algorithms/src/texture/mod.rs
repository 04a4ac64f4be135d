//! Texture metrics
//!
//! - **Quantization**: reflectance to 64 grey levels
//! - **GLCM**: grey-level co-occurrence over a 3x3 window, 4 directions
//! - **Combined metric**: per-band statistic averaged over the 10 m bands

mod combined;
mod glcm;

pub use combined::{combined_texture, TEXTURE_BANDS};
pub use glcm::{glcm_texture, quantize, Glcm, TextureMetric, GLCM_RADIUS, QUANTIZATION_LEVELS};
