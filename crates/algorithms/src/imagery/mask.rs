//! Cloud and vegetation masking
//!
//! A pixel is kept only if its Scene Classification Layer code is one of
//! vegetation (4), not-vegetated (5) or water (6), and its NDVI is below
//! 0.2. Everything else (cloud, shadow, cirrus, snow, saturated, no-data
//! and vegetated pixels) is masked so that phenology and weather do not
//! show up as texture change.

use super::band_math::band_math;
use super::indices::{check_dimensions, ndvi};
use crate::maybe_rayon::*;
use rubblescan_core::raster::Raster;
use rubblescan_core::{BandStack, Error, Result};
use tracing::debug;

/// SCL classes that are kept
pub const SCL_KEEP_CLASSES: [u8; 3] = [4, 5, 6];

/// Pixels with NDVI at or above this value are treated as vegetation
pub const NDVI_THRESHOLD: f64 = 0.2;

/// Sentinel-2 L2A digital number to surface reflectance
pub const REFLECTANCE_SCALE: f64 = 1.0 / 10_000.0;

/// Parameters for cloud/vegetation masking and scaling
#[derive(Debug, Clone, PartialEq)]
pub struct MaskParams {
    /// Name of the classification band
    pub scl_band: String,
    /// Name of the red band
    pub red_band: String,
    /// Name of the near-infrared band
    pub nir_band: String,
    /// SCL codes to keep
    pub keep_classes: Vec<u8>,
    /// Strict upper bound on NDVI for kept pixels
    pub ndvi_threshold: f64,
    /// Multiplier applied to reflectance bands after masking
    pub scale: f64,
    /// Bands that carry reflectance and are scaled
    pub reflectance_bands: Vec<String>,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            scl_band: "SCL".into(),
            red_band: "B4".into(),
            nir_band: "B8".into(),
            keep_classes: SCL_KEEP_CLASSES.to_vec(),
            ndvi_threshold: NDVI_THRESHOLD,
            scale: REFLECTANCE_SCALE,
            reflectance_bands: ["B2", "B3", "B4", "B8"].map(String::from).to_vec(),
        }
    }
}

/// Build the keep-mask for one image.
///
/// Returns a `Raster<u8>` that is 1 where the pixel is kept and 0 where it
/// is masked. Undefined SCL or NDVI values are masked.
pub fn cloud_vegetation_mask(stack: &BandStack, params: &MaskParams) -> Result<Raster<u8>> {
    let scl = stack.band(&params.scl_band)?;
    let red = stack.band(&params.red_band)?;
    let nir = stack.band(&params.nir_band)?;
    check_dimensions(scl, red)?;

    let index = ndvi(nir, red)?;
    let (rows, cols) = scl.shape();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let class = unsafe { scl.get_unchecked(row, col) };
                let v = unsafe { index.get_unchecked(row, col) };
                if keep_pixel(class, v, params) {
                    *out = 1;
                }
            }
            row_data
        })
        .collect();

    let mask = scl.derive(data, None)?;
    debug!(
        kept = mask.data().iter().filter(|&&m| m == 1).count(),
        total = mask.len(),
        "cloud/vegetation mask"
    );
    Ok(mask)
}

/// Per-pixel keep rule: SCL in the keep set AND NDVI below the threshold
fn keep_pixel(scl: f64, ndvi: f64, params: &MaskParams) -> bool {
    if scl.is_nan() || ndvi.is_nan() || scl.fract() != 0.0 {
        return false;
    }
    let class_ok = params
        .keep_classes
        .iter()
        .any(|&c| f64::from(c) == scl);
    class_ok && ndvi < params.ndvi_threshold
}

/// Mask every band of a stack where the keep-mask is 0.
///
/// Masked pixels become `NaN` rather than zero so that reducers skip them.
pub fn apply_mask(stack: &BandStack, mask: &Raster<u8>) -> Result<BandStack> {
    let mut out = stack.clone();
    for (name, raster) in out.iter_mut() {
        if raster.shape() != mask.shape() {
            return Err(Error::Algorithm(format!(
                "mask is {}x{} but band {} is {}x{}",
                mask.cols(),
                mask.rows(),
                name,
                raster.cols(),
                raster.rows()
            )));
        }
        raster.data_mut().zip_mut_with(mask.data(), |v, &keep| {
            if keep == 0 {
                *v = f64::NAN;
            }
        });
        raster.set_nodata(Some(f64::NAN));
    }
    Ok(out)
}

/// Multiply the given bands by `scale`, leaving the others untouched
pub fn scale_reflectance(stack: &BandStack, bands: &[String], scale: f64) -> Result<BandStack> {
    let mut out = stack.clone();
    for name in bands {
        let scaled = band_math(stack.band(name)?, |v| v * scale)?;
        out.insert(name.as_str(), scaled)?;
    }
    Ok(out)
}

/// Mask clouds and vegetation, then convert digital numbers to reflectance
pub fn mask_and_scale(stack: &BandStack, params: &MaskParams) -> Result<BandStack> {
    let mask = cloud_vegetation_mask(stack, params)?;
    let masked = apply_mask(stack, &mask)?;
    scale_reflectance(&masked, &params.reflectance_bands, params.scale)
}
