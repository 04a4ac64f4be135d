//! Normalized-difference spectral indices

use crate::maybe_rayon::*;
use rubblescan_core::raster::Raster;
use rubblescan_core::{Error, Result};

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Pixels where either band is masked, or where the sum is zero, are `NaN`.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;

    let (rows, cols) = band_a.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };

                if band_a.is_nodata(a) || band_b.is_nodata(b) {
                    continue;
                }

                let sum = a + b;
                if sum.abs() < 1e-10 {
                    continue;
                }

                *out = (a - b) / sum;
            }
            row_data
        })
        .collect();

    band_a.derive(data, Some(f64::NAN))
}

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
///
/// The ratio is scale-invariant, so it can be computed on raw digital
/// numbers or on reflectance with the same result.
pub fn ndvi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, red)
}

pub(crate) fn check_dimensions<T, U>(a: &Raster<T>, b: &Raster<U>) -> Result<()>
where
    T: rubblescan_core::RasterElement,
    U: rubblescan_core::RasterElement,
{
    if a.shape() != b.shape() {
        return Err(Error::SizeMismatch {
            er: a.rows(),
            ec: a.cols(),
            ar: b.rows(),
            ac: b.cols(),
        });
    }
    if !a.same_grid(b) {
        let (ta, tb) = (a.transform(), b.transform());
        return Err(Error::GridMismatch(format!(
            "origin ({}, {}) cell {} vs origin ({}, {}) cell {}",
            ta.origin_x, ta.origin_y, ta.pixel_width, tb.origin_x, tb.origin_y, tb.pixel_width
        )));
    }
    Ok(())
}
