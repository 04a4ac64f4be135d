//! Band-averaged texture metric

use super::glcm::{glcm_texture, TextureMetric};
use crate::imagery::{band_math, band_math_binary, BandMathOp};
use rubblescan_core::raster::Raster;
use rubblescan_core::{BandStack, Error, Result};
use tracing::debug;

/// Sentinel-2 10 m bands the texture is averaged over: blue, green, red, NIR
pub const TEXTURE_BANDS: [&str; 4] = ["B2", "B3", "B4", "B8"];

/// Arithmetic mean of a per-band GLCM statistic over `bands`.
///
/// A pixel masked in any band is masked in the result. The stack is
/// expected to hold reflectance in `[0, 1]` (masked and scaled).
pub fn combined_texture(
    stack: &BandStack,
    bands: &[&str],
    metric: TextureMetric,
) -> Result<Raster<f64>> {
    let (first, rest) = bands.split_first().ok_or_else(|| Error::InvalidParameter {
        name: "bands",
        value: "[]".into(),
        reason: "at least one band is required".into(),
    })?;

    let mut sum = glcm_texture(stack.band(first)?, metric)?;
    for band in rest {
        let layer = glcm_texture(stack.band(band)?, metric)?;
        sum = band_math_binary(&sum, &layer, BandMathOp::Add)?;
    }

    let n = bands.len() as f64;
    let mean = band_math(&sum, |v| v / n)?;
    debug!(
        metric = metric.combined_name(),
        bands = bands.len(),
        valid = mean.valid_count(),
        "combined texture"
    );
    Ok(mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stripes(size: usize, high: f64) -> Raster<f64> {
        let mut r = Raster::new(size, size);
        for row in 0..size {
            for col in 0..size {
                r.set(row, col, if col % 2 == 0 { 0.0 } else { high }).unwrap();
            }
        }
        r
    }

    #[test]
    fn mean_over_exactly_the_four_bands() {
        // Per-band dissimilarity at the centre is 0.75 * jump in levels
        let stack = BandStack::from_bands([
            ("B2", stripes(5, 4.5 / 64.0)),
            ("B3", stripes(5, 8.5 / 64.0)),
            ("B4", Raster::filled(5, 5, 0.1)),
            ("B8", stripes(5, 16.5 / 64.0)),
            // Not part of the average; would shift it if included
            ("B11", stripes(5, 60.5 / 64.0)),
        ])
        .unwrap();

        let out = combined_texture(&stack, &TEXTURE_BANDS, TextureMetric::Dissimilarity).unwrap();
        let expected = (0.75 * 4.0 + 0.75 * 8.0 + 0.0 + 0.75 * 16.0) / 4.0;
        assert_relative_eq!(out.get(2, 2).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn masked_in_one_band_masks_result() {
        let mut b8 = Raster::filled(4, 4, 0.2);
        b8.set(1, 1, f64::NAN).unwrap();
        let stack = BandStack::from_bands([
            ("B2", Raster::filled(4, 4, 0.2)),
            ("B3", Raster::filled(4, 4, 0.2)),
            ("B4", Raster::filled(4, 4, 0.2)),
            ("B8", b8),
        ])
        .unwrap();

        let out = combined_texture(&stack, &TEXTURE_BANDS, TextureMetric::Homogeneity).unwrap();
        assert!(out.get(1, 1).unwrap().is_nan());
        assert_relative_eq!(out.get(3, 3).unwrap(), 1.0);
    }

    #[test]
    fn missing_band_and_empty_list_are_errors() {
        let stack = BandStack::from_bands([("B2", Raster::filled(3, 3, 0.2))]).unwrap();
        assert!(matches!(
            combined_texture(&stack, &TEXTURE_BANDS, TextureMetric::Homogeneity),
            Err(Error::MissingBand(_))
        ));
        assert!(combined_texture(&stack, &[], TextureMetric::Homogeneity).is_err());
    }
}
