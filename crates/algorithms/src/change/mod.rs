//! Change detection between two epochs
//!
//! The damage indicator is the raw magnitude `|pre - post|` of a texture
//! metric. There is no normalization and no significance test; large
//! values are candidate damage, to be read alongside the imagery because
//! residual seasonal or cloud effects can also produce them.

use crate::imagery::{band_math_binary, BandMathOp};
use rubblescan_core::raster::Raster;
use rubblescan_core::Result;

/// Absolute pixel-wise difference between two rasters of the same metric.
///
/// Symmetric in its arguments. A pixel masked in either epoch is masked.
pub fn absolute_difference(pre: &Raster<f64>, post: &Raster<f64>) -> Result<Raster<f64>> {
    band_math_binary(pre, post, BandMathOp::AbsDifference)
}

/// Summary of a difference raster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeSummary {
    /// Number of defined pixels
    pub valid: usize,
    /// Total number of pixels
    pub total: usize,
    /// Mean difference over defined pixels
    pub mean: Option<f64>,
    /// Largest difference
    pub max: Option<f64>,
    /// Threshold used for `above`
    pub threshold: f64,
    /// Number of defined pixels strictly above `threshold`
    pub above: usize,
}

impl ChangeSummary {
    /// Share of defined pixels above the threshold
    pub fn fraction_above(&self) -> f64 {
        if self.valid == 0 {
            0.0
        } else {
            self.above as f64 / self.valid as f64
        }
    }
}

/// Summarize a difference raster against a display threshold
pub fn change_summary(diff: &Raster<f64>, threshold: f64) -> ChangeSummary {
    let stats = diff.statistics();
    let above = diff
        .data()
        .iter()
        .filter(|&&v| !diff.is_nodata(v) && v > threshold)
        .count();
    ChangeSummary {
        valid: stats.valid_count,
        total: diff.len(),
        mean: stats.mean,
        max: stats.max,
        threshold,
        above,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rubblescan_core::{Error, GeoTransform};

    #[test]
    fn difference_is_absolute_and_symmetric() {
        let pre = Raster::from_vec(vec![0.9, 0.4, 0.5, f64::NAN], 2, 2).unwrap();
        let post = Raster::from_vec(vec![0.6, 0.7, 0.5, 0.1], 2, 2).unwrap();

        let forward = absolute_difference(&pre, &post).unwrap();
        let backward = absolute_difference(&post, &pre).unwrap();

        assert_relative_eq!(forward.get(0, 0).unwrap(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(forward.get(0, 1).unwrap(), 0.3, epsilon = 1e-12);
        assert_eq!(forward.get(1, 0).unwrap(), 0.0);
        assert!(forward.get(1, 1).unwrap().is_nan());

        for row in 0..2 {
            for col in 0..2 {
                let (f, b) = (forward.get(row, col).unwrap(), backward.get(row, col).unwrap());
                assert!(f == b || (f.is_nan() && b.is_nan()));
            }
        }
    }

    #[test]
    fn shapes_must_match() {
        let a: Raster<f64> = Raster::new(2, 2);
        let b: Raster<f64> = Raster::new(3, 2);
        assert!(matches!(absolute_difference(&a, &b), Err(Error::SizeMismatch { .. })));
    }

    #[test]
    fn shifted_grids_are_rejected() {
        let mut pre = Raster::filled(6, 6, 0.5);
        pre.set_transform(GeoTransform::from_bounds(0.0, 0.0, 0.006, 0.006, 6, 6));
        let mut post = Raster::filled(6, 6, 0.5);
        post.set_transform(GeoTransform::from_bounds(0.003, 0.0, 0.009, 0.006, 6, 6));

        assert!(matches!(absolute_difference(&pre, &post), Err(Error::GridMismatch(_))));
    }

    #[test]
    fn summary_counts_pixels_above_threshold() {
        let diff = Raster::from_vec(vec![0.1, 0.3, 0.5, f64::NAN], 2, 2).unwrap();
        let s = change_summary(&diff, 0.27);
        assert_eq!(s.valid, 3);
        assert_eq!(s.total, 4);
        assert_eq!(s.above, 2);
        assert_relative_eq!(s.mean.unwrap(), 0.3, epsilon = 1e-12);
        assert_eq!(s.max, Some(0.5));
        assert_relative_eq!(s.fraction_above(), 2.0 / 3.0);
    }
}
