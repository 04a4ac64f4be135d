//! Gray-Level Co-occurrence Matrix (GLCM) texture features
//!
//! Reflectance is quantized to exactly [`QUANTIZATION_LEVELS`] grey levels.
//! The colour ramp maxima used to display texture differences are tuned to
//! that level count, so changing it changes what the layers mean.
//!
//! For each pixel a symmetric GLCM is built per direction (0°, 45°, 90°,
//! 135°, offset 1) from the pairs inside the 3x3 window around it. Each
//! direction's matrix is normalized on its own and the statistic is
//! averaged over the directions that produced at least one pair.

use crate::maybe_rayon::*;
use rubblescan_core::raster::Raster;
use rubblescan_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Number of grey levels reflectance is quantized into
pub const QUANTIZATION_LEVELS: usize = 64;

/// Window radius in cells (3x3 neighbourhood)
pub const GLCM_RADIUS: usize = 1;

/// Direction offsets (row, col): 0°, 45°, 90°, 135°
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (-1, 1), (-1, 0), (-1, -1)];

/// Texture statistic extracted from a GLCM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureMetric {
    /// Inverse difference moment: high for uniform texture
    Homogeneity,
    /// Mean absolute grey-level difference: high for varied texture
    Dissimilarity,
}

impl TextureMetric {
    pub const ALL: [TextureMetric; 2] = [TextureMetric::Homogeneity, TextureMetric::Dissimilarity];

    pub fn name(&self) -> &'static str {
        match self {
            TextureMetric::Homogeneity => "homogeneity",
            TextureMetric::Dissimilarity => "dissimilarity",
        }
    }

    /// Name of the band-averaged raster
    pub fn combined_name(&self) -> &'static str {
        match self {
            TextureMetric::Homogeneity => "combined_homogeneity",
            TextureMetric::Dissimilarity => "combined_dissimilarity",
        }
    }
}

impl fmt::Display for TextureMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextureMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "homogeneity" | "idm" | "homog" => Ok(TextureMetric::Homogeneity),
            "dissimilarity" | "diss" => Ok(TextureMetric::Dissimilarity),
            _ => Err(Error::InvalidParameter {
                name: "metric",
                value: s.to_string(),
                reason: "expected homogeneity or dissimilarity".into(),
            }),
        }
    }
}

/// Quantize a reflectance value to a grey level.
///
/// `floor(value * 64)`, clamped to `0..=63`. Masked values give `None`.
pub fn quantize(value: f64) -> Option<u8> {
    if !value.is_finite() {
        return None;
    }
    let level = (value * QUANTIZATION_LEVELS as f64).floor();
    Some(level.clamp(0.0, (QUANTIZATION_LEVELS - 1) as f64) as u8)
}

/// Dense co-occurrence matrix that clears only the cells it touched
#[derive(Debug, Clone)]
pub struct Glcm {
    levels: usize,
    counts: Vec<f64>,
    touched: Vec<usize>,
    total: f64,
}

impl Glcm {
    pub fn new(levels: usize) -> Self {
        Self {
            levels,
            counts: vec![0.0; levels * levels],
            touched: Vec::new(),
            total: 0.0,
        }
    }

    pub fn clear(&mut self) {
        for &idx in &self.touched {
            self.counts[idx] = 0.0;
        }
        self.touched.clear();
        self.total = 0.0;
    }

    /// Count a pair in both orders
    pub fn add_pair(&mut self, i: u8, j: u8) {
        let (i, j) = (i as usize, j as usize);
        self.bump(i * self.levels + j);
        self.bump(j * self.levels + i);
        self.total += 2.0;
    }

    fn bump(&mut self, idx: usize) {
        if self.counts[idx] == 0.0 {
            self.touched.push(idx);
        }
        self.counts[idx] += 1.0;
    }

    /// Number of counted entries (twice the number of pairs)
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Normalized probability of grey levels `(i, j)`
    pub fn probability(&self, i: usize, j: usize) -> f64 {
        if self.total == 0.0 {
            return 0.0;
        }
        self.counts[i * self.levels + j] / self.total
    }

    fn weighted_sum<F: Fn(f64) -> f64>(&self, weight: F) -> f64 {
        if self.total == 0.0 {
            return f64::NAN;
        }
        self.touched
            .iter()
            .map(|&idx| {
                let (i, j) = (idx / self.levels, idx % self.levels);
                let diff = i as f64 - j as f64;
                self.counts[idx] * weight(diff)
            })
            .sum::<f64>()
            / self.total
    }

    /// Σ p(i,j) / (1 + (i - j)²)
    pub fn homogeneity(&self) -> f64 {
        self.weighted_sum(|d| 1.0 / (1.0 + d * d))
    }

    /// Σ p(i,j) · |i - j|
    pub fn dissimilarity(&self) -> f64 {
        self.weighted_sum(f64::abs)
    }

    pub fn statistic(&self, metric: TextureMetric) -> f64 {
        match metric {
            TextureMetric::Homogeneity => self.homogeneity(),
            TextureMetric::Dissimilarity => self.dissimilarity(),
        }
    }
}

/// Compute a GLCM texture statistic for every pixel of one band.
///
/// Pixels that are masked, or that have no defined neighbour pair in any
/// direction, are `NaN`.
pub fn glcm_texture(raster: &Raster<f64>, metric: TextureMetric) -> Result<Raster<f64>> {
    let (rows, cols) = raster.shape();
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions { width: cols, height: rows });
    }

    let levels: Vec<Option<u8>> = raster
        .data()
        .iter()
        .map(|&v| if raster.is_nodata(v) { None } else { quantize(v) })
        .collect();
    let level_at = |r: usize, c: usize| levels[r * cols + c];
    let radius = GLCM_RADIUS as isize;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut glcm = Glcm::new(QUANTIZATION_LEVELS);

            for (col, out) in row_data.iter_mut().enumerate() {
                if level_at(row, col).is_none() {
                    continue;
                }

                let r_lo = row.saturating_sub(GLCM_RADIUS) as isize;
                let r_hi = (row + GLCM_RADIUS).min(rows - 1) as isize;
                let c_lo = col.saturating_sub(GLCM_RADIUS) as isize;
                let c_hi = (col + GLCM_RADIUS).min(cols - 1) as isize;
                debug_assert!(r_hi - r_lo <= 2 * radius && c_hi - c_lo <= 2 * radius);

                let mut sum = 0.0;
                let mut n_dirs = 0usize;
                for &(dr, dc) in &DIRECTIONS {
                    glcm.clear();
                    for r1 in r_lo..=r_hi {
                        for c1 in c_lo..=c_hi {
                            let (r2, c2) = (r1 + dr, c1 + dc);
                            if r2 < r_lo || r2 > r_hi || c2 < c_lo || c2 > c_hi {
                                continue;
                            }
                            let a = level_at(r1 as usize, c1 as usize);
                            let b = level_at(r2 as usize, c2 as usize);
                            if let (Some(i), Some(j)) = (a, b) {
                                glcm.add_pair(i, j);
                            }
                        }
                    }
                    if glcm.total() > 0.0 {
                        sum += glcm.statistic(metric);
                        n_dirs += 1;
                    }
                }

                if n_dirs > 0 {
                    *out = sum / n_dirs as f64;
                }
            }
            row_data
        })
        .collect();

    raster.derive(data, Some(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Vertical stripes alternating between grey level 0 and 10
    fn stripes(size: usize) -> Raster<f64> {
        let mut r = Raster::new(size, size);
        for row in 0..size {
            for col in 0..size {
                let v = if col % 2 == 0 { 0.0 } else { 10.5 / 64.0 };
                r.set(row, col, v).unwrap();
            }
        }
        r
    }

    #[test]
    fn quantize_covers_0_to_63() {
        assert_eq!(quantize(0.0), Some(0));
        assert_eq!(quantize(0.0156), Some(0));
        assert_eq!(quantize(1.0 / 64.0), Some(1));
        assert_eq!(quantize(0.5), Some(32));
        assert_eq!(quantize(0.999), Some(63));
        assert_eq!(quantize(1.0), Some(63));
        assert_eq!(quantize(-0.01), Some(0));
        assert_eq!(quantize(f64::NAN), None);

        for i in 0..=1000 {
            let level = quantize(i as f64 / 1000.0).unwrap();
            assert!((level as usize) < QUANTIZATION_LEVELS);
        }
    }

    #[test]
    fn glcm_matrix_is_symmetric_and_normalized() {
        let mut g = Glcm::new(QUANTIZATION_LEVELS);
        g.add_pair(2, 5);
        g.add_pair(2, 2);
        assert_relative_eq!(g.probability(2, 5), 0.25);
        assert_relative_eq!(g.probability(5, 2), 0.25);
        assert_relative_eq!(g.probability(2, 2), 0.5);

        g.clear();
        assert_eq!(g.total(), 0.0);
        assert_eq!(g.probability(2, 5), 0.0);
        assert!(g.homogeneity().is_nan());
    }

    #[test]
    fn uniform_texture_is_fully_homogeneous() {
        let r = Raster::filled(6, 6, 0.12);
        let homog = glcm_texture(&r, TextureMetric::Homogeneity).unwrap();
        let diss = glcm_texture(&r, TextureMetric::Dissimilarity).unwrap();
        for row in 0..6 {
            for col in 0..6 {
                assert_relative_eq!(homog.get(row, col).unwrap(), 1.0);
                assert_relative_eq!(diss.get(row, col).unwrap(), 0.0);
            }
        }
    }

    #[test]
    fn stripes_average_over_directions() {
        let r = stripes(7);
        let homog = glcm_texture(&r, TextureMetric::Homogeneity).unwrap();
        let diss = glcm_texture(&r, TextureMetric::Dissimilarity).unwrap();

        // 0°, 45°, 135° see a 10-level jump on every pair, 90° sees none
        let expected_homog = (3.0 / 101.0 + 1.0) / 4.0;
        assert_relative_eq!(homog.get(3, 3).unwrap(), expected_homog, epsilon = 1e-12);
        assert_relative_eq!(diss.get(3, 3).unwrap(), 7.5, epsilon = 1e-12);
    }

    #[test]
    fn masked_pixels_stay_masked() {
        let mut r = Raster::filled(5, 5, 0.2);
        r.set(2, 2, f64::NAN).unwrap();
        let out = glcm_texture(&r, TextureMetric::Homogeneity).unwrap();
        assert!(out.get(2, 2).unwrap().is_nan());
        // Neighbours still have pairs that avoid the hole
        assert_relative_eq!(out.get(2, 1).unwrap(), 1.0);
    }

    #[test]
    fn isolated_pixel_has_no_pairs() {
        let mut r = Raster::filled(3, 3, f64::NAN);
        r.set(1, 1, 0.3).unwrap();
        let out = glcm_texture(&r, TextureMetric::Dissimilarity).unwrap();
        assert!(out.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn metric_parsing() {
        assert_eq!("Homogeneity".parse::<TextureMetric>().unwrap(), TextureMetric::Homogeneity);
        assert_eq!("diss".parse::<TextureMetric>().unwrap(), TextureMetric::Dissimilarity);
        assert!("contrast".parse::<TextureMetric>().is_err());
        assert_eq!(TextureMetric::Dissimilarity.combined_name(), "combined_dissimilarity");
    }
}
