//! Band math
//!
//! Element-wise functions over one raster or a pair of rasters. Masked
//! (`NaN`) input cells stay masked in the output.

use super::indices::check_dimensions;
use crate::maybe_rayon::*;
use rubblescan_core::raster::Raster;
use rubblescan_core::Result;

/// Binary operations for band math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandMathOp {
    Add,
    Divide,
    /// `|a - b|`
    AbsDifference,
}

impl BandMathOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BandMathOp::Add => a + b,
            BandMathOp::Divide => {
                if b.abs() < 1e-10 {
                    f64::NAN
                } else {
                    a / b
                }
            }
            BandMathOp::AbsDifference => (a - b).abs(),
        }
    }
}

/// Apply a unary function to every defined cell of a raster.
///
/// ```ignore
/// let reflectance = band_math(&b4, |dn| dn / 10_000.0)?;
/// ```
pub fn band_math<F>(raster: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let val = unsafe { raster.get_unchecked(row, col) };
                if !raster.is_nodata(val) {
                    *out = f(val);
                }
            }
            row_data
        })
        .collect();

    raster.derive(data, Some(f64::NAN))
}

/// Apply a binary operation between two rasters element-wise.
///
/// Both rasters must have the same dimensions. A masked cell in either
/// input gives a masked output cell.
pub fn band_math_binary(a: &Raster<f64>, b: &Raster<f64>, op: BandMathOp) -> Result<Raster<f64>> {
    check_dimensions(a, b)?;

    let (rows, cols) = a.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let va = unsafe { a.get_unchecked(row, col) };
                let vb = unsafe { b.get_unchecked(row, col) };

                if a.is_nodata(va) || b.is_nodata(vb) {
                    continue;
                }
                *out = op.apply(va, vb);
            }
            row_data
        })
        .collect();

    a.derive(data, Some(f64::NAN))
}
