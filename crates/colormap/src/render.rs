//! Raster-to-RGBA rendering.
//!
//! Buffers are `rows * cols * 4` bytes in row-major order. Masked pixels
//! are fully transparent.

use crate::error::Result;
use crate::scheme::{evaluate, Rgb};
use crate::vis::{RgbVisParams, VisParams};
use rubblescan_core::raster::Raster;
use rubblescan_core::BandStack;

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Render a single band through `vis`.
///
/// Values outside `[min, max]` clamp to the end colours.
pub fn render_single(raster: &Raster<f64>, vis: &VisParams) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(raster.len() * 4);
    for &v in raster.data().iter() {
        if raster.is_nodata(v) || !v.is_finite() {
            rgba.extend_from_slice(&TRANSPARENT);
            continue;
        }
        let Rgb { r, g, b } = evaluate(&vis.palette, vis.normalize(v));
        rgba.extend_from_slice(&[r, g, b, 255]);
    }
    rgba
}

/// Render three bands of `stack` as true colour.
///
/// A pixel is transparent when any of the three bands is masked.
pub fn render_rgb(stack: &BandStack, vis: &RgbVisParams) -> Result<Vec<u8>> {
    let [r, g, b] = &vis.bands;
    let (red, green, blue) = (stack.band(r)?, stack.band(g)?, stack.band(b)?);
    let range = vis.max - vis.min;
    let scale = |v: f64| -> u8 {
        let t = if range.abs() > f64::EPSILON {
            (v - vis.min) / range
        } else {
            0.0
        };
        (t.clamp(0.0, 1.0) * 255.0).round() as u8
    };

    let mut rgba = Vec::with_capacity(red.len() * 4);
    for ((&rv, &gv), &bv) in red.data().iter().zip(green.data().iter()).zip(blue.data().iter()) {
        if [rv, gv, bv].iter().any(|v| !v.is_finite()) {
            rgba.extend_from_slice(&TRANSPARENT);
        } else {
            rgba.extend_from_slice(&[scale(rv), scale(gv), scale(bv), 255]);
        }
    }
    Ok(rgba)
}

/// Render a 0/1 coverage mask: covered cells in `color`, others transparent.
pub fn render_mask(mask: &Raster<u8>, color: Rgb) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(mask.len() * 4);
    for &v in mask.data().iter() {
        if v > 0 {
            rgba.extend_from_slice(&[color.r, color.g, color.b, 255]);
        } else {
            rgba.extend_from_slice(&TRANSPARENT);
        }
    }
    rgba
}
