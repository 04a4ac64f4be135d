//! # Rubblescan Colormap
//!
//! Visualization parameters and raster-to-RGBA rendering.
//!
//! A single-band layer is drawn with [`VisParams`]: values are stretched
//! linearly over `[min, max]` and looked up in an evenly spaced palette.
//! Change layers use [`vis_params`], which fixes `min = 0` and the
//! blue-white-red palette. Mosaics use [`RgbVisParams`] for true colour.
//!
//! ## Usage
//!
//! ```ignore
//! use rubblescan_colormap::{render_single, save_png, vis_params, HOMOGENEITY_DIFF_MAX};
//!
//! let vis = vis_params(HOMOGENEITY_DIFF_MAX);
//! let rgba = render_single(&diff, &vis);
//! save_png("homogeneity_difference.png", &rgba, diff.cols(), diff.rows())?;
//! ```

mod error;
mod png;
mod render;
mod scheme;
mod vis;

pub use error::{RenderError, Result};
pub use png::save_png;
pub use render::{render_mask, render_rgb, render_single};
pub use scheme::{evaluate, ColorStop, Rgb};
pub use vis::{
    vis_params, RgbVisParams, VisParams, DISSIMILARITY_DIFF_MAX, HOMOGENEITY_DIFF_MAX,
    TRUE_COLOR_MAX,
};
