//! PNG output for rendered layers.

use crate::error::{RenderError, Result};
use image::RgbaImage;
use std::path::Path;

/// Write an RGBA buffer of `cols x rows` pixels as PNG.
pub fn save_png<P: AsRef<Path>>(path: P, rgba: &[u8], cols: usize, rows: usize) -> Result<()> {
    let expected = cols * rows * 4;
    if rgba.len() != expected {
        return Err(RenderError::BufferSize {
            expected,
            actual: rgba.len(),
            cols,
            rows,
        });
    }
    let (width, height) = match (u32::try_from(cols), u32::try_from(rows)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(RenderError::TooLarge { cols, rows }),
    };
    let img = RgbaImage::from_raw(width, height, rgba.to_vec())
        .ok_or(RenderError::BufferSize { expected, actual: rgba.len(), cols, rows })?;
    img.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}
