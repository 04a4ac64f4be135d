//! Layer output to disk

use crate::error::{PipelineError, Result};
use crate::runner::{LayerKind, RegionOutput};
use rubblescan_colormap::save_png;
use rubblescan_core::io::write_geotiff;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Write one PNG per layer, plus a GeoTIFF of each difference raster, to
/// `dir/<region>/`. Returns the written paths in layer order.
pub fn write_outputs(output: &RegionOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    let region_dir = dir.join(&output.region);
    fs::create_dir_all(&region_dir).map_err(|source| PipelineError::Io {
        path: region_dir.clone(),
        source,
    })?;

    let mut written = Vec::new();
    for layer in &output.layers {
        let (rows, cols) = layer.shape();
        let png = region_dir.join(format!("{}.png", layer.name));
        save_png(&png, &layer.render()?, cols, rows)?;
        debug!(path = %png.display(), "wrote layer");
        written.push(png);

        if let LayerKind::Change { raster, .. } = &layer.kind {
            let tif = region_dir.join(format!("{}.tif", layer.name));
            write_geotiff(raster, &tif)?;
            debug!(path = %tif.display(), "wrote raster");
            written.push(tif);
        }
    }

    info!(region = %output.region, files = written.len(), dir = %region_dir.display(), "outputs written");
    Ok(written)
}
