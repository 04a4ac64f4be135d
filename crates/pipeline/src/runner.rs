//! Per-region pipeline

use crate::config::{RegionConfig, VisSettings};
use crate::error::{PipelineError, Result};
use rubblescan_algorithms::change::{absolute_difference, change_summary, ChangeSummary};
use rubblescan_algorithms::footprints::{footprints_in_aoi, rasterize_footprints};
use rubblescan_algorithms::imagery::{mask_and_scale, scale_reflectance, MaskParams};
use rubblescan_algorithms::texture::{combined_texture, TextureMetric, TEXTURE_BANDS};
use rubblescan_catalog::{clip_to_aoi, CatalogError, DateRange, ImageCollection};
use rubblescan_colormap::{render_mask, render_rgb, render_single, Rgb, RgbVisParams, VisParams};
use rubblescan_core::raster::Raster;
use rubblescan_core::{AreaOfInterest, BandStack, FeatureCollection};
use tracing::{debug, info, warn};

/// Bands read from every scene: the four 10 m reflectance bands and SCL
pub const MOSAIC_BANDS: [&str; 5] = ["B2", "B3", "B4", "B8", "SCL"];

/// Layer payload together with how it is drawn
#[derive(Debug, Clone)]
pub enum LayerKind {
    /// Reflectance mosaic drawn as true colour
    TrueColor { stack: BandStack, vis: RgbVisParams },
    /// Single-band change magnitude
    Change { raster: Raster<f64>, vis: VisParams },
    /// Building footprint coverage
    Footprints { coverage: Raster<u8>, color: Rgb },
}

/// A named map layer
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub kind: LayerKind,
}

impl Layer {
    /// Grid shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        match &self.kind {
            LayerKind::TrueColor { stack, .. } => stack.shape().unwrap_or((0, 0)),
            LayerKind::Change { raster, .. } => raster.shape(),
            LayerKind::Footprints { coverage, .. } => coverage.shape(),
        }
    }

    /// RGBA pixels, row-major
    pub fn render(&self) -> Result<Vec<u8>> {
        Ok(match &self.kind {
            LayerKind::TrueColor { stack, vis } => render_rgb(stack, vis)?,
            LayerKind::Change { raster, vis } => render_single(raster, vis),
            LayerKind::Footprints { coverage, color } => render_mask(coverage, *color),
        })
    }
}

/// Everything produced for one region
#[derive(Debug, Clone)]
pub struct RegionOutput {
    pub region: String,
    /// Layers in display order
    pub layers: Vec<Layer>,
    /// Footprints intersecting the AOI, when a footprint dataset was given
    pub building_count: Option<usize>,
    /// One summary per difference layer, thresholded at its display maximum
    pub summaries: Vec<(TextureMetric, ChangeSummary)>,
    pub pre_scenes: usize,
    pub post_scenes: usize,
}

impl RegionOutput {
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Difference raster of `metric`
    pub fn difference(&self, metric: TextureMetric) -> Option<&Raster<f64>> {
        match &self.layer(&difference_layer_name(metric))?.kind {
            LayerKind::Change { raster, .. } => Some(raster),
            _ => None,
        }
    }
}

pub(crate) fn difference_layer_name(metric: TextureMetric) -> String {
    format!("{}_difference", metric.name())
}

/// Run the full pipeline for one region.
///
/// Both epochs are mosaicked from `collection`, clipped to the AOI, masked
/// and scaled. The band-averaged texture of each epoch is then compared
/// per metric. Layers come out as `pre_mosaic`, `post_mosaic`,
/// `homogeneity_difference`, `dissimilarity_difference` and, with
/// `footprints`, `building_footprints`.
pub fn run_region(
    region: &RegionConfig,
    collection: &ImageCollection,
    footprints: Option<&FeatureCollection>,
    vis: &VisSettings,
) -> Result<RegionOutput> {
    let aoi = region.area_of_interest()?;
    info!(region = %region.name, pre = %region.pre, post = %region.post, "processing region");

    let (pre, pre_scenes) = epoch_mosaic(region, collection, &region.pre, &aoi, "pre")?;
    let (post, post_scenes) = epoch_mosaic(region, collection, &region.post, &aoi, "post")?;
    if !pre.band(MOSAIC_BANDS[0])?.same_grid(post.band(MOSAIC_BANDS[0])?) {
        return Err(PipelineError::GridMismatch {
            region: region.name.clone(),
        });
    }

    let params = MaskParams::default();
    let pre_masked = mask_and_scale(&pre, &params)?;
    let post_masked = mask_and_scale(&post, &params)?;

    let mut layers = vec![
        true_color_layer("pre_mosaic", &pre, &params, vis)?,
        true_color_layer("post_mosaic", &post, &params, vis)?,
    ];

    let mut summaries = Vec::with_capacity(TextureMetric::ALL.len());
    for metric in TextureMetric::ALL {
        let before = combined_texture(&pre_masked, &TEXTURE_BANDS, metric)?;
        let after = combined_texture(&post_masked, &TEXTURE_BANDS, metric)?;
        let diff = absolute_difference(&before, &after)?;

        let summary = change_summary(&diff, vis.diff_max(metric));
        if summary.valid == 0 {
            warn!(region = %region.name, %metric, "difference layer is empty after masking");
        }
        debug!(
            %metric,
            valid = summary.valid,
            mean = ?summary.mean,
            above = summary.above,
            "texture difference"
        );
        summaries.push((metric, summary));
        layers.push(Layer {
            name: difference_layer_name(metric),
            kind: LayerKind::Change {
                raster: diff,
                vis: vis.diff_vis(metric),
            },
        });
    }

    let building_count = match footprints {
        Some(all) => {
            let selected = footprints_in_aoi(all, &aoi);
            info!(region = %region.name, buildings = selected.len(), "building footprints in AOI");
            let coverage = rasterize_footprints(&selected, pre.band(MOSAIC_BANDS[0])?)?;
            layers.push(Layer {
                name: "building_footprints".into(),
                kind: LayerKind::Footprints {
                    coverage,
                    color: vis.footprint_color,
                },
            });
            Some(selected.len())
        }
        None => None,
    };

    Ok(RegionOutput {
        region: region.name.clone(),
        layers,
        building_count,
        summaries,
        pre_scenes,
        post_scenes,
    })
}

/// Filter, mosaic and clip one epoch. Returns the clipped stack and the
/// number of contributing scenes.
fn epoch_mosaic(
    region: &RegionConfig,
    collection: &ImageCollection,
    range: &DateRange,
    aoi: &AreaOfInterest,
    label: &str,
) -> Result<(BandStack, usize)> {
    let wrap = |source: CatalogError| PipelineError::Catalog {
        region: region.name.clone(),
        source,
    };
    let filtered = collection.filter_date(range).filter_bounds(aoi);
    debug!(epoch = label, scenes = filtered.len(), filters = %filtered.describe_filters(), "epoch collection");

    let mosaic = filtered.mosaic(&MOSAIC_BANDS).map_err(wrap)?;
    let clipped = clip_to_aoi(&mosaic, aoi).map_err(wrap)?;
    Ok((clipped, filtered.len()))
}

/// Scaled but unmasked mosaic for visual context
fn true_color_layer(
    name: &str,
    stack: &BandStack,
    params: &MaskParams,
    vis: &VisSettings,
) -> Result<Layer> {
    let scaled = scale_reflectance(stack, &params.reflectance_bands, params.scale)?;
    Ok(Layer {
        name: name.into(),
        kind: LayerKind::TrueColor {
            stack: scaled,
            vis: vis.true_color.clone(),
        },
    })
}
