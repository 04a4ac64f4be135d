//! Image collections: filtering and first-valid-pixel mosaics

use crate::dates::{parse_timestamp, DateRange};
use crate::error::{CatalogError, Result};
use crate::manifest::{CatalogManifest, ManifestScene};
use chrono::{DateTime, Utc};
use ndarray::Array2;
use rubblescan_core::io::read_geotiff;
use rubblescan_core::{AreaOfInterest, BBox, BandStack, Raster};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a scene's pixels come from
#[derive(Debug, Clone)]
pub enum SceneData {
    /// One GeoTIFF per band, read on demand
    Files(BTreeMap<String, PathBuf>),
    /// Bands already in memory
    Memory(BandStack),
}

/// A single acquisition in a collection
#[derive(Debug, Clone)]
pub struct Scene {
    pub id: String,
    pub acquired: DateTime<Utc>,
    pub bbox: BBox,
    pub data: SceneData,
}

impl Scene {
    /// Build a file-backed scene from a manifest entry
    pub fn from_manifest(entry: ManifestScene) -> Result<Self> {
        let acquired = parse_timestamp(&entry.datetime)?;
        let bbox = BBox::from_slice(&entry.bbox)?;
        Ok(Self {
            id: entry.id,
            acquired,
            bbox,
            data: SceneData::Files(entry.assets),
        })
    }

    /// Build an in-memory scene; the bbox is taken from the band grid
    pub fn in_memory(id: impl Into<String>, acquired: DateTime<Utc>, bands: BandStack) -> Result<Self> {
        let id = id.into();
        let template = bands.template().ok_or_else(|| {
            rubblescan_core::Error::Other(format!("scene {} has no bands", id))
        })?;
        let (w, s, e, n) = template.bounds();
        Ok(Self {
            id,
            acquired,
            bbox: BBox::new(w, s, e, n),
            data: SceneData::Memory(bands),
        })
    }

    /// Read one band. Declared no-data values are turned into `NaN`.
    pub fn load_band(&self, band: &str) -> Result<Raster<f64>> {
        let missing = || CatalogError::MissingAsset {
            scene: self.id.clone(),
            band: band.to_string(),
        };
        let raster = match &self.data {
            SceneData::Files(assets) => {
                let path = assets.get(band).ok_or_else(missing)?;
                debug!(scene = %self.id, band, path = %path.display(), "reading band");
                read_geotiff::<f64, _>(path)?
            }
            SceneData::Memory(stack) => stack.band(band).map_err(|_| missing())?.clone(),
        };
        Ok(nodata_to_nan(raster))
    }

    fn has_band(&self, band: &str) -> bool {
        match &self.data {
            SceneData::Files(assets) => assets.contains_key(band),
            SceneData::Memory(stack) => stack.contains(band),
        }
    }
}

fn nodata_to_nan(mut raster: Raster<f64>) -> Raster<f64> {
    if let Some(nd) = raster.nodata().filter(|v| !v.is_nan()) {
        raster.data_mut().mapv_inplace(|v| if v == nd { f64::NAN } else { v });
    }
    raster.set_nodata(Some(f64::NAN));
    raster
}

/// An ordered, filterable set of scenes.
///
/// Scenes are ordered by acquisition time, then id. Filters return new
/// collections sharing the same scenes; no pixels are read until
/// [`ImageCollection::mosaic`].
#[derive(Debug, Clone, Default)]
pub struct ImageCollection {
    scenes: Vec<Arc<Scene>>,
    filters: Vec<String>,
}

impl ImageCollection {
    /// Open a collection from a manifest file
    pub fn open<P: AsRef<Path>>(manifest: P) -> Result<Self> {
        let manifest = CatalogManifest::from_file(manifest)?;
        let scenes = manifest
            .scenes
            .into_iter()
            .map(Scene::from_manifest)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_scenes(scenes))
    }

    /// Build a collection from scenes, sorting them by acquisition time
    pub fn from_scenes(scenes: Vec<Scene>) -> Self {
        let mut scenes: Vec<Arc<Scene>> = scenes.into_iter().map(Arc::new).collect();
        scenes.sort_by(|a, b| a.acquired.cmp(&b.acquired).then_with(|| a.id.cmp(&b.id)));
        Self {
            scenes,
            filters: Vec::new(),
        }
    }

    /// Keep scenes acquired inside `range`
    pub fn filter_date(&self, range: &DateRange) -> Self {
        self.filtered(format!("date {}", range), |s| range.contains(&s.acquired))
    }

    /// Keep scenes whose footprint intersects the AOI bounds
    pub fn filter_bounds(&self, aoi: &AreaOfInterest) -> Self {
        let bounds = aoi.bounds();
        self.filtered(
            format!(
                "bounds [{:.4}, {:.4}, {:.4}, {:.4}]",
                bounds.west, bounds.south, bounds.east, bounds.north
            ),
            |s| s.bbox.intersects(&bounds),
        )
    }

    fn filtered<F: Fn(&Scene) -> bool>(&self, label: String, keep: F) -> Self {
        let scenes: Vec<Arc<Scene>> = self.scenes.iter().filter(|s| keep(s)).cloned().collect();
        debug!(filter = %label, before = self.scenes.len(), after = scenes.len(), "filtered collection");
        let mut filters = self.filters.clone();
        filters.push(label);
        Self { scenes, filters }
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter().map(Arc::as_ref)
    }

    /// Human-readable list of applied filters
    pub fn describe_filters(&self) -> String {
        if self.filters.is_empty() {
            "no filters".to_string()
        } else {
            self.filters.join(", ")
        }
    }

    /// Composite the collection into one image.
    ///
    /// For each band and pixel the value is taken from the first scene, in
    /// collection order, where that pixel is defined. Pixels undefined in
    /// every scene stay `NaN`.
    pub fn mosaic(&self, bands: &[&str]) -> Result<BandStack> {
        let first = self
            .scenes
            .first()
            .ok_or_else(|| CatalogError::EmptyCollection(self.describe_filters()))?;

        let mut out = BandStack::new();
        for &band in bands {
            let mut composite = first.load_band(band)?;
            let mut remaining = composite.data().iter().filter(|v| v.is_nan()).count();

            // Every scene is checked, even once the composite is full
            for scene in self.scenes.iter().skip(1) {
                if !scene.has_band(band) {
                    return Err(CatalogError::MissingAsset {
                        scene: scene.id.clone(),
                        band: band.to_string(),
                    });
                }
                let layer = scene.load_band(band)?;
                if !composite.same_grid(&layer) {
                    return Err(CatalogError::GridMismatch {
                        scene: scene.id.clone(),
                        reference: first.id.clone(),
                    });
                }
                if remaining > 0 {
                    remaining = fill_gaps(composite.data_mut(), layer.data());
                }
            }

            if remaining == composite.len() {
                warn!(band, filters = %self.describe_filters(), "mosaic band has no valid pixels");
            } else {
                debug!(
                    band,
                    scenes = self.scenes.len(),
                    unfilled = remaining,
                    "mosaicked band"
                );
            }
            out.insert(band, composite)?;
        }
        Ok(out)
    }
}

/// Copy defined values of `layer` into undefined cells of `target`;
/// returns how many cells are still undefined.
fn fill_gaps(target: &mut Array2<f64>, layer: &Array2<f64>) -> usize {
    let mut remaining = 0;
    for (t, &v) in target.iter_mut().zip(layer.iter()) {
        if t.is_nan() {
            if v.is_nan() {
                remaining += 1;
            } else {
                *t = v;
            }
        }
    }
    remaining
}

/// Mask every pixel whose centre lies outside the AOI.
///
/// Rasters must be in geographic lon/lat; rasters without a CRS are assumed
/// to be.
pub fn clip_to_aoi(stack: &BandStack, aoi: &AreaOfInterest) -> Result<BandStack> {
    let Some(template) = stack.template() else {
        return Ok(stack.clone());
    };
    if let Some(crs) = template.crs().filter(|c| !c.is_geographic()) {
        return Err(CatalogError::NonGeographicCrs {
            scene: "mosaic".into(),
            crs: crs.to_string(),
        });
    }

    let (rows, cols) = template.shape();
    let inside = Array2::from_shape_fn((rows, cols), |(row, col)| {
        let (lon, lat) = template.pixel_to_geo(col, row);
        aoi.contains(lon, lat)
    });
    let kept = inside.iter().filter(|&&k| k).count();
    if kept == 0 {
        warn!("AOI does not cover any pixel centre of the mosaic");
    }

    let mut out = stack.clone();
    for (_, raster) in out.iter_mut() {
        raster
            .data_mut()
            .zip_mut_with(&inside, |v, &keep| {
                if !keep {
                    *v = f64::NAN;
                }
            });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rubblescan_core::GeoTransform;

    fn band(values: &[f64]) -> Raster<f64> {
        let mut r = Raster::from_vec(values.to_vec(), 2, 2).unwrap();
        r.set_transform(GeoTransform::from_bounds(34.0, 31.0, 34.2, 31.2, 2, 2));
        r
    }

    fn scene(id: &str, day: u32, values: &[f64]) -> Scene {
        let stack = BandStack::from_bands([("B4", band(values))]).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, day, 8, 30, 0).unwrap();
        Scene::in_memory(id, at, stack).unwrap()
    }

    #[test]
    fn scenes_are_sorted_by_time() {
        let col = ImageCollection::from_scenes(vec![
            scene("late", 20, &[1.0; 4]),
            scene("early", 2, &[2.0; 4]),
        ]);
        let ids: Vec<&str> = col.scenes().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["early", "late"]);
    }

    #[test]
    fn date_filter_is_half_open() {
        let col = ImageCollection::from_scenes(vec![
            scene("a", 1, &[1.0; 4]),
            scene("b", 15, &[1.0; 4]),
            scene("c", 31, &[1.0; 4]),
        ]);
        let range = DateRange::parse("2024-03-01", "2024-03-31").unwrap();
        let ids: Vec<String> = col.filter_date(&range).scenes().map(|s| s.id.clone()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn bounds_filter_drops_disjoint_scenes() {
        let col = ImageCollection::from_scenes(vec![scene("a", 1, &[1.0; 4])]);
        let far = AreaOfInterest::from_open_ring(&[[36.2, 49.9], [36.3, 49.9], [36.3, 50.0]]).unwrap();
        let near = AreaOfInterest::from_open_ring(&[[34.05, 31.05], [34.1, 31.05], [34.1, 31.1]]).unwrap();
        assert!(col.filter_bounds(&far).is_empty());
        assert_eq!(col.filter_bounds(&near).len(), 1);
    }

    #[test]
    fn mosaic_takes_first_valid_pixel() {
        let nan = f64::NAN;
        let col = ImageCollection::from_scenes(vec![
            scene("a", 1, &[1.0, nan, nan, nan]),
            scene("b", 2, &[9.0, 2.0, nan, nan]),
            scene("c", 3, &[9.0, 9.0, 3.0, nan]),
        ]);
        let mosaic = col.mosaic(&["B4"]).unwrap();
        let b4 = mosaic.band("B4").unwrap();
        assert_eq!(b4.get(0, 0).unwrap(), 1.0);
        assert_eq!(b4.get(0, 1).unwrap(), 2.0);
        assert_eq!(b4.get(1, 0).unwrap(), 3.0);
        assert!(b4.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn empty_collection_names_filters() {
        let col = ImageCollection::from_scenes(vec![scene("a", 1, &[1.0; 4])]);
        let range = DateRange::parse("2020-01-01", "2020-02-01").unwrap();
        match col.filter_date(&range).mosaic(&["B4"]) {
            Err(CatalogError::EmptyCollection(msg)) => assert!(msg.contains("2020-01-01")),
            other => panic!("expected EmptyCollection, got {:?}", other),
        }
    }

    #[test]
    fn mosaic_rejects_grid_mismatch() {
        let nan = f64::NAN;
        let mut shifted = band(&[1.0; 4]);
        shifted.set_transform(GeoTransform::from_bounds(35.0, 31.0, 35.2, 31.2, 2, 2));
        let other = Scene {
            id: "shifted".into(),
            acquired: Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
            bbox: BBox::new(35.0, 31.0, 35.2, 31.2),
            data: SceneData::Memory(BandStack::from_bands([("B4", shifted)]).unwrap()),
        };
        let col = ImageCollection::from_scenes(vec![scene("a", 1, &[nan; 4]), other]);
        assert!(matches!(col.mosaic(&["B4"]), Err(CatalogError::GridMismatch { .. })));
    }

    #[test]
    fn later_scenes_are_validated_after_composite_is_full() {
        let mut shifted = band(&[5.0; 4]);
        shifted.set_transform(GeoTransform::from_bounds(35.0, 31.0, 35.2, 31.2, 2, 2));
        let late = Scene {
            id: "shifted".into(),
            acquired: Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap(),
            bbox: BBox::new(35.0, 31.0, 35.2, 31.2),
            data: SceneData::Memory(BandStack::from_bands([("B4", shifted)]).unwrap()),
        };
        let col = ImageCollection::from_scenes(vec![scene("full", 1, &[1.0; 4]), late]);
        assert!(matches!(col.mosaic(&["B4"]), Err(CatalogError::GridMismatch { .. })));

        let col = ImageCollection::from_scenes(vec![
            scene("full", 1, &[1.0; 4]),
            Scene::in_memory(
                "no_b4",
                Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap(),
                BandStack::from_bands([("B8", band(&[1.0; 4]))]).unwrap(),
            )
            .unwrap(),
        ]);
        assert!(matches!(col.mosaic(&["B4"]), Err(CatalogError::MissingAsset { .. })));
    }

    #[test]
    fn missing_band_is_reported() {
        let col = ImageCollection::from_scenes(vec![scene("a", 1, &[1.0; 4])]);
        assert!(matches!(col.mosaic(&["SCL"]), Err(CatalogError::MissingAsset { .. })));
    }

    #[test]
    fn clip_masks_outside_pixels() {
        let stack = BandStack::from_bands([("B4", band(&[1.0, 2.0, 3.0, 4.0]))]).unwrap();
        // Covers only the western column (pixel centres at lon 34.05)
        let aoi = AreaOfInterest::from_open_ring(&[[34.0, 31.0], [34.1, 31.0], [34.1, 31.2], [34.0, 31.2]])
            .unwrap();
        let clipped = clip_to_aoi(&stack, &aoi).unwrap();
        let b4 = clipped.band("B4").unwrap();
        assert_eq!(b4.get(0, 0).unwrap(), 1.0);
        assert!(b4.get(0, 1).unwrap().is_nan());
        assert_eq!(b4.get(1, 0).unwrap(), 3.0);
        assert!(b4.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn declared_nodata_becomes_nan() {
        let mut r = band(&[0.0, 1200.0, 800.0, 0.0]);
        r.set_nodata(Some(0.0));
        let r = nodata_to_nan(r);
        assert!(r.get(0, 0).unwrap().is_nan());
        assert_eq!(r.get(0, 1).unwrap(), 1200.0);
    }
}
