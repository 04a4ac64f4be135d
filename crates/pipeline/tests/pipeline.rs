//! End-to-end runs over GeoTIFF scenes listed in a manifest on disk.

use approx::assert_relative_eq;
use rubblescan_algorithms::texture::TextureMetric;
use rubblescan_catalog::{CatalogError, CatalogManifest, DateRange, ImageCollection, ManifestScene};
use rubblescan_core::io::{read_geotiff, write_geotiff};
use rubblescan_core::{GeoTransform, Raster, CRS};
use rubblescan_pipeline::{
    run_region, write_outputs, LayerKind, PipelineConfig, PipelineError, RegionConfig, VisSettings,
};
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

const SIZE: usize = 8;
const WEST: f64 = 34.45;
const SOUTH: f64 = 31.50;
const CELL: f64 = 0.0005;

fn band(f: impl Fn(usize, usize) -> f64) -> Raster<f64> {
    let data = (0..SIZE * SIZE).map(|i| f(i / SIZE, i % SIZE)).collect();
    let mut r = Raster::from_vec(data, SIZE, SIZE).unwrap();
    let extent = CELL * SIZE as f64;
    r.set_transform(GeoTransform::from_bounds(WEST, SOUTH, WEST + extent, SOUTH + extent, SIZE, SIZE));
    r.set_crs(Some(CRS::wgs84()));
    r
}

/// Write B2/B3/B4/B8/SCL for one scene. Reflectance bands follow `dn`,
/// NIR equals red so NDVI stays at zero, SCL is 5 (bare soil) everywhere.
fn write_scene(
    dir: &Path,
    id: &str,
    datetime: &str,
    dn: impl Fn(usize, usize) -> f64 + Copy,
) -> ManifestScene {
    let mut assets = BTreeMap::new();
    for name in ["B2", "B3", "B4", "B8"] {
        let file = format!("{id}_{name}.tif");
        write_geotiff(&band(dn), dir.join(&file)).unwrap();
        assets.insert(name.to_string(), file.into());
    }
    let file = format!("{id}_SCL.tif");
    write_geotiff(&band(|_, _| 5.0), dir.join(&file)).unwrap();
    assets.insert("SCL".to_string(), file.into());

    let extent = CELL * SIZE as f64;
    ManifestScene {
        id: id.to_string(),
        datetime: datetime.to_string(),
        bbox: vec![WEST, SOUTH, WEST + extent, SOUTH + extent],
        assets,
    }
}

/// Two pre scenes (the earlier one with a hole in its top row) and one
/// striped post scene.
fn build_catalog() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let scenes = vec![
        write_scene(dir.path(), "pre_a", "2023-09-05T08:30:00Z", |r, _| {
            if r == 0 { f64::NAN } else { 1000.0 }
        }),
        write_scene(dir.path(), "pre_b", "2023-09-20T08:30:00Z", |_, _| 2000.0),
        write_scene(dir.path(), "post", "2024-03-10T08:30:00Z", |_, c| {
            if c % 2 == 0 { 1000.0 } else { 3000.0 }
        }),
    ];
    CatalogManifest {
        collection: Some(rubblescan_catalog::SENTINEL2_SR.into()),
        scenes,
    }
    .to_file(dir.path().join("catalog.json"))
    .unwrap();
    dir
}

fn region() -> RegionConfig {
    let extent = CELL * SIZE as f64;
    let (e, n) = (WEST + extent, SOUTH + extent);
    RegionConfig {
        name: "synthetic".into(),
        aoi: vec![[WEST, SOUTH], [e, SOUTH], [e, n], [WEST, n], [WEST, SOUTH]],
        pre: DateRange::parse("2023-09-01", "2023-10-01").unwrap(),
        post: DateRange::parse("2024-03-01", "2024-04-01").unwrap(),
    }
}

#[test]
fn full_run_writes_every_layer() {
    let catalog = build_catalog();
    let collection = ImageCollection::open(catalog.path().join("catalog.json")).unwrap();
    let out = run_region(&region(), &collection, None, &VisSettings::default()).unwrap();
    assert_eq!((out.pre_scenes, out.post_scenes), (2, 1));

    let out_dir = tempfile::tempdir().unwrap();
    let written = write_outputs(&out, out_dir.path()).unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        [
            "pre_mosaic.png",
            "post_mosaic.png",
            "homogeneity_difference.png",
            "homogeneity_difference.tif",
            "dissimilarity_difference.png",
            "dissimilarity_difference.tif",
        ]
    );
    for path in &written {
        assert!(path.starts_with(out_dir.path().join("synthetic")));
        assert!(path.exists());
    }

    let tif: Raster<f64> =
        read_geotiff(out_dir.path().join("synthetic/dissimilarity_difference.tif")).unwrap();
    let diff = out.difference(TextureMetric::Dissimilarity).unwrap();
    assert_eq!(tif.shape(), diff.shape());
    assert_relative_eq!(tif.get(3, 3).unwrap(), diff.get(3, 3).unwrap(), epsilon = 1e-5);
}

#[test]
fn pre_mosaic_takes_first_valid_pixel() {
    let catalog = build_catalog();
    let collection = ImageCollection::open(catalog.path().join("catalog.json")).unwrap();
    let out = run_region(&region(), &collection, None, &VisSettings::default()).unwrap();

    let Some(LayerKind::TrueColor { stack, .. }) = out.layer("pre_mosaic").map(|l| &l.kind) else {
        panic!("pre_mosaic is not a true-colour layer");
    };
    let blue = stack.band("B2").unwrap();
    // Hole in the earlier scene is filled from the later one
    assert_relative_eq!(blue.get(0, 4).unwrap(), 0.2, epsilon = 1e-9);
    // Elsewhere the earlier scene wins
    assert_relative_eq!(blue.get(5, 4).unwrap(), 0.1, epsilon = 1e-9);
}

#[test]
fn repeated_runs_are_identical() {
    let catalog = build_catalog();
    let collection = ImageCollection::open(catalog.path().join("catalog.json")).unwrap();
    let first = run_region(&region(), &collection, None, &VisSettings::default()).unwrap();
    let second = run_region(&region(), &collection, None, &VisSettings::default()).unwrap();

    for metric in TextureMetric::ALL {
        let a = first.difference(metric).unwrap();
        let b = second.difference(metric).unwrap();
        for (x, y) in a.data().iter().zip(b.data().iter()) {
            assert!(x == y || (x.is_nan() && y.is_nan()));
        }
    }
    for (a, b) in first.layers.iter().zip(&second.layers) {
        assert_eq!(a.render().unwrap(), b.render().unwrap());
    }
}

#[test]
fn dates_without_scenes_fail_with_empty_collection() {
    let catalog = build_catalog();
    let collection = ImageCollection::open(catalog.path().join("catalog.json")).unwrap();
    let mut r = region();
    r.post = DateRange::parse("2025-01-01", "2025-02-01").unwrap();

    match run_region(&r, &collection, None, &VisSettings::default()) {
        Err(PipelineError::Catalog {
            region,
            source: CatalogError::EmptyCollection(filters),
        }) => {
            assert_eq!(region, "synthetic");
            assert!(filters.contains("2025-01-01"));
        }
        other => panic!("expected EmptyCollection, got {:?}", other.map(|o| o.region)),
    }
}

#[test]
fn config_file_drives_a_run() {
    let catalog = build_catalog();
    let extent = CELL * SIZE as f64;
    let toml = format!(
        r#"
catalog = "catalog.json"
output_dir = "out"

[[regions]]
name = "synthetic"
aoi = [[{w}, {s}], [{e}, {s}], [{e}, {n}], [{w}, {n}], [{w}, {s}]]
pre = {{ start = "2023-09-01", end = "2023-10-01" }}
post = {{ start = "2024-03-01", end = "2024-04-01" }}
"#,
        w = WEST,
        s = SOUTH,
        e = WEST + extent,
        n = SOUTH + extent,
    );
    let config_path = catalog.path().join("regions.toml");
    std::fs::write(&config_path, toml).unwrap();

    let config = PipelineConfig::from_file(&config_path).unwrap();
    let manifest = config.catalog.as_ref().unwrap();
    let collection = ImageCollection::open(manifest).unwrap();
    let out = run_region(config.region("synthetic").unwrap(), &collection, None, &config.vis).unwrap();

    let written = write_outputs(&out, &config.output_dir).unwrap();
    assert!(written.iter().all(|p| p.starts_with(catalog.path().join("out"))));
}
