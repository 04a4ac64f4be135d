//! Pipeline configuration file support.
//!
//! ```toml
//! catalog = "scenes/catalog.json"
//! footprints = "buildings.geojson"
//! output_dir = "output"
//!
//! [vis]
//! homogeneity_max = 0.27
//!
//! [[regions]]
//! name = "gaza"
//! aoi = [[34.44, 31.49], [34.50, 31.49], [34.50, 31.54], [34.44, 31.54], [34.44, 31.49]]
//! pre = { start = "2023-09-01", end = "2023-10-01" }
//! post = { start = "2024-03-01", end = "2024-04-01" }
//! ```
//!
//! Dates are quoted `YYYY-MM-DD` strings. Relative paths are resolved
//! against the directory holding the file. Without a `[[regions]]` table the
//! built-in presets are used.

use crate::error::{PipelineError, Result};
use crate::presets;
use rubblescan_algorithms::texture::TextureMetric;
use rubblescan_catalog::DateRange;
use rubblescan_colormap::{
    vis_params, Rgb, RgbVisParams, VisParams, DISSIMILARITY_DIFF_MAX, HOMOGENEITY_DIFF_MAX,
};
use rubblescan_core::AreaOfInterest;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// One area analysed as a pre/post pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    /// Closed lon/lat ring, first vertex repeated last
    pub aoi: Vec<[f64; 2]>,
    pub pre: DateRange,
    pub post: DateRange,
}

impl RegionConfig {
    pub fn area_of_interest(&self) -> Result<AreaOfInterest> {
        AreaOfInterest::new(&self.aoi)
            .map_err(|e| PipelineError::Config(format!("region '{}': {}", self.name, e)))
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PipelineError::Config("region name is empty".into()));
        }
        self.area_of_interest()?;
        for (label, range) in [("pre", &self.pre), ("post", &self.post)] {
            if range.end <= range.start {
                return Err(PipelineError::Config(format!(
                    "region '{}': {} range {} is empty",
                    self.name, label, range
                )));
            }
        }
        Ok(())
    }
}

/// Display settings for the output layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisSettings {
    pub homogeneity_max: f64,
    pub dissimilarity_max: f64,
    pub true_color: RgbVisParams,
    pub footprint_color: Rgb,
}

impl Default for VisSettings {
    fn default() -> Self {
        Self {
            homogeneity_max: HOMOGENEITY_DIFF_MAX,
            dissimilarity_max: DISSIMILARITY_DIFF_MAX,
            true_color: RgbVisParams::default(),
            footprint_color: Rgb::YELLOW,
        }
    }
}

impl VisSettings {
    /// Display maximum of the difference layer for `metric`
    pub fn diff_max(&self, metric: TextureMetric) -> f64 {
        match metric {
            TextureMetric::Homogeneity => self.homogeneity_max,
            TextureMetric::Dissimilarity => self.dissimilarity_max,
        }
    }

    /// Visualization parameters of the difference layer for `metric`
    pub fn diff_vis(&self, metric: TextureMetric) -> VisParams {
        vis_params(self.diff_max(metric))
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Scene catalog manifest
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Building footprint GeoJSON
    #[serde(default)]
    pub footprints: Option<PathBuf>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub vis: VisSettings,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl PipelineConfig {
    /// Configuration with the built-in regions and default settings
    pub fn with_presets() -> Result<Self> {
        Ok(Self {
            catalog: None,
            footprints: None,
            output_dir: default_output_dir(),
            regions: presets::builtin_regions()?,
            vis: VisSettings::default(),
        })
    }

    /// Load and validate a TOML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;

        if let Some(base) = path.parent() {
            let resolve = |p: &mut PathBuf| {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            };
            if let Some(catalog) = config.catalog.as_mut() {
                resolve(catalog);
            }
            if let Some(footprints) = config.footprints.as_mut() {
                resolve(footprints);
            }
            resolve(&mut config.output_dir);
        }
        Ok(config)
    }

    /// Parse and validate TOML text. Paths are kept as written.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: PipelineConfig = toml::from_str(text)
            .map_err(|e| PipelineError::Config(format!("failed to parse config: {}", e)))?;
        if config.regions.is_empty() {
            config.regions = presets::builtin_regions()?;
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for region in &self.regions {
            region.validate()?;
            if !seen.insert(region.name.to_lowercase()) {
                return Err(PipelineError::Config(format!(
                    "region '{}' is defined twice",
                    region.name
                )));
            }
        }
        for (name, value) in [
            ("vis.homogeneity_max", self.vis.homogeneity_max),
            ("vis.dissimilarity_max", self.vis.dissimilarity_max),
        ] {
            if !value.is_finite() {
                return Err(PipelineError::Config(format!("{} must be finite", name)));
            }
        }
        Ok(())
    }

    /// Look up a region by name, ignoring case
    pub fn region(&self, name: &str) -> Result<&RegionConfig> {
        self.regions
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| PipelineError::UnknownRegion {
                name: name.to_string(),
                available: self
                    .regions
                    .iter()
                    .map(|r| r.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
catalog = "scenes/catalog.json"

[vis]
homogeneity_max = 0.3

[[regions]]
name = "test"
aoi = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]
pre = { start = "2023-01-01", end = "2023-02-01" }
post = { start = "2024-01-01", end = "2024-02-01" }
"#;

    #[test]
    fn parses_regions_and_defaults() {
        let config = PipelineConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.catalog, Some(PathBuf::from("scenes/catalog.json")));
        assert_eq!(config.footprints, None);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.regions.len(), 1);
        assert_eq!(config.region("TEST").unwrap().pre.days(), 31);
        assert_eq!(config.vis.homogeneity_max, 0.3);
        assert_eq!(config.vis.dissimilarity_max, DISSIMILARITY_DIFF_MAX);
        assert_eq!(config.vis.diff_vis(TextureMetric::Dissimilarity).max, 0.85);
    }

    #[test]
    fn missing_regions_fall_back_to_presets() {
        let config = PipelineConfig::from_toml_str("output_dir = \"out\"").unwrap();
        assert_eq!(config.regions.len(), 3);
        assert!(config.region("khartoum").is_ok());
    }

    #[test]
    fn open_aoi_ring_is_rejected() {
        let text = SAMPLE.replace(", [0.0, 0.0]]", "]");
        assert!(matches!(
            PipelineConfig::from_toml_str(&text),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let text = SAMPLE.replace(
            r#"pre = { start = "2023-01-01", end = "2023-02-01" }"#,
            r#"pre = { start = "2023-02-01", end = "2023-01-01" }"#,
        );
        assert!(PipelineConfig::from_toml_str(&text).is_err());
    }

    #[test]
    fn duplicate_regions_are_rejected() {
        let region = SAMPLE.split("[[regions]]").nth(1).unwrap();
        let text = format!("{}[[regions]]{}", SAMPLE, region);
        assert!(PipelineConfig::from_toml_str(&text).is_err());
    }

    #[test]
    fn relative_paths_resolve_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.toml");
        fs::write(&path, SAMPLE).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.catalog, Some(dir.path().join("scenes/catalog.json")));
        assert_eq!(config.output_dir, dir.path().join("output"));
    }

    #[test]
    fn sample_config_matches_presets() {
        let text = include_str!("../../../config/regions.toml");
        let config = PipelineConfig::from_toml_str(text).unwrap();
        assert_eq!(config.regions, presets::builtin_regions().unwrap());
        assert_eq!(config.vis, VisSettings::default());
    }

    #[test]
    fn unknown_region_lists_available() {
        let config = PipelineConfig::with_presets().unwrap();
        match config.region("mosul") {
            Err(PipelineError::UnknownRegion { available, .. }) => {
                assert_eq!(available, "gaza, kharkiv, khartoum")
            }
            other => panic!("expected UnknownRegion, got {:?}", other),
        }
    }
}
