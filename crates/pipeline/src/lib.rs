//! # Rubblescan Pipeline
//!
//! Per-region pre/post damage-indicator workflow:
//!
//! 1. AOI polygon from the region configuration
//! 2. date + bounds filtering of the scene collection, one mosaic per epoch
//! 3. SCL/NDVI mask and reflectance scaling
//! 4. band-averaged GLCM homogeneity and dissimilarity
//! 5. absolute pre/post difference of each metric
//! 6. named map layers, optionally with a building footprint overlay
//!
//! Regions come from a TOML file ([`PipelineConfig::from_file`]) or from
//! the built-in [`presets`].

pub mod config;
pub mod error;
pub mod output;
pub mod presets;
pub mod runner;

pub use config::{PipelineConfig, RegionConfig, VisSettings};
pub use error::{PipelineError, Result};
pub use output::write_outputs;
pub use runner::{run_region, Layer, LayerKind, RegionOutput, MOSAIC_BANDS};
