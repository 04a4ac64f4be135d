use rubblescan_catalog::CatalogError;
use rubblescan_colormap::RenderError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown region '{name}' (available: {available})")]
    UnknownRegion { name: String, available: String },

    #[error("Region '{region}': pre and post mosaics are on different grids")]
    GridMismatch { region: String },

    #[error("Region '{region}': {source}")]
    Catalog {
        region: String,
        #[source]
        source: CatalogError,
    },

    #[error(transparent)]
    Core(#[from] rubblescan_core::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Render(#[from] RenderError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
