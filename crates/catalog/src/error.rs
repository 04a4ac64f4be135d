//! Error types for scene catalogs

use thiserror::Error;

/// Errors produced while loading, filtering or mosaicking a collection
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("image collection is empty after {0}")]
    EmptyCollection(String),

    #[error("scene {scene} is on a different grid than {reference}")]
    GridMismatch { scene: String, reference: String },

    #[error("scene {scene} has no asset for band {band}")]
    MissingAsset { scene: String, band: String },

    #[error("scene {scene} uses {crs}, expected geographic lon/lat coordinates")]
    NonGeographicCrs { scene: String, crs: String },

    #[error("core error: {0}")]
    Core(#[from] rubblescan_core::Error),
}

/// Result alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
