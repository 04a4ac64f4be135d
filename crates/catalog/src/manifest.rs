//! Catalog manifest
//!
//! A trimmed-down STAC item collection: per scene an id, an acquisition
//! timestamp, a bbox and a map from band name to a GeoTIFF path.
//!
//! ```json
//! {
//!   "collection": "COPERNICUS/S2_SR_HARMONIZED",
//!   "scenes": [
//!     { "id": "S2A_20230914_T36RXV",
//!       "datetime": "2023-09-14T08:35:00Z",
//!       "bbox": [34.2, 31.2, 34.6, 31.6],
//!       "assets": { "B2": "20230914/B2.tif", "SCL": "20230914/SCL.tif" } }
//!   ]
//! }
//! ```

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level manifest document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Collection identifier, informational
    #[serde(default)]
    pub collection: Option<String>,

    pub scenes: Vec<ManifestScene>,
}

/// One scene entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestScene {
    pub id: String,

    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub datetime: String,

    /// `[west, south, east, north]`
    pub bbox: Vec<f64>,

    /// Band name to GeoTIFF path, relative to the manifest directory
    pub assets: BTreeMap<String, PathBuf>,
}

impl CatalogManifest {
    /// Read a manifest, resolving asset paths against its directory
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut manifest: CatalogManifest = serde_json::from_str(&text)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for scene in &mut manifest.scenes {
            for asset in scene.assets.values_mut() {
                if asset.is_relative() {
                    *asset = base.join(&*asset);
                }
            }
        }
        Ok(manifest)
    }

    /// Write the manifest as pretty JSON
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_assets_resolve_against_manifest_dir() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = CatalogManifest {
            collection: Some(crate::SENTINEL2_SR.into()),
            scenes: vec![ManifestScene {
                id: "a".into(),
                datetime: "2023-09-14T08:35:00Z".into(),
                bbox: vec![34.2, 31.2, 34.6, 31.6],
                assets: [("B4".to_string(), PathBuf::from("a/B4.tif"))].into_iter().collect(),
            }],
        };
        let path = dir.path().join("catalog.json");
        manifest.to_file(&path).unwrap();

        let back = CatalogManifest::from_file(&path).unwrap();
        assert_eq!(back.scenes[0].assets["B4"], dir.path().join("a/B4.tif"));
    }

    #[test]
    fn missing_file_names_path() {
        let err = CatalogManifest::from_file("/nonexistent/catalog.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/catalog.json"));
    }
}
