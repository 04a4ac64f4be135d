//! Named multi-band images
//!
//! A Sentinel-2 scene is read one band per GeoTIFF. `BandStack` keeps those
//! bands together under their collection names (`B2`, `B8`, `SCL`, ...) and
//! guarantees that every band sits on the same grid.

use crate::error::{Error, Result};
use crate::raster::Raster;
use std::collections::BTreeMap;

/// Named bands of one image, all on a common grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandStack {
    bands: BTreeMap<String, Raster<f64>>,
}

impl BandStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from `(name, raster)` pairs
    pub fn from_bands<I, S>(bands: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Raster<f64>)>,
        S: Into<String>,
    {
        let mut stack = Self::new();
        for (name, raster) in bands {
            stack.insert(name, raster)?;
        }
        Ok(stack)
    }

    /// Insert or replace a band.
    ///
    /// Fails if the band is not on the grid of the bands already present.
    pub fn insert(&mut self, name: impl Into<String>, raster: Raster<f64>) -> Result<()> {
        if let Some(reference) = self.bands.values().next() {
            if !reference.same_grid(&raster) {
                return Err(Error::SizeMismatch {
                    er: reference.rows(),
                    ec: reference.cols(),
                    ar: raster.rows(),
                    ac: raster.cols(),
                });
            }
        }
        self.bands.insert(name.into(), raster);
        Ok(())
    }

    /// Get a band by name
    pub fn band(&self, name: &str) -> Result<&Raster<f64>> {
        self.bands
            .get(name)
            .ok_or_else(|| Error::MissingBand(name.to_string()))
    }

    /// Whether a band is present
    pub fn contains(&self, name: &str) -> bool {
        self.bands.contains_key(name)
    }

    /// Iterate over `(name, raster)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Raster<f64>)> {
        self.bands.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate mutably over `(name, raster)` pairs
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Raster<f64>)> {
        self.bands.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Select a subset of bands, in the order given
    pub fn select(&self, names: &[&str]) -> Result<BandStack> {
        let mut out = BandStack::new();
        for &name in names {
            out.insert(name, self.band(name)?.clone())?;
        }
        Ok(out)
    }

    /// Number of bands
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Shape shared by every band, `None` for an empty stack
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.bands.values().next().map(Raster::shape)
    }

    /// Any band, used as the grid template for derived rasters
    pub fn template(&self) -> Option<&Raster<f64>> {
        self.bands.values().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeoTransform;

    fn band(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, value);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn missing_band_is_reported_by_name() {
        let stack = BandStack::from_bands([("B4", band(2, 2, 0.1))]).unwrap();
        match stack.band("B8") {
            Err(Error::MissingBand(name)) => assert_eq!(name, "B8"),
            other => panic!("expected MissingBand, got {:?}", other),
        }
    }

    #[test]
    fn bands_must_share_grid() {
        let mut stack = BandStack::from_bands([("B4", band(2, 2, 0.1))]).unwrap();
        assert!(stack.insert("B8", band(3, 2, 0.1)).is_err());

        let mut shifted = band(2, 2, 0.1);
        shifted.set_transform(GeoTransform::new(5.0, 2.0, 1.0, -1.0));
        assert!(stack.insert("B8", shifted).is_err());
        assert!(stack.insert("B8", band(2, 2, 0.3)).is_ok());
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn select_keeps_requested_bands() {
        let stack = BandStack::from_bands([
            ("B2", band(2, 2, 0.1)),
            ("B3", band(2, 2, 0.2)),
            ("SCL", band(2, 2, 4.0)),
        ])
        .unwrap();
        let rgb = stack.select(&["B3", "B2"]).unwrap();
        assert_eq!(rgb.len(), 2);
        assert!(!rgb.contains("SCL"));
        assert!(stack.select(&["B8"]).is_err());
    }
}
