//! Visualization parameters for map layers.

use crate::scheme::Rgb;
use serde::{Deserialize, Serialize};

/// Display maximum for the homogeneity difference layer.
///
/// Tuned by eye for 64-level quantization; it has no meaning for other
/// quantizations.
pub const HOMOGENEITY_DIFF_MAX: f64 = 0.27;

/// Display maximum for the dissimilarity difference layer (64 levels).
pub const DISSIMILARITY_DIFF_MAX: f64 = 0.85;

/// Reflectance that maps to full brightness in true-colour layers
pub const TRUE_COLOR_MAX: f64 = 0.3;

/// Single-band display: linear stretch over `[min, max]` into `palette`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisParams {
    pub min: f64,
    pub max: f64,
    pub palette: Vec<Rgb>,
}

impl VisParams {
    /// Normalized palette position of `value`, unclamped
    pub fn normalize(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range.abs() > f64::EPSILON {
            (value - self.min) / range
        } else {
            0.0
        }
    }
}

/// Parameters for a change layer: `min = 0`, the given `max` and a
/// blue→white→red palette.
///
/// Any finite `max` is accepted, including zero or a negative value; such a
/// layer renders with the low-end colour.
pub fn vis_params(max: f64) -> VisParams {
    VisParams {
        min: 0.0,
        max,
        palette: vec![Rgb::BLUE, Rgb::WHITE, Rgb::RED],
    }
}

/// True-colour display of three bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgbVisParams {
    /// Band names drawn as red, green and blue
    pub bands: [String; 3],
    pub min: f64,
    pub max: f64,
}

impl Default for RgbVisParams {
    fn default() -> Self {
        Self {
            bands: ["B4".into(), "B3".into(), "B2".into()],
            min: 0.0,
            max: TRUE_COLOR_MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_layer_params() {
        let vis = vis_params(HOMOGENEITY_DIFF_MAX);
        assert_eq!(vis.min, 0.0);
        assert_eq!(vis.max, 0.27);
        assert_eq!(vis.palette, vec![Rgb::BLUE, Rgb::WHITE, Rgb::RED]);

        assert_eq!(vis_params(DISSIMILARITY_DIFF_MAX).max, 0.85);
    }

    #[test]
    fn non_positive_max_is_accepted() {
        let vis = vis_params(0.0);
        assert_eq!(vis.max, 0.0);
        assert_eq!(vis.normalize(0.5), 0.0);
    }

    #[test]
    fn serializes_with_colour_names() {
        let json = serde_json::to_string(&vis_params(0.85)).unwrap();
        assert_eq!(json, r#"{"min":0.0,"max":0.85,"palette":["blue","white","red"]}"#);
        let back: VisParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vis_params(0.85));
    }

    #[test]
    fn true_colour_defaults() {
        let rgb = RgbVisParams::default();
        assert_eq!(rgb.bands, ["B4", "B3", "B2"]);
        assert_eq!(rgb.max, 0.3);
    }
}
