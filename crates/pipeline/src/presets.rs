//! Built-in regions.
//!
//! Each preset is a small AOI over a dense urban area with one pre-event
//! and one post-event month. The months are chosen to sit in the same
//! season where cloud cover allows; they are starting points to tune
//! against visible seasonal or cloud artefacts, not a rule.

use crate::config::RegionConfig;
use crate::error::{PipelineError, Result};
use rubblescan_catalog::DateRange;

struct Preset {
    name: &'static str,
    /// (west, south, east, north)
    bounds: (f64, f64, f64, f64),
    pre: (&'static str, &'static str),
    post: (&'static str, &'static str),
}

const PRESETS: &[Preset] = &[
    // Northern Gaza City and Jabalia
    Preset {
        name: "gaza",
        bounds: (34.44, 31.49, 34.50, 31.54),
        pre: ("2023-09-01", "2023-10-01"),
        post: ("2024-03-01", "2024-04-01"),
    },
    // Northern Saltivka district
    Preset {
        name: "kharkiv",
        bounds: (36.20, 49.96, 36.30, 50.02),
        pre: ("2021-08-01", "2021-09-01"),
        post: ("2022-08-01", "2022-09-01"),
    },
    // Central Khartoum around the airport
    Preset {
        name: "khartoum",
        bounds: (32.50, 15.57, 32.58, 15.63),
        pre: ("2023-03-01", "2023-04-01"),
        post: ("2024-04-01", "2024-05-01"),
    },
];

impl Preset {
    fn to_region(&self) -> Result<RegionConfig> {
        let (w, s, e, n) = self.bounds;
        let dates = |(start, end): (&str, &str)| {
            DateRange::parse(start, end).map_err(|e| {
                PipelineError::Config(format!("preset '{}': {}", self.name, e))
            })
        };
        Ok(RegionConfig {
            name: self.name.to_string(),
            aoi: vec![[w, s], [e, s], [e, n], [w, n], [w, s]],
            pre: dates(self.pre)?,
            post: dates(self.post)?,
        })
    }
}

/// Names of the built-in regions
pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}

/// All built-in regions
pub fn builtin_regions() -> Result<Vec<RegionConfig>> {
    PRESETS.iter().map(Preset::to_region).collect()
}

/// A single built-in region by name
pub fn preset(name: &str) -> Result<RegionConfig> {
    PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| PipelineError::UnknownRegion {
            name: name.to_string(),
            available: preset_names().join(", "),
        })?
        .to_region()
}
