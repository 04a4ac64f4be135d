//! Colours and multi-stop interpolation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGB color as (r, g, b) with values in 0..=255.
///
/// Serialized as a colour name (`"blue"`) or a `#rrggbb` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLUE: Self = Self::new(0, 0, 255);
    pub const RED: Self = Self::new(255, 0, 0);
    pub const GREEN: Self = Self::new(0, 128, 0);
    pub const YELLOW: Self = Self::new(255, 255, 0);
    pub const ORANGE: Self = Self::new(255, 165, 0);

    fn name(&self) -> Option<&'static str> {
        NAMED.iter().find(|(_, c)| c == self).map(|(n, _)| *n)
    }
}

const NAMED: &[(&str, Rgb)] = &[
    ("black", Rgb::BLACK),
    ("white", Rgb::WHITE),
    ("blue", Rgb::BLUE),
    ("red", Rgb::RED),
    ("green", Rgb::GREEN),
    ("yellow", Rgb::YELLOW),
    ("orange", Rgb::ORANGE),
];

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((_, c)) = NAMED.iter().find(|(n, _)| n.eq_ignore_ascii_case(s)) {
            return Ok(*c);
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("unknown colour '{s}'"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("unknown colour '{s}'"))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b),
        }
    }
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, color: Rgb) -> Self {
        Self { t, color }
    }
}

// ─── Interpolation engine ──────────────────────────────────────────────

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp(c1.r as f64, c2.r as f64, t).round() as u8,
        lerp(c1.g as f64, c2.g as f64, t).round() as u8,
        lerp(c1.b as f64, c2.b as f64, t).round() as u8,
    )
}

pub(crate) fn multi_stop(stops: &[ColorStop], t: f64) -> Rgb {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return Rgb::BLACK;
    };
    if t <= first.t {
        return first.color;
    }
    if t >= last.t {
        return last.color;
    }
    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.t {
            let span = hi.t - lo.t;
            let ratio = if span > 0.0 { (t - lo.t) / span } else { 1.0 };
            return lerp_color(lo.color, hi.color, ratio);
        }
    }
    last.color
}

/// Evaluate an evenly spaced palette at normalized position `t` ∈ [0, 1].
///
/// Positions outside the unit interval clamp to the end colours. An empty
/// palette gives black; a single colour is returned as is.
pub fn evaluate(palette: &[Rgb], t: f64) -> Rgb {
    match palette {
        [] => Rgb::BLACK,
        [only] => *only,
        _ => {
            let step = 1.0 / (palette.len() - 1) as f64;
            let stops: Vec<ColorStop> = palette
                .iter()
                .enumerate()
                .map(|(i, &c)| ColorStop::new(i as f64 * step, c))
                .collect();
            multi_stop(&stops, t)
        }
    }
}
