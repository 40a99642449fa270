use std::{fmt, str::FromStr};

use plotters::style::RGBColor;

use crate::error::{CubeMovieError, CubeMovieResult};

/// The colormaps the renderer knows how to sample.
///
/// `RdBuR` (red-white-blue, reversed) matches the usual channel-map default;
/// the rest cover the common requests. Unknown names are a configuration
/// error, never a silent fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Colormap {
    Grayscale,
    Viridis,
    Plasma,
    Jet,
    RdBu,
    RdBuR,
}

impl Default for Colormap {
    fn default() -> Self {
        Self::RdBuR
    }
}

// Anchor points (t, r, g, b) with components in [0, 1], interpolated
// piecewise-linearly.
const VIRIDIS: [(f64, f64, f64, f64); 5] = [
    (0.00, 0.267, 0.004, 0.329),
    (0.25, 0.282, 0.141, 0.458),
    (0.50, 0.127, 0.567, 0.551),
    (0.75, 0.454, 0.820, 0.322),
    (1.00, 0.993, 0.906, 0.144),
];

const PLASMA: [(f64, f64, f64, f64); 5] = [
    (0.00, 0.050, 0.030, 0.530),
    (0.25, 0.417, 0.001, 0.658),
    (0.50, 0.798, 0.125, 0.424),
    (0.75, 0.973, 0.434, 0.098),
    (1.00, 0.940, 0.975, 0.131),
];

const JET: [(f64, f64, f64, f64); 5] = [
    (0.00, 0.000, 0.000, 0.500),
    (0.25, 0.000, 0.900, 1.000),
    (0.50, 0.300, 1.000, 0.300),
    (0.75, 1.000, 0.900, 0.000),
    (1.00, 0.500, 0.000, 0.000),
];

const RDBU: [(f64, f64, f64, f64); 5] = [
    (0.00, 0.404, 0.000, 0.122),
    (0.25, 0.899, 0.514, 0.406),
    (0.50, 0.969, 0.967, 0.968),
    (0.75, 0.420, 0.676, 0.839),
    (1.00, 0.020, 0.188, 0.380),
];

impl Colormap {
    /// Sample the colormap at `t` in [0, 1]; out-of-range values clamp.
    pub fn sample(self, t: f64) -> RGBColor {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        match self {
            Self::Grayscale => {
                let v = to_u8(t);
                RGBColor(v, v, v)
            }
            Self::Viridis => lerp_anchors(&VIRIDIS, t),
            Self::Plasma => lerp_anchors(&PLASMA, t),
            Self::Jet => lerp_anchors(&JET, t),
            Self::RdBu => lerp_anchors(&RDBU, t),
            Self::RdBuR => lerp_anchors(&RDBU, 1.0 - t),
        }
    }
}

fn lerp_anchors(anchors: &[(f64, f64, f64, f64)], t: f64) -> RGBColor {
    let mut lo = anchors[0];
    for &hi in &anchors[1..] {
        if t <= hi.0 {
            let span = hi.0 - lo.0;
            let f = if span > 0.0 { (t - lo.0) / span } else { 0.0 };
            return RGBColor(
                to_u8(lo.1 + (hi.1 - lo.1) * f),
                to_u8(lo.2 + (hi.2 - lo.2) * f),
                to_u8(lo.3 + (hi.3 - lo.3) * f),
            );
        }
        lo = hi;
    }
    let last = anchors[anchors.len() - 1];
    RGBColor(to_u8(last.1), to_u8(last.2), to_u8(last.3))
}

fn to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Grayscale => "grayscale",
            Self::Viridis => "viridis",
            Self::Plasma => "plasma",
            Self::Jet => "jet",
            Self::RdBu => "RdBu",
            Self::RdBuR => "RdBu_r",
        };
        f.write_str(s)
    }
}

impl FromStr for Colormap {
    type Err = CubeMovieError;

    fn from_str(s: &str) -> CubeMovieResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grayscale" | "greyscale" | "gray" | "grey" => Ok(Self::Grayscale),
            "viridis" => Ok(Self::Viridis),
            "plasma" => Ok(Self::Plasma),
            "jet" => Ok(Self::Jet),
            "rdbu" => Ok(Self::RdBu),
            "rdbu_r" => Ok(Self::RdBuR),
            other => Err(CubeMovieError::config(format!(
                "unknown colormap '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for Colormap {
    type Error = CubeMovieError;

    fn try_from(s: String) -> CubeMovieResult<Self> {
        s.parse()
    }
}

impl From<Colormap> for String {
    fn from(c: Colormap) -> String {
        c.to_string()
    }
}
