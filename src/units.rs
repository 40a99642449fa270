use std::{fmt, str::FromStr};

use crate::error::{CubeMovieError, CubeMovieResult};

/// Spectral-axis units understood by the channel label formatter.
///
/// Conversions are enumerated explicitly: scaling is only defined within a
/// family (velocity to velocity, frequency to frequency). Anything else is a
/// configuration error, never a guess.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SpectralUnit {
    MetersPerSecond,
    KilometersPerSecond,
    Hertz,
    KiloHertz,
    MegaHertz,
    GigaHertz,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitFamily {
    Velocity,
    Frequency,
}

impl SpectralUnit {
    pub fn family(self) -> UnitFamily {
        match self {
            Self::MetersPerSecond | Self::KilometersPerSecond => UnitFamily::Velocity,
            Self::Hertz | Self::KiloHertz | Self::MegaHertz | Self::GigaHertz => {
                UnitFamily::Frequency
            }
        }
    }

    /// Scale factor to the family base unit (m/s or Hz).
    fn to_base(self) -> f64 {
        match self {
            Self::MetersPerSecond => 1.0,
            Self::KilometersPerSecond => 1e3,
            Self::Hertz => 1.0,
            Self::KiloHertz => 1e3,
            Self::MegaHertz => 1e6,
            Self::GigaHertz => 1e9,
        }
    }

    /// Convert `value` from `self` to `target`.
    ///
    /// Fails when the units belong to different families; a frequency axis
    /// cannot be relabeled in km/s by a scale factor alone.
    pub fn convert(self, value: f64, target: SpectralUnit) -> CubeMovieResult<f64> {
        if self.family() != target.family() {
            return Err(CubeMovieError::config(format!(
                "cannot convert '{self}' to '{target}': incompatible unit families"
            )));
        }
        Ok(value * self.to_base() / target.to_base())
    }
}

impl fmt::Display for SpectralUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MetersPerSecond => "m/s",
            Self::KilometersPerSecond => "km/s",
            Self::Hertz => "Hz",
            Self::KiloHertz => "kHz",
            Self::MegaHertz => "MHz",
            Self::GigaHertz => "GHz",
        };
        f.write_str(s)
    }
}

impl FromStr for SpectralUnit {
    type Err = CubeMovieError;

    /// Parse the spellings FITS headers actually contain (`CUNIT3` style),
    /// including the `m s-1` exponent notation.
    fn from_str(s: &str) -> CubeMovieResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m/s" | "m s-1" | "m.s-1" => Ok(Self::MetersPerSecond),
            "km/s" | "km s-1" | "km.s-1" => Ok(Self::KilometersPerSecond),
            "hz" => Ok(Self::Hertz),
            "khz" => Ok(Self::KiloHertz),
            "mhz" => Ok(Self::MegaHertz),
            "ghz" => Ok(Self::GigaHertz),
            other => Err(CubeMovieError::config(format!(
                "unsupported spectral unit '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for SpectralUnit {
    type Error = CubeMovieError;

    fn try_from(s: String) -> CubeMovieResult<Self> {
        s.parse()
    }
}

impl From<SpectralUnit> for String {
    fn from(u: SpectralUnit) -> String {
        u.to_string()
    }
}

/// Round `value` to `decimals` places and format it.
///
/// Negative `decimals` round to tens, hundreds, ... like the usual numpy
/// convention, so `format_value(1234.0, -2)` is `"1200"`.
pub fn format_value(value: f64, decimals: i32) -> String {
    if decimals >= 0 {
        format!("{value:.prec$}", prec = decimals as usize)
    } else {
        let scale = 10f64.powi(-decimals);
        format!("{:.0}", (value / scale).round() * scale)
    }
}

/// The per-frame channel annotation: native value converted to the display
/// unit and rounded, with the unit appended.
pub fn format_channel_label(
    native_value: f64,
    native_unit: SpectralUnit,
    display_unit: SpectralUnit,
    decimals: i32,
) -> CubeMovieResult<String> {
    let converted = native_unit.convert(native_value, display_unit)?;
    Ok(format!(
        "{} {display_unit}",
        format_value(converted, decimals)
    ))
}
