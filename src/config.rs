use std::path::PathBuf;

use crate::{
    colormap::Colormap,
    cube::SpectralCube,
    error::{CubeMovieError, CubeMovieResult},
    scale::{estimate_bounds, ColorBounds},
    units::SpectralUnit,
};

/// An option that is either the `"auto"` sentinel or an explicit value.
///
/// Every `Auto` is resolved exactly once, in [`MovieConfig::resolve`]; no
/// sentinel survives into the render loop.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum AutoOr<T> {
    Auto(Auto),
    Value(T),
}

/// Serializes as the literal string `"auto"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Auto {
    #[serde(rename = "auto")]
    Auto,
}

impl<T> AutoOr<T> {
    pub const AUTO: Self = Self::Auto(Auto::Auto);

    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Auto(_) => None,
            Self::Value(v) => Some(v),
        }
    }

    /// Resolve `Auto` by calling `auto`, keeping explicit values as-is.
    pub fn resolve_with(self, auto: impl FnOnce() -> CubeMovieResult<T>) -> CubeMovieResult<T> {
        match self {
            Self::Auto(_) => auto(),
            Self::Value(v) => Ok(v),
        }
    }
}

impl<T> Default for AutoOr<T> {
    fn default() -> Self {
        Self::AUTO
    }
}

impl<T> From<T> for AutoOr<T> {
    fn from(v: T) -> Self {
        Self::Value(v)
    }
}

/// Everything the movie run is allowed to vary, one call surface.
///
/// All fields have defaults mirroring the classic channel-map setup, so a
/// JSON config file only needs to name what it changes.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MovieConfig {
    /// Channel indices to include, in order. `None` means all channels in
    /// their stored order; an explicit empty list is a configuration error.
    pub channels: Option<Vec<usize>>,

    /// Output frame width in pixels (must be even for yuv420p output).
    pub width: u32,
    /// Output frame height in pixels (must be even for yuv420p output).
    pub height: u32,

    /// Explicit lower color bound; `None` defers to the percentile.
    pub vmin: Option<f64>,
    /// Explicit upper color bound; `None` defers to the percentile.
    pub vmax: Option<f64>,
    /// `[low, high]` percentiles used for bounds left unset.
    pub percentiles: [f64; 2],
    pub cmap: Colormap,
    /// Background color as `[r, g, b]`; NaN pixels are drawn in it too.
    pub background: [u8; 3],

    /// X-axis label; `"auto"` uses the `CTYPE1` header card.
    pub xlabel: AutoOr<String>,
    /// Y-axis label; `"auto"` uses the `CTYPE2` header card.
    pub ylabel: AutoOr<String>,

    pub contour: ContourOptions,
    pub label: LabelOptions,
    pub colorbar: ColorbarOptions,
    pub output: OutputOptions,
    pub preview: PreviewOptions,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContourOptions {
    /// Contour levels in map units; empty disables contours.
    pub levels: Vec<f64>,
    /// Line color as `[r, g, b]`.
    pub color: [u8; 3],
    pub stroke_width: u32,
}

impl Default for ContourOptions {
    fn default() -> Self {
        Self {
            levels: Vec::new(),
            color: [0, 0, 0],
            stroke_width: 1,
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelOptions {
    /// Decimal places for the channel value; negative rounds to tens, etc.
    pub decimals: i32,
    /// Display unit for the channel label; `"auto"` keeps the native unit.
    pub unit: AutoOr<SpectralUnit>,
    pub text_size: u32,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            decimals: 1,
            unit: AutoOr::AUTO,
            text_size: 24,
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorbarOptions {
    pub show: bool,
    /// Colorbar label; `"auto"` uses the `BUNIT` header card.
    pub label: AutoOr<String>,
    /// Width in pixels reserved for the colorbar strip and its labels.
    pub width: u32,
}

impl Default for ColorbarOptions {
    fn default() -> Self {
        Self {
            show: true,
            label: AutoOr::AUTO,
            width: 110,
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputOptions {
    pub path: PathBuf,
    pub fps: u32,
    /// Video bitrate in kbit/s; `None` leaves the choice to the encoder.
    pub bitrate_kbps: Option<u32>,
    /// ffmpeg video codec identifier.
    pub codec: String,
    pub overwrite: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("movie.mp4"),
            fps: 2,
            bitrate_kbps: None,
            codec: "libx264".to_string(),
            overwrite: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewOptions {
    pub enabled: bool,
    pub repeat: bool,
}

impl Default for MovieConfig {
    fn default() -> Self {
        Self {
            channels: None,
            width: 800,
            height: 800,
            vmin: None,
            vmax: None,
            percentiles: [0.25, 99.75],
            cmap: Colormap::default(),
            background: [255, 255, 255],
            xlabel: AutoOr::AUTO,
            ylabel: AutoOr::AUTO,
            contour: ContourOptions::default(),
            label: LabelOptions::default(),
            colorbar: ColorbarOptions::default(),
            output: OutputOptions::default(),
            preview: PreviewOptions::default(),
        }
    }
}

/// A configuration with every `auto` replaced, bounds fixed, and all values
/// validated against the cube. The render loop only ever sees this.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub channels: Vec<usize>,
    pub width: u32,
    pub height: u32,
    pub bounds: ColorBounds,
    pub cmap: Colormap,
    pub background: [u8; 3],
    pub xlabel: String,
    pub ylabel: String,
    pub contour: ContourOptions,
    pub decimals: i32,
    pub label_unit: SpectralUnit,
    pub label_text_size: u32,
    pub colorbar: Option<ResolvedColorbar>,
    pub output: OutputOptions,
    pub preview: PreviewOptions,
}

#[derive(Clone, Debug)]
pub struct ResolvedColorbar {
    pub label: String,
    pub width: u32,
}

impl MovieConfig {
    /// Resolve against `cube`: validate every option, compute the fixed color
    /// bounds, and replace each `auto` with its header-derived value.
    ///
    /// All configuration errors surface here, before a single frame is
    /// rendered.
    pub fn resolve(&self, cube: &SpectralCube) -> CubeMovieResult<ResolvedConfig> {
        let channels = match &self.channels {
            None => (0..cube.n_channels()).collect::<Vec<_>>(),
            Some(sel) => {
                if sel.is_empty() {
                    return Err(CubeMovieError::config(
                        "channel selection is empty; omit it to render all channels",
                    ));
                }
                if let Some(&bad) = sel.iter().find(|&&c| c >= cube.n_channels()) {
                    return Err(CubeMovieError::config(format!(
                        "channel {bad} out of range for a cube with {} channels",
                        cube.n_channels()
                    )));
                }
                sel.clone()
            }
        };

        if self.width == 0 || self.height == 0 {
            return Err(CubeMovieError::config("frame width/height must be non-zero"));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(CubeMovieError::config(
                "frame width/height must be even (required for yuv420p output)",
            ));
        }
        if self.output.fps == 0 {
            return Err(CubeMovieError::config("fps must be non-zero"));
        }

        let native_unit = cube.spectral().unit;
        let label_unit = self.label.unit.resolve_with(|| Ok(native_unit))?;
        // Fail on incompatible unit families now, not in the middle of a run.
        native_unit.convert(0.0, label_unit)?;

        let bounds = estimate_bounds(
            cube.pixel_values(&channels),
            self.percentiles,
            self.vmin,
            self.vmax,
        )?;
        if bounds.vmax <= bounds.vmin {
            return Err(CubeMovieError::config(format!(
                "color bounds are degenerate (vmin={}, vmax={}); supply explicit vmin/vmax",
                bounds.vmin, bounds.vmax
            )));
        }

        let meta = cube.meta();
        let xlabel = self.xlabel.clone().resolve_with(|| {
            meta.xlabel.clone().ok_or_else(|| {
                CubeMovieError::input("xlabel is 'auto' but the CTYPE1 header card is missing")
            })
        })?;
        let ylabel = self.ylabel.clone().resolve_with(|| {
            meta.ylabel.clone().ok_or_else(|| {
                CubeMovieError::input("ylabel is 'auto' but the CTYPE2 header card is missing")
            })
        })?;

        let colorbar = if self.colorbar.show {
            if self.colorbar.width == 0 || self.colorbar.width >= self.width / 2 {
                return Err(CubeMovieError::config(format!(
                    "colorbar width {} does not fit a {}px-wide frame",
                    self.colorbar.width, self.width
                )));
            }
            let label = self.colorbar.label.clone().resolve_with(|| {
                meta.bunit.clone().ok_or_else(|| {
                    CubeMovieError::input(
                        "colorbar label is 'auto' but the BUNIT header card is missing",
                    )
                })
            })?;
            Some(ResolvedColorbar {
                label,
                width: self.colorbar.width,
            })
        } else {
            None
        };

        Ok(ResolvedConfig {
            channels,
            width: self.width,
            height: self.height,
            bounds,
            cmap: self.cmap,
            background: self.background,
            xlabel,
            ylabel,
            contour: self.contour.clone(),
            decimals: self.label.decimals,
            label_unit,
            label_text_size: self.label.text_size,
            colorbar,
            output: self.output.clone(),
            preview: self.preview,
        })
    }
}
