#![forbid(unsafe_code)]

pub mod colormap;
pub mod config;
pub mod contour;
pub mod cube;
pub mod encode_ffmpeg;
pub mod error;
pub mod pipeline;
pub mod preview;
pub mod render;
pub mod scale;
pub mod units;

pub use colormap::Colormap;
pub use config::{
    AutoOr, ColorbarOptions, ContourOptions, LabelOptions, MovieConfig, OutputOptions,
    PreviewOptions, ResolvedConfig,
};
pub use cube::{CubeMeta, SpectralAxis, SpectralCube};
pub use error::{CubeMovieError, CubeMovieResult};
pub use pipeline::{assemble, cube_to_movie, FrameSink, MovieReport};
pub use render::{render_channel, render_channel_png, FrameRgb};
pub use scale::{estimate_bounds, ColorBounds};
pub use units::{format_channel_label, format_value, SpectralUnit};
