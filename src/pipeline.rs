use std::path::PathBuf;

use tracing::{debug, info};

use crate::{
    config::{MovieConfig, ResolvedConfig},
    cube::SpectralCube,
    encode_ffmpeg::{EncodeConfig, FfmpegEncoder},
    error::CubeMovieResult,
    preview,
    render::{render_channel, FrameRgb},
};

/// Where rendered frames go, one at a time, in channel order.
///
/// [`FfmpegEncoder`] is the production sink; tests use in-memory sinks.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &FrameRgb) -> CubeMovieResult<()>;
    fn finish(&mut self) -> CubeMovieResult<()>;
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, frame: &FrameRgb) -> CubeMovieResult<()> {
        FfmpegEncoder::write_frame(self, frame)
    }

    fn finish(&mut self) -> CubeMovieResult<()> {
        FfmpegEncoder::finish(self)
    }
}

#[derive(Clone, Debug)]
pub struct MovieReport {
    pub frames: u64,
    pub out_path: PathBuf,
}

/// Render every selected channel, in selection order, and hand the frames to
/// the sink. Strictly sequential; the first error aborts the run.
pub fn assemble(
    cube: &SpectralCube,
    cfg: &ResolvedConfig,
    sink: &mut dyn FrameSink,
) -> CubeMovieResult<u64> {
    for (i, &channel) in cfg.channels.iter().enumerate() {
        let frame = render_channel(cube, cfg, channel)?;
        sink.write_frame(&frame)?;
        debug!(channel, frame = i, "frame rendered and submitted");
    }
    sink.finish()?;
    Ok(cfg.channels.len() as u64)
}

/// The whole conversion: resolve the configuration against the cube, stream
/// every frame through ffmpeg, then optionally preview the result.
#[tracing::instrument(skip(cube, config))]
pub fn cube_to_movie(cube: &SpectralCube, config: &MovieConfig) -> CubeMovieResult<MovieReport> {
    let cfg = config.resolve(cube)?;
    info!(
        channels = cfg.channels.len(),
        vmin = cfg.bounds.vmin,
        vmax = cfg.bounds.vmax,
        fps = cfg.output.fps,
        "movie configuration resolved"
    );

    let mut encoder = FfmpegEncoder::new(EncodeConfig::from_resolved(&cfg))?;
    let frames = assemble(cube, &cfg, &mut encoder)?;
    info!(frames, out = %cfg.output.path.display(), "movie written");

    if cfg.preview.enabled {
        preview::play(&cfg.output.path, cfg.preview.repeat)?;
    }

    Ok(MovieReport {
        frames,
        out_path: cfg.output.path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        colormap::Colormap,
        config::{ColorbarOptions, MovieConfig},
        cube::{CubeMeta, SpectralAxis},
        units::SpectralUnit,
    };
    use ndarray::Array3;

    #[derive(Default)]
    struct CollectingSink {
        frames: Vec<FrameRgb>,
        finished: bool,
    }

    impl FrameSink for CollectingSink {
        fn write_frame(&mut self, frame: &FrameRgb) -> CubeMovieResult<()> {
            assert!(!self.finished);
            self.frames.push(frame.clone());
            Ok(())
        }

        fn finish(&mut self) -> CubeMovieResult<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn graded_cube(nch: usize) -> SpectralCube {
        // Channel c is a constant map of value c; easy to tell frames apart.
        let data = Array3::from_shape_fn((nch, 8, 8), |(c, _, _)| c as f32);
        let axis = SpectralAxis {
            values: (0..nch).map(|i| i as f64 * 100.0).collect(),
            unit: SpectralUnit::MetersPerSecond,
            ctype: "VRAD".to_string(),
        };
        SpectralCube::from_parts(data, axis, CubeMeta::default()).unwrap()
    }

    fn bare_config(nch: usize) -> MovieConfig {
        MovieConfig {
            width: 120,
            height: 120,
            vmin: Some(0.0),
            vmax: Some((nch - 1) as f64),
            cmap: Colormap::Grayscale,
            xlabel: "x".to_string().into(),
            ylabel: "y".to_string().into(),
            colorbar: ColorbarOptions {
                show: false,
                ..ColorbarOptions::default()
            },
            ..MovieConfig::default()
        }
    }

    // A probe well inside the plotting area (right of the y-axis labels,
    // clear of the channel-label text).
    fn probe_pixel(frame: &FrameRgb) -> [u8; 3] {
        let (x, y) = (frame.width * 3 / 4, frame.height / 2);
        let idx = ((y * frame.width + x) * 3) as usize;
        [frame.data[idx], frame.data[idx + 1], frame.data[idx + 2]]
    }

    #[test]
    fn all_channels_produce_exactly_n_frames_in_order() {
        let cube = graded_cube(4);
        let cfg = bare_config(4).resolve(&cube).unwrap();

        let mut sink = CollectingSink::default();
        let n = assemble(&cube, &cfg, &mut sink).unwrap();

        assert_eq!(n, 4);
        assert_eq!(sink.frames.len(), 4);
        assert!(sink.finished);

        // Grayscale map brightness follows the channel value, so stored
        // order shows up as strictly increasing probe brightness.
        let centers: Vec<u8> = sink.frames.iter().map(|f| probe_pixel(f)[0]).collect();
        assert!(centers.windows(2).all(|w| w[0] < w[1]), "{centers:?}");
    }

    #[test]
    fn channel_subset_keeps_selection_order() {
        let cube = graded_cube(4);
        let mut config = bare_config(4);
        config.channels = Some(vec![3, 1]);
        let cfg = config.resolve(&cube).unwrap();

        let mut sink = CollectingSink::default();
        let n = assemble(&cube, &cfg, &mut sink).unwrap();

        assert_eq!(n, 2);
        let centers: Vec<u8> = sink.frames.iter().map(|f| probe_pixel(f)[0]).collect();
        assert!(centers[0] > centers[1], "{centers:?}");
    }
}
