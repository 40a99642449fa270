use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::{
    config::ResolvedConfig,
    contour::contour_segments,
    cube::SpectralCube,
    error::{CubeMovieError, CubeMovieResult},
    units::format_channel_label,
};

/// One rendered channel map as a packed `rgb24` buffer, ready for the
/// encoder. Frames are transient; the pipeline keeps nothing between them.
#[derive(Clone, Debug)]
pub struct FrameRgb {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

fn draw_err(e: impl std::fmt::Display) -> CubeMovieError {
    CubeMovieError::render(e.to_string())
}

/// Render a single channel of `cube` according to `cfg`.
///
/// Layout is rebuilt from scratch for every frame; nothing carries over, so
/// the first frame is laid out exactly like every later one.
pub fn render_channel(
    cube: &SpectralCube,
    cfg: &ResolvedConfig,
    channel: usize,
) -> CubeMovieResult<FrameRgb> {
    let (width, height) = (cfg.width, cfg.height);
    let mut buf = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
        let bg = RGBColor(cfg.background[0], cfg.background[1], cfg.background[2]);
        root.fill(&bg).map_err(draw_err)?;

        let (map_area, cbar_area) = match &cfg.colorbar {
            Some(cbar) => {
                let (l, r) = root.split_horizontally(width - cbar.width);
                (l, Some((r, cbar)))
            }
            None => (root.clone(), None),
        };

        draw_channel_map(&map_area, cube, cfg, channel)?;
        if let Some((area, cbar)) = cbar_area {
            draw_colorbar(&area, cfg, &cbar.label)?;
        }

        root.present().map_err(draw_err)?;
    }

    Ok(FrameRgb {
        width,
        height,
        data: buf,
    })
}

fn draw_channel_map<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    cube: &SpectralCube,
    cfg: &ResolvedConfig,
    channel: usize,
) -> CubeMovieResult<()> {
    let data = cube.channel(channel);
    let (ny, nx) = data.dim();
    let x_range = -0.5..nx as f64 - 0.5;
    let y_range = -0.5..ny as f64 - 0.5;

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(42)
        .y_label_area_size(58)
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc(cfg.xlabel.clone())
        .y_desc(cfg.ylabel.clone())
        .axis_style(BLACK.stroke_width(1))
        .label_style(("sans-serif", 18))
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .draw()
        .map_err(draw_err)?;

    // Raster layer: one filled cell per data pixel, colors fixed by the
    // movie-wide bounds. NaN pixels stay in the background color.
    let span = cfg.bounds.vmax - cfg.bounds.vmin;
    let bg = RGBColor(cfg.background[0], cfg.background[1], cfg.background[2]);
    chart
        .draw_series(
            (0..ny)
                .flat_map(|y| (0..nx).map(move |x| (y, x)))
                .map(|(y, x)| {
                    let v = f64::from(data[[y, x]]);
                    let color = if v.is_finite() {
                        cfg.cmap.sample((v - cfg.bounds.vmin) / span)
                    } else {
                        bg
                    };
                    let (xf, yf) = (x as f64, y as f64);
                    Rectangle::new([(xf - 0.5, yf - 0.5), (xf + 0.5, yf + 0.5)], color.filled())
                }),
        )
        .map_err(draw_err)?;

    // Contour layer.
    let stroke = RGBColor(
        cfg.contour.color[0],
        cfg.contour.color[1],
        cfg.contour.color[2],
    )
    .stroke_width(cfg.contour.stroke_width);
    for &level in &cfg.contour.levels {
        for (a, b) in contour_segments(data, level) {
            chart
                .draw_series(std::iter::once(PathElement::new(vec![a, b], stroke)))
                .map_err(draw_err)?;
        }
    }

    // Channel label in the upper right corner of the map, like the classic
    // channel-map annotation.
    let label = format_channel_label(
        cube.spectral().values[channel],
        cube.spectral().unit,
        cfg.label_unit,
        cfg.decimals,
    )?;
    let style = TextStyle::from(("sans-serif", cfg.label_text_size as f64).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Right, VPos::Top));
    let lx = x_range.end - 0.04 * (x_range.end - x_range.start);
    let ly = y_range.end - 0.04 * (y_range.end - y_range.start);
    chart
        .plotting_area()
        .draw(&Text::new(label, (lx, ly), style))
        .map_err(draw_err)?;

    Ok(())
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    cfg: &ResolvedConfig,
    label: &str,
) -> CubeMovieResult<()> {
    let mut bar = ChartBuilder::on(area)
        .margin_top(52)
        .margin_bottom(52)
        .margin_right(6)
        .set_label_area_size(LabelAreaPosition::Right, 58)
        .build_cartesian_2d(0.0..1.0, cfg.bounds.vmin..cfg.bounds.vmax)
        .map_err(draw_err)?;

    let steps = 128;
    let span = cfg.bounds.vmax - cfg.bounds.vmin;
    bar.draw_series((0..steps).map(|i| {
        let t0 = i as f64 / steps as f64;
        let t1 = (i + 1) as f64 / steps as f64;
        Rectangle::new(
            [
                (0.0, cfg.bounds.vmin + t0 * span),
                (1.0, cfg.bounds.vmin + t1 * span),
            ],
            cfg.cmap.sample((t0 + t1) / 2.0).filled(),
        )
    }))
    .map_err(draw_err)?;

    bar.configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .y_desc(label.to_string())
        .y_labels(7)
        .label_style(("sans-serif", 16))
        .y_label_formatter(&format_tick)
        .draw()
        .map_err(draw_err)?;

    Ok(())
}

/// Tick formatter: plain decimals in a friendly range, scientific outside.
fn format_tick(v: &f64) -> String {
    let a = v.abs();
    if *v == 0.0 {
        "0".to_string()
    } else if (0.01..10000.0).contains(&a) {
        format!("{v:.2}")
    } else {
        format!("{v:.1e}")
    }
}

/// Render a single channel and write it out as a PNG, for quick inspection
/// outside the movie pipeline.
pub fn render_channel_png(
    cube: &SpectralCube,
    cfg: &ResolvedConfig,
    channel: usize,
    out: &std::path::Path,
) -> CubeMovieResult<()> {
    let frame = render_channel(cube, cfg, channel)?;
    if let Some(parent) = out.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    image::save_buffer(
        out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgb8,
    )
    .map_err(|e| CubeMovieError::render(format!("failed to write png '{}': {e}", out.display())))?;
    Ok(())
}
