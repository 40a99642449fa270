use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use cubemovie::{AutoOr, Colormap, MovieConfig, SpectralCube, SpectralUnit};

#[derive(Parser, Debug)]
#[command(name = "cubemovie", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the whole cube as a movie (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single channel as a PNG.
    Frame(FrameArgs),
    /// Print cube shape and spectral-axis metadata.
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Input FITS cube.
    #[arg(long)]
    cube: PathBuf,

    /// Optional JSON config file; command-line flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame width in pixels (even).
    #[arg(long)]
    width: Option<u32>,

    /// Frame height in pixels (even).
    #[arg(long)]
    height: Option<u32>,

    /// Explicit lower color bound.
    #[arg(long)]
    vmin: Option<f64>,

    /// Explicit upper color bound.
    #[arg(long)]
    vmax: Option<f64>,

    /// Percentiles for automatic color bounds, e.g. `0.25,99.75`.
    #[arg(long, value_delimiter = ',', num_args = 2)]
    percentiles: Option<Vec<f64>>,

    /// Colormap name (viridis, plasma, jet, grayscale, RdBu, RdBu_r).
    #[arg(long)]
    cmap: Option<Colormap>,

    /// Contour levels in map units, e.g. `0.01,0.02,0.04`.
    #[arg(long, value_delimiter = ',')]
    contours: Option<Vec<f64>>,

    /// Display unit for the channel label (e.g. `km/s`); default keeps the
    /// cube's native unit.
    #[arg(long)]
    unit: Option<SpectralUnit>,

    /// Decimal places for the channel label; negative rounds to tens.
    #[arg(long)]
    decimals: Option<i32>,

    /// Disable the colorbar.
    #[arg(long)]
    no_colorbar: bool,

    /// Colorbar label; defaults to the BUNIT header card.
    #[arg(long)]
    cbar_label: Option<String>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output movie path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Channels to render, in order, e.g. `0,1,2`; default is all.
    #[arg(long, value_delimiter = ',')]
    channels: Option<Vec<usize>>,

    /// Frames per second.
    #[arg(long)]
    fps: Option<u32>,

    /// Video bitrate in kbit/s.
    #[arg(long)]
    bitrate: Option<u32>,

    /// ffmpeg video codec identifier.
    #[arg(long)]
    codec: Option<String>,

    /// Refuse to overwrite an existing output file.
    #[arg(long)]
    no_overwrite: bool,

    /// Play the movie with `ffplay` after encoding.
    #[arg(long)]
    preview: bool,

    /// Loop the preview until the window is closed.
    #[arg(long = "loop")]
    repeat: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Channel index (0-based).
    #[arg(long)]
    channel: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input FITS cube.
    #[arg(long)]
    cube: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn read_config_json(path: &Path) -> anyhow::Result<MovieConfig> {
    let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
    let r = BufReader::new(f);
    let cfg: MovieConfig = serde_json::from_reader(r).with_context(|| "parse config JSON")?;
    Ok(cfg)
}

fn build_config(common: &CommonArgs) -> anyhow::Result<MovieConfig> {
    let mut cfg = match &common.config {
        Some(path) => read_config_json(path)?,
        None => MovieConfig::default(),
    };

    if let Some(w) = common.width {
        cfg.width = w;
    }
    if let Some(h) = common.height {
        cfg.height = h;
    }
    if let Some(v) = common.vmin {
        cfg.vmin = Some(v);
    }
    if let Some(v) = common.vmax {
        cfg.vmax = Some(v);
    }
    if let Some(p) = &common.percentiles {
        cfg.percentiles = [p[0], p[1]];
    }
    if let Some(c) = common.cmap {
        cfg.cmap = c;
    }
    if let Some(levels) = &common.contours {
        cfg.contour.levels = levels.clone();
    }
    if let Some(u) = common.unit {
        cfg.label.unit = AutoOr::Value(u);
    }
    if let Some(d) = common.decimals {
        cfg.label.decimals = d;
    }
    if common.no_colorbar {
        cfg.colorbar.show = false;
    }
    if let Some(l) = &common.cbar_label {
        cfg.colorbar.label = AutoOr::Value(l.clone());
    }

    Ok(cfg)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = build_config(&args.common)?;
    if let Some(out) = args.out {
        cfg.output.path = out;
    }
    if args.channels.is_some() {
        cfg.channels = args.channels;
    }
    if let Some(fps) = args.fps {
        cfg.output.fps = fps;
    }
    if let Some(bitrate) = args.bitrate {
        cfg.output.bitrate_kbps = Some(bitrate);
    }
    if let Some(codec) = args.codec {
        cfg.output.codec = codec;
    }
    if args.no_overwrite {
        cfg.output.overwrite = false;
    }
    if args.preview {
        cfg.preview.enabled = true;
    }
    if args.repeat {
        cfg.preview.repeat = true;
    }

    let cube = SpectralCube::open(&args.common.cube)?;
    let report = cubemovie::cube_to_movie(&cube, &cfg)?;

    eprintln!(
        "wrote {} ({} frames at {} fps)",
        report.out_path.display(),
        report.frames,
        cfg.output.fps
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = build_config(&args.common)?;
    let cube = SpectralCube::open(&args.common.cube)?;
    let resolved = cfg.resolve(&cube)?;

    if args.channel >= cube.n_channels() {
        anyhow::bail!(
            "channel {} out of range for a cube with {} channels",
            args.channel,
            cube.n_channels()
        );
    }

    cubemovie::render_channel_png(&cube, &resolved, args.channel, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let cube = SpectralCube::open(&args.cube)?;
    let (nx, ny) = cube.spatial_shape();
    let axis = cube.spectral();

    println!("channels: {}", cube.n_channels());
    println!("spatial:  {nx} x {ny} pixels");
    println!(
        "spectral: {} .. {} {} ({})",
        axis.values.first().copied().unwrap_or(f64::NAN),
        axis.values.last().copied().unwrap_or(f64::NAN),
        axis.unit,
        if axis.ctype.is_empty() { "?" } else { &axis.ctype }
    );
    let meta = cube.meta();
    if let Some(bunit) = &meta.bunit {
        println!("bunit:    {bunit}");
    }
    if let (Some(x), Some(y)) = (&meta.xlabel, &meta.ylabel) {
        println!("axes:     {x} / {y}");
    }
    Ok(())
}
