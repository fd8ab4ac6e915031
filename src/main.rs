mod capture;
mod output;

use anyhow::{bail, Context, Result};
use capture::{FrameSource, ImageSequence};
use clap::Parser;
use cutout::grid::mask_from_gray;
use cutout::segmentation::{self, Segmenter};
use cutout::{ColorGrid, GraphCut, Mask, Rect, RegionHint, SegmentationConfig, Strokes};
use output::{FrameSink, PngSequence};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with segmentation settings; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::Subcommand)]
enum Command {
    /// Cut the foreground out of a single image
    Segment(SegmentArgs),
    /// Segment the first frame of a sequence and carry the result through the rest
    Propagate(PropagateArgs),
}

/// Rectangle given as `x0,y0,x1,y1`
#[derive(Debug, Clone, Copy)]
struct RectArg {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl FromStr for RectArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x0, y0, x1, y1] = parts.as_slice() else {
            bail!("expected four comma-separated bounds x0,y0,x1,y1");
        };
        Ok(RectArg {
            x0: x0.parse().context("x0 is not a valid integer")?,
            y0: y0.parse().context("y0 is not a valid integer")?,
            x1: x1.parse().context("x1 is not a valid integer")?,
            y1: y1.parse().context("y1 is not a valid integer")?,
        })
    }
}

impl From<RectArg> for Rect {
    fn from(r: RectArg) -> Self {
        Rect::new(r.x0, r.y0, r.x1, r.y1)
    }
}

#[derive(Debug, Clone, clap::Args)]
struct HintArgs {
    /// Rectangle around the object, `x0,y0,x1,y1`, right and bottom exclusive
    #[arg(short, long)]
    rect: Option<RectArg>,

    /// Grayscale image whose non-zero pixels are definite foreground
    #[arg(long)]
    foreground_strokes: Option<PathBuf>,

    /// Grayscale image whose non-zero pixels are definite background
    #[arg(long)]
    background_strokes: Option<PathBuf>,
}

#[derive(Debug, Clone, clap::Args)]
struct TuningArgs {
    #[arg(long)]
    data_term_scale: Option<f64>,

    #[arg(long)]
    smoothness_term_scale: Option<f64>,

    /// Force hinted pixels to their hinted label in the result
    #[arg(long)]
    apply_explicit_mask: bool,

    /// Maximum refinement rounds
    #[arg(long)]
    rounds: Option<usize>,

    /// Gaussian components per class
    #[arg(long)]
    components: Option<usize>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Solver {
    /// Exact min-cut with iterative model refinement
    GraphCut,
    /// One exact min-cut with the models fit from the hint
    SingleCut,
    /// Simulated annealing over a Potts energy
    Anneal,
}

#[derive(Debug, Clone, clap::Parser)]
struct SegmentArgs {
    input: PathBuf,

    /// RGBA cutout with the mask as alpha
    #[arg(short, long, default_value = "cutout.png")]
    output: PathBuf,

    /// Also write the binary mask as a grayscale image
    #[arg(long)]
    mask: Option<PathBuf>,

    #[command(flatten)]
    hint: HintArgs,

    #[command(flatten)]
    tuning: TuningArgs,

    #[arg(long, value_enum, default_value_t = Solver::GraphCut)]
    solver: Solver,

    /// Initial annealing temperature
    #[arg(long)]
    temperature: Option<f64>,

    /// Annealing temperature decay per proposal
    #[arg(long)]
    cooling_rate: Option<f64>,

    /// Annealing sweeps
    #[arg(long)]
    iterations: Option<usize>,
}

#[derive(Debug, Clone, clap::Parser)]
struct PropagateArgs {
    /// Directory of frames, read in file-name order
    frames: PathBuf,

    /// Directory for the numbered cutouts
    #[arg(short, long, default_value = "cutout")]
    output: PathBuf,

    /// Also write each mask next to its cutout
    #[arg(long)]
    write_masks: bool,

    #[command(flatten)]
    hint: HintArgs,

    #[command(flatten)]
    tuning: TuningArgs,

    /// Segment every frame independently with the first frame's models
    #[arg(long)]
    no_temporal: bool,

    /// Penalty for a pixel changing label between frames
    #[arg(long)]
    energy_term_3d: Option<f64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let mut config = match &args.config {
        Some(path) => SegmentationConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SegmentationConfig::default(),
    };

    match &args.command {
        Command::Segment(segment_args) => {
            apply_tuning(&mut config, &segment_args.tuning);
            segment(config, segment_args)
        }
        Command::Propagate(propagate_args) => {
            apply_tuning(&mut config, &propagate_args.tuning);
            if propagate_args.no_temporal {
                config.is_3d = false;
            }
            if let Some(weight) = propagate_args.energy_term_3d {
                config.energy_term_3d = weight;
            }
            propagate(config, propagate_args)
        }
    }
}

fn apply_tuning(config: &mut SegmentationConfig, tuning: &TuningArgs) {
    if let Some(scale) = tuning.data_term_scale {
        config.data_term_scale = scale;
    }
    if let Some(scale) = tuning.smoothness_term_scale {
        config.smoothness_term_scale = scale;
    }
    if tuning.apply_explicit_mask {
        config.apply_explicit_mask = true;
    }
    if let Some(rounds) = tuning.rounds {
        config.rounds = rounds;
    }
    if let Some(components) = tuning.components {
        config.gmm.components = components;
    }
}

fn load_strokes(path: Option<&Path>, width: u32, height: u32) -> Result<Mask> {
    match path {
        Some(path) => {
            let gray = image::open(path)
                .with_context(|| format!("Failed to read strokes from {}", path.display()))?
                .to_luma8();
            Ok(mask_from_gray(&gray))
        }
        None => Ok(Mask::new(width, height)),
    }
}

fn build_hint(hint: &HintArgs, width: u32, height: u32) -> Result<RegionHint> {
    let strokes = if hint.foreground_strokes.is_some() || hint.background_strokes.is_some() {
        Some(Strokes::new(
            load_strokes(hint.foreground_strokes.as_deref(), width, height)?,
            load_strokes(hint.background_strokes.as_deref(), width, height)?,
        ))
    } else {
        None
    };

    Ok(match (hint.rect, strokes) {
        (Some(rect), Some(strokes)) => RegionHint::RectWithStrokes(rect.into(), strokes),
        (Some(rect), None) => RegionHint::Rect(rect.into()),
        (None, Some(strokes)) => RegionHint::Strokes(strokes),
        (None, None) => bail!("Provide --rect and/or stroke images"),
    })
}

fn segment(mut config: SegmentationConfig, args: &SegmentArgs) -> Result<()> {
    let image = image::open(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?
        .to_rgb8();
    let (width, height) = image.dimensions();
    tracing::info!("Segmenting {} ({}x{})", args.input.display(), width, height);

    let hint = build_hint(&args.hint, width, height)?;
    let colors = ColorGrid::from_rgb(&image);

    let start = Instant::now();
    let mask = match args.solver {
        Solver::GraphCut => {
            segmentation::refine(&colors, &hint, &config)
                .context("Segmentation failed")?
                .mask
        }
        Solver::SingleCut => {
            GraphCut::new(&image, &hint, config)
                .context("Segmentation failed")?
                .segment()
                .mask
        }
        Solver::Anneal => {
            if let Some(temperature) = args.temperature {
                config.anneal.temperature = temperature;
            }
            if let Some(rate) = args.cooling_rate {
                config.anneal.cooling_rate = rate;
            }
            if let Some(iterations) = args.iterations {
                config.anneal.iterations = iterations;
            }
            segmentation::anneal(&colors, &hint, &config)
                .context("Annealing failed")?
                .mask
        }
    };
    tracing::info!(
        "Done in {:.1}ms, foreground={:.1}%, smoothness={:.3}",
        start.elapsed().as_secs_f64() * 1000.0,
        mask.foreground_ratio() * 100.0,
        mask.smoothness()
    );

    mask.apply_as_alpha(&image)?
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    if let Some(path) = &args.mask {
        mask.to_gray_image()
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(())
}

fn propagate(config: SegmentationConfig, args: &PropagateArgs) -> Result<()> {
    let mut source = ImageSequence::open(&args.frames)?;
    let mut sink = PngSequence::new(&args.output, args.write_masks)?;
    let (width, height) = source.resolution();

    tracing::info!(
        "Temporal term: {}",
        if config.is_3d {
            format!("on, weight {}", config.energy_term_3d)
        } else {
            "off".to_string()
        }
    );

    let Some(first) = source.next_frame()? else {
        bail!("Sequence has no frames");
    };
    let hint = build_hint(&args.hint, width, height)?;
    let (refinement, segmenter) =
        segmentation::create_propagator(&ColorGrid::from_rgb(&first), &hint, config)
            .context("Failed to segment the first frame")?;
    tracing::info!(
        "First frame refined in {} rounds, foreground={:.1}%",
        refinement.rounds,
        refinement.mask.foreground_ratio() * 100.0
    );
    sink.write_frame(&first, &refinement.mask)?;

    run_pipeline(&mut source, &mut sink, segmenter)?;

    tracing::info!("Wrote {} frames", sink.frames_written());
    Ok(())
}

fn run_pipeline<S, O>(
    source: &mut S,
    sink: &mut O,
    mut segmenter: Box<dyn Segmenter>,
) -> Result<()>
where
    S: FrameSource,
    O: FrameSink,
{
    let mut frame_count = 0u64;
    let mut total_segment_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    while let Some(frame) = source.next_frame().context("Failed to read frame")? {
        let segment_start = Instant::now();
        let mask = segmenter
            .segment(&frame)
            .context("Failed to segment frame")?;
        total_segment_time += segment_start.elapsed();

        let output_start = Instant::now();
        sink.write_frame(&frame, &mask)
            .context("Failed to write frame")?;
        total_output_time += output_start.elapsed();

        frame_count += 1;

        // Log stats every 30 frames
        if frame_count % 30 == 0 {
            let avg_segment_ms = total_segment_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;
            tracing::info!(
                "Frame {}: segment={:.1}ms, output={:.1}ms, foreground={:.1}%",
                frame_count,
                avg_segment_ms,
                avg_output_ms,
                mask.foreground_ratio() * 100.0
            );
        }
    }

    Ok(())
}
