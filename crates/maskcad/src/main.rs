//! maskcad: convert segmentation masks into a layered DXF drawing.
//!
//! Reads a manifest listing the source image size and the mask files
//! produced by a segmentation model, runs every mask through the
//! clean / extract / simplify / transform / classify pipeline and writes
//! one DXF file. The configuration is checked before any mask is read.
//! Per-mask failures, including masks that cannot be loaded, are reported
//! but do not stop the run.
//!
//! # Usage
//!
//! ```text
//! maskcad [OPTIONS] --output <OUTPUT> <MANIFEST>
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `info`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use maskcad_export::{CancelToken, ExportConfig, ExportError, Units, assemble_batch, to_svg};
use maskcad_io::{IoError, load_config, load_manifest, write_atomic};
use maskcad_pipeline::{LayerConfig, SimplifyTolerance, area_bands, score_bands};
use tracing_subscriber::EnvFilter;

/// Convert segmentation masks into a layered DXF drawing.
#[derive(Parser)]
#[command(name = "maskcad")]
struct Cli {
    /// Manifest JSON listing the image size and mask files.
    manifest: PathBuf,

    /// Output DXF file.
    #[arg(short, long)]
    output: PathBuf,

    /// Export configuration JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// DXF version (R12, R2000, R2010, R2018).
    #[arg(long = "version", value_name = "VERSION")]
    dxf_version: Option<String>,

    /// Drawing units (unitless, in, ft, mm, cm, m).
    #[arg(long)]
    units: Option<Units>,

    /// CAD units per pixel.
    #[arg(long, allow_hyphen_values = true)]
    scale: Option<f64>,

    /// Pixel X offset subtracted before scaling.
    #[arg(long, allow_hyphen_values = true)]
    offset_x: Option<f64>,

    /// Pixel Y offset subtracted before scaling.
    #[arg(long, allow_hyphen_values = true)]
    offset_y: Option<f64>,

    /// Simplification tolerance in pixels.
    #[arg(long)]
    epsilon: Option<f64>,

    /// Replace the configured layer rules with a preset.
    #[arg(long, value_enum)]
    layer_preset: Option<LayerPreset>,

    /// Layer name prefix for presets.
    #[arg(long, default_value = "MASKCAD")]
    layer_prefix: String,

    /// Label each region with its mask label.
    #[arg(long)]
    annotate: bool,

    /// Label height in drawing units.
    #[arg(long)]
    text_height: Option<f64>,

    /// Worker threads.
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    workers: Option<usize>,

    /// Also write an SVG preview.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Layer rule presets.
#[derive(Clone, Copy, ValueEnum)]
enum LayerPreset {
    /// Layers by polygon area.
    Area,
    /// Layers by model confidence.
    Score,
    /// Everything on the default layer.
    #[value(name = "none")]
    Off,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Build the export configuration: the `--config` file (or defaults)
/// with command-line overrides applied.
fn config_from_cli(cli: &Cli) -> Result<ExportConfig, IoError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ExportConfig::default(),
    };

    if let Some(version) = &cli.dxf_version {
        config.dxf_version.clone_from(version);
    }
    if let Some(units) = cli.units {
        config.units = units;
    }
    if let Some(scale) = cli.scale {
        config.pipeline.transform.scale = scale;
    }
    if let Some(offset_x) = cli.offset_x {
        config.pipeline.transform.offset_x = offset_x;
    }
    if let Some(offset_y) = cli.offset_y {
        config.pipeline.transform.offset_y = offset_y;
    }
    if let Some(epsilon) = cli.epsilon {
        config.pipeline.simplify = SimplifyTolerance::Pixels(epsilon);
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if cli.annotate {
        config.annotate = true;
    }
    if let Some(text_height) = cli.text_height {
        config.text_height = text_height;
    }
    match cli.layer_preset {
        Some(LayerPreset::Area) => config.pipeline.layers.rules = area_bands(&cli.layer_prefix),
        Some(LayerPreset::Score) => config.pipeline.layers.rules = score_bands(&cli.layer_prefix),
        Some(LayerPreset::Off) => config.pipeline.layers = LayerConfig::default(),
        None => {}
    }
    Ok(config)
}

fn title_of(manifest: &Path) -> Option<String> {
    manifest
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let mut config = config_from_cli(cli)?;
    if config.metadata.title.is_none() {
        config.metadata.title = title_of(&cli.manifest);
    }

    let manifest = load_manifest(&cli.manifest)?;
    config.validate(manifest.image)?;
    let masks = manifest.load_masks();

    let (document, report) = assemble_batch(
        &masks,
        manifest.image,
        &config,
        &config.pipeline.extractor,
        &CancelToken::new(),
    )?;

    let svg = cli.svg.as_ref().map(|path| (path, to_svg(&document)));
    let bytes = document.serialize().map_err(ExportError::from)?;
    write_atomic(&cli.output, &bytes)?;
    tracing::info!(path = %cli.output.display(), bytes = bytes.len(), "DXF written");

    if let Some((path, svg)) = svg {
        write_atomic(path, svg.as_bytes())?;
        tracing::info!(path = %path.display(), bytes = svg.len(), "SVG preview written");
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.report());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
