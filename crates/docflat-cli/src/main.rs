// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docflat — flatten and enhance a photographed document
//
// Entry point. Initialises logging, decodes the photo in the background,
// seeds the corner editor, and writes the rectified, enhanced page.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use docflat_core::error::{DocflatError, Result};
use docflat_core::types::{CornerHypothesis, Point, Quadrilateral};
use docflat_core::{EnhanceMode, ScanConfig};
use docflat_document::{
    CornerDetector, EditorSession, FixedCorners, ImageProcessor, Readiness, ScanPipeline,
    decode_in_background,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "docflat")]
#[command(about = "Flatten a photographed document from four corner points and clean up its tone")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rectify and enhance one photo.
    Scan(ScanArgs),

    /// Write the default configuration as JSON.
    InitConfig {
        /// Destination file.
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct ScanArgs {
    /// Photo to flatten (JPEG, PNG, ...).
    input: PathBuf,

    /// Output file; `.jpg`/`.jpeg` writes JPEG, anything else goes by extension.
    #[arg(short, long)]
    output: PathBuf,

    /// Corners as `tlx,tly,trx,try,brx,bry,blx,bly` in source pixels.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    corners: Option<Vec<f64>>,

    /// Detector output as JSON (`topLeftCorner`, `topRightCorner`, ...).
    #[arg(long, conflicts_with = "corners")]
    corners_json: Option<PathBuf>,

    /// Configuration file (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the enhancement mode.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Override the JPEG quality (1-100).
    #[arg(long)]
    quality: Option<u8>,

    /// Also write the editor overlay (source plus corner outline) here.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Zoom used when rendering the overlay.
    #[arg(long, default_value = "1.0")]
    zoom: f64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Adaptive,
    Monochrome,
    Off,
}

impl From<ModeArg> for EnhanceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Adaptive => EnhanceMode::Adaptive,
            ModeArg::Monochrome => EnhanceMode::Monochrome,
            ModeArg::Off => EnhanceMode::Off,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Scan(args) => scan(args).await,
        Commands::InitConfig { path } => ScanConfig::default().save(&path).map(|()| {
            info!(path = %path.display(), "Default configuration written");
        }),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "docflat failed");
            ExitCode::FAILURE
        }
    }
}

async fn scan(args: ScanArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if let Some(quality) = args.quality {
        config.jpeg_quality = quality;
    }
    let pipeline = ScanPipeline::new(config)?;

    let bytes = std::fs::read(&args.input)?;
    info!(path = %args.input.display(), bytes = bytes.len(), "Photo read");
    let mut decode = decode_in_background(bytes);

    let mut detector = corner_source(&args)?.map(|hypothesis| {
        let detector: Arc<dyn CornerDetector> = Arc::new(FixedCorners(hypothesis));
        Readiness::resolved(detector)
    });
    let mut session = pipeline.open_session(&mut decode, detector.as_mut()).await?;

    if session.quadrilateral().is_none() {
        let (width, height) = session.source().dimensions();
        warn!(width, height, "No corners given; using the whole frame");
        session.define_quadrilateral(full_frame(width, height))?;
    }

    if let Some(path) = &args.overlay {
        write_overlay(&mut session, args.zoom, path)?;
    }

    let output = pipeline.finish(&session)?;
    output.save(&args.output)?;
    info!(
        path = %args.output.display(),
        width = output.image().width(),
        height = output.image().height(),
        "Page written"
    );
    Ok(())
}

/// Corners from `--corners` or `--corners-json`, if either was given.
fn corner_source(args: &ScanArgs) -> Result<Option<CornerHypothesis>> {
    if let Some(values) = &args.corners {
        let [tl_x, tl_y, tr_x, tr_y, br_x, br_y, bl_x, bl_y] = values[..] else {
            return Err(DocflatError::Config(format!(
                "--corners needs 8 numbers, got {}",
                values.len()
            )));
        };
        return Ok(Some(CornerHypothesis {
            top_left_corner: Point::new(tl_x, tl_y),
            top_right_corner: Point::new(tr_x, tr_y),
            bottom_right_corner: Point::new(br_x, br_y),
            bottom_left_corner: Point::new(bl_x, bl_y),
        }));
    }
    if let Some(path) = &args.corners_json {
        let text = std::fs::read_to_string(path)?;
        return Ok(Some(serde_json::from_str(&text)?));
    }
    Ok(None)
}

fn full_frame(width: u32, height: u32) -> Quadrilateral {
    let (w, h) = (width as f64, height as f64);
    Quadrilateral::new(
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    )
}

fn write_overlay(session: &mut EditorSession, zoom: f64, path: &Path) -> Result<()> {
    session.set_zoom(zoom)?;
    ImageProcessor::from_rgba(session.render()).save(path)?;
    info!(path = %path.display(), zoom, "Overlay written");
    Ok(())
}
