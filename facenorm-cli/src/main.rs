#![warn(unused_extern_crates)]
use anyhow::{Error, Result};
use clap::{Parser, Subcommand};
use facenorm_img::{Config, LandmarkSet, Preprocessor, draw};
use image::DynamicImage;
use num_cpus::get as get_cpu_count;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{Level, debug, error, info, span};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

mod batch;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CmdArgs {
    /// Config file to read from. Defaults are used if unset
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Align a single face image
    Align {
        /// Source photograph
        #[arg(short, long)]
        image: PathBuf,

        /// JSON array of 68 [x, y] landmark points
        #[arg(short, long)]
        landmarks: PathBuf,

        /// Where to write the aligned face
        #[arg(short, long)]
        output: PathBuf,

        /// Where to write the aligned face after photometric filtering
        #[arg(short, long)]
        filtered: Option<PathBuf>,

        /// Where to write the source image with landmarks drawn on it
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// Where to write the alignment matrix as JSON
        #[arg(long)]
        transform: Option<PathBuf>,

        /// Where to write the aligned face with the mapped eye centers marked
        #[arg(long, value_name = "FILE")]
        alignment_debug: Option<PathBuf>,
    },

    /// Align every image listed in a manifest, in parallel
    Batch {
        /// JSON list of {image, landmarks, output, filtered?} entries
        #[arg(short, long)]
        manifest: PathBuf,

        /// Max worker threads. Defaults to the number of CPUs
        #[arg(short = 't', long)]
        max_threads: Option<usize>,
    },

    /// Write the default configuration to a file
    InitConfig { path: PathBuf },
}

fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env();
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(filter)
        .init();

    let args = CmdArgs::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match args.command {
        Command::Align {
            image,
            landmarks,
            output,
            filtered,
            overlay,
            transform,
            alignment_debug,
        } => align_one(
            &config,
            &image,
            &landmarks,
            &output,
            Extras {
                filtered: filtered.as_deref(),
                overlay: overlay.as_deref(),
                transform: transform.as_deref(),
                alignment_debug: alignment_debug.as_deref(),
            },
        ),
        Command::Batch {
            manifest,
            max_threads,
        } => {
            let total_threads = get_cpu_count();
            let threads = max_threads.unwrap_or(total_threads).clamp(1, total_threads);
            batch::run(&config, &manifest, threads)
        }
        Command::InitConfig { path } => {
            config.save(&path)?;
            info!("Wrote config to {path:?}");
            Ok(())
        }
    }
}

/// Optional outputs of a single alignment.
struct Extras<'a> {
    filtered: Option<&'a Path>,
    overlay: Option<&'a Path>,
    transform: Option<&'a Path>,
    alignment_debug: Option<&'a Path>,
}

fn align_one(
    config: &Config,
    image_path: &Path,
    landmarks_path: &Path,
    output: &Path,
    extras: Extras,
) -> Result<()> {
    let span = span!(Level::INFO, "align_one");
    let _guard = span.enter();
    let start = Instant::now();

    let preprocessor = Preprocessor::new(config)?;
    let img = load_source(image_path)?;
    let landmarks = LandmarkSet::load(landmarks_path)?;

    if let Some(path) = extras.overlay {
        draw::draw_landmarks(&img, &landmarks).save(path)?;
        debug!("Landmark overlay at {path:?}");
    }

    let processed = match preprocessor.run(&img, &landmarks) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to align {image_path:?}: {e}");
            return Err(e.into());
        }
    };

    processed.alignment.image.save(output)?;
    info!("Aligned face at {output:?}");

    if let Some(path) = extras.filtered {
        processed.filtered.save(path)?;
        info!("Filtered face at {path:?}");
    }

    let alignment = &processed.alignment;
    if let Some(path) = extras.transform {
        std::fs::write(path, alignment.transform.to_json()?)?;
    }

    if let Some(path) = extras.alignment_debug {
        let eyes = [alignment.geometry.left_eye, alignment.geometry.right_eye];
        draw::draw_alignment(&alignment.image, &alignment.transform, eyes).save(path)?;
        debug!("Alignment markers at {path:?}");
    }

    debug!("Took {:?}", start.elapsed());
    Ok(())
}

/// Decodes a source image, rejecting unreadable or empty files before any
/// alignment work.
pub(crate) fn load_source(path: &Path) -> Result<DynamicImage> {
    let img = image::open(path).map_err(|e| {
        Error::new(facenorm_img::Error::SourceImageInvalid(format!(
            "{path:?}: {e}"
        )))
    })?;

    if img.width() == 0 || img.height() == 0 {
        return Err(Error::new(facenorm_img::Error::SourceImageInvalid(format!(
            "{path:?} is empty"
        ))));
    }

    Ok(img)
}
