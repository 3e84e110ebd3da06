use crate::load_source;
use anyhow::{Error, Result};
use facenorm_img::{Config, LandmarkSet, Preprocessor, Processed};
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{Level, info, span, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    pub image: PathBuf,
    pub landmarks: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub filtered: Option<PathBuf>,
}

/// Manifest paths are relative to the manifest's own directory.
pub fn read_manifest(path: &Path) -> Result<Vec<Entry>> {
    let mut entries: Vec<Entry> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let base = path.parent().unwrap_or(Path::new("."));

    for e in entries.iter_mut() {
        e.image = base.join(&e.image);
        e.landmarks = base.join(&e.landmarks);
        e.output = base.join(&e.output);
        e.filtered = e.filtered.as_ref().map(|f| base.join(f));
    }

    Ok(entries)
}

pub fn run(config: &Config, manifest: &Path, threads: usize) -> Result<()> {
    let span = span!(Level::INFO, "batch");
    let _guard = span.enter();
    let start = Instant::now();

    let entries = read_manifest(manifest)?;
    let preprocessor = Preprocessor::new(config)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;
    info!("Processing {} images on {threads} threads", entries.len());

    // each source is dropped as soon as its outputs are written
    let failures = pool.install(|| {
        entries
            .par_iter()
            .filter(|entry| match process(&preprocessor, entry) {
                Ok(()) => false,
                Err(e) => {
                    warn!("Failed to align {:?}: {e:#}", entry.image);
                    true
                }
            })
            .count()
    });

    info!(
        "Aligned {} of {} images in {:?}",
        entries.len() - failures,
        entries.len(),
        start.elapsed()
    );

    if failures > 0 {
        return Err(Error::msg(format!("{failures} image(s) failed")));
    }

    Ok(())
}

fn process(preprocessor: &Preprocessor, entry: &Entry) -> Result<()> {
    let image = load_source(&entry.image)?;
    let landmarks = LandmarkSet::load(&entry.landmarks)?;
    let processed = preprocessor.run(&image, &landmarks)?;
    save(entry, &processed)
}

fn save(entry: &Entry, processed: &Processed) -> Result<()> {
    processed.alignment.image.save(&entry.output)?;
    if let Some(path) = &entry.filtered {
        processed.filtered.save(path)?;
    }
    Ok(())
}
