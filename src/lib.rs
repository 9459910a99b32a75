#![allow(non_snake_case)]

pub mod error;
pub mod params;
pub mod stats;

pub mod align;
pub mod io;
pub mod junction;
pub mod pipeline;

use log::info;

use crate::params::{Parameters, RunMode};

/// Top-level dispatcher. Called from `main()` after CLI parsing.
pub fn run(params: &Parameters) -> anyhow::Result<()> {
    params.validate()?;

    info!("ruSplice v{}", env!("CARGO_PKG_VERSION"));
    info!("runMode: {}", params.run_mode);

    match params.run_mode {
        RunMode::Discover => discover(params),
        RunMode::Aggregate => aggregate(params),
        RunMode::Normalize => normalize(params),
        RunMode::Filter => filter(params),
    }
}

fn discover(params: &Parameters) -> anyhow::Result<()> {
    info!("runThreadN: {}", params.run_thread_n);
    if let Some(path) = &params.region_file {
        info!("regionFile: {}", path.display());
    }
    if let Some(dir) = &params.alignment_dir {
        info!("alignmentDir: {} ({})", dir.display(), params.alignment_source);
    }
    info!(
        "minMapq: {}, excludeFlags: {}",
        params.min_mapq, params.exclude_flags
    );
    info!("outDir: {}", params.out_dir.display());

    let stats = pipeline::discover::run_discover(params)?;
    if stats.regions_processed == 0 && stats.regions_total > 0 {
        anyhow::bail!("all {} regions failed", stats.regions_total);
    }

    info!("Discovery complete!");
    Ok(())
}

fn aggregate(params: &Parameters) -> anyhow::Result<()> {
    info!(
        "junctionFilesIn: {:?}",
        params
            .junction_files_in
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
    );

    let out = pipeline::aggregate::run_aggregate(params)?;
    info!("Aggregation complete: {}", out.display());
    Ok(())
}

fn normalize(params: &Parameters) -> anyhow::Result<()> {
    if let Some(path) = &params.annotation_file {
        info!(
            "annotationFile: {} ({})",
            path.display(),
            params.annotation_format
        );
    }

    let out = pipeline::normalize::run_normalize(params)?;
    info!("Normalization complete: {}", out.display());
    Ok(())
}

fn filter(params: &Parameters) -> anyhow::Result<()> {
    pipeline::filter::run_filter(params)?;
    info!("Filtering complete!");
    Ok(())
}
