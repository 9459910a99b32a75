/// Discovery pass: regions fanned out over a worker pool
///
/// Each region is scanned for every sample, folded into one junction table
/// and written to its own file under `<outDir>/regions/`. A failing region is
/// logged and counted without stopping the others. A single-threaded
/// finalization then concatenates the region files, in file-name order, into
/// `<outDir>/final.txt`.
use crate::error::Error;
use crate::io::regions::{GeneRecord, read_regions};
use crate::io::source::{AlignmentSource, SamFile, SampleInput, SamtoolsView, discover_samples};
use crate::io::table::{junction_header, write_junction_file};
use crate::junction::{GeneLabel, JunctionTable, count_region_junctions};
use crate::params::{AlignmentSourceKind, Parameters};
use crate::stats::{RunStats, ScanStats};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Name of the merged output inside `--outDir`
pub const FINAL_FILE_NAME: &str = "final.txt";
/// Sub-directory of `--outDir` holding per-region files
pub const REGION_DIR_NAME: &str = "regions";
/// Suffix of per-region files
pub const REGION_FILE_SUFFIX: &str = ".junctions.txt";

/// What one successfully processed region produced
#[derive(Debug, Clone)]
pub struct RegionOutcome {
    pub path: PathBuf,
    pub n_junctions: usize,
    pub scan: ScanStats,
}

/// Scan one region across all samples and fold the counts.
///
/// Samples are scanned in the given order; the table carries every sample
/// as a column, including those without junctions in this region.
pub fn scan_region(
    region: &GeneRecord,
    samples: &[SampleInput],
    source: &dyn AlignmentSource,
) -> Result<(JunctionTable, ScanStats), Error> {
    let label = GeneLabel::new(region.gene.as_str(), region.gene_type.as_str());
    let mut table = JunctionTable::with_samples(samples.iter().map(|s| s.id.as_str()));
    let mut scan = ScanStats::new();

    for sample in samples {
        let lines = source.fetch(sample, region)?;
        let counts = count_region_junctions(region, &lines, &mut scan);
        debug!(
            "{} {}: {} junctions from {} lines",
            region.gene,
            sample.id,
            counts.len(),
            lines.len()
        );
        table.fold(&sample.id, &label, &counts);
    }

    Ok((table, scan))
}

/// Scan one region and write its junction file into `region_dir`
pub fn process_region(
    region: &GeneRecord,
    samples: &[SampleInput],
    source: &dyn AlignmentSource,
    region_dir: &Path,
) -> Result<RegionOutcome, Error> {
    let (table, scan) = scan_region(region, samples, source)?;

    let path = region_dir.join(format!("{}{}", region.file_stem(), REGION_FILE_SUFFIX));
    let n_junctions = write_junction_file(&path, &table)?;

    if scan.malformed_records > 0 {
        debug!(
            "{}: skipped {} malformed records",
            region.locus(),
            scan.malformed_records
        );
    }

    Ok(RegionOutcome {
        path,
        n_junctions,
        scan,
    })
}

/// Concatenate region files under one header, in file-name order.
///
/// Each region file's own header line is dropped. Returns the number of
/// junction rows written.
pub fn merge_region_files(
    files: &[PathBuf],
    samples: &[String],
    final_path: &Path,
) -> Result<usize, Error> {
    let mut files = files.to_vec();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let out = File::create(final_path).map_err(|e| Error::io(e, final_path))?;
    let mut writer = BufWriter::new(out);
    writeln!(writer, "{}", junction_header(samples)).map_err(|e| Error::io(e, final_path))?;

    let mut n_rows = 0;
    for (i, path) in files.iter().enumerate() {
        debug!("({}/{}) adding data from {}", i + 1, files.len(), path.display());

        let reader = BufReader::new(File::open(path).map_err(|e| Error::io(e, path))?);
        for line in reader.lines().skip(1) {
            let line = line.map_err(|e| Error::io(e, path))?;
            if line.is_empty() {
                continue;
            }
            writeln!(writer, "{}", line).map_err(|e| Error::io(e, final_path))?;
            n_rows += 1;
        }
    }

    writer.flush().map_err(|e| Error::io(e, final_path))?;
    Ok(n_rows)
}

fn build_source(params: &Parameters) -> Box<dyn AlignmentSource> {
    match params.alignment_source {
        AlignmentSourceKind::Samtools => Box::new(SamtoolsView::new(
            params.samtools_command.as_str(),
            params.record_filter(),
        )),
        AlignmentSourceKind::Sam => Box::new(SamFile::new(params.record_filter())),
    }
}

/// Run the discovery pass
pub fn run_discover(params: &Parameters) -> Result<RunStats, Error> {
    let region_file = params
        .region_file
        .as_deref()
        .ok_or_else(|| Error::Parameter("--regionFile is required".into()))?;
    let alignment_dir = params
        .alignment_dir
        .as_deref()
        .ok_or_else(|| Error::Parameter("--alignmentDir is required".into()))?;

    let final_path = params.out_dir.join(FINAL_FILE_NAME);
    if final_path.exists() {
        return Err(Error::Parameter(format!(
            "File already exists: {}. Please delete to rerun.",
            final_path.display()
        )));
    }

    let source = build_source(params);
    let samples = discover_samples(alignment_dir, source.extension())?;
    if samples.is_empty() {
        return Err(Error::Parameter(format!(
            "no .{} files found under {}",
            source.extension(),
            alignment_dir.display()
        )));
    }
    let sample_ids: Vec<String> = samples.iter().map(|s| s.id.clone()).collect();
    info!("Found {} samples: {}", samples.len(), sample_ids.join(", "));

    let regions = read_regions(region_file)?;
    info!("Read {} regions from {}", regions.len(), region_file.display());

    let region_dir = params.out_dir.join(REGION_DIR_NAME);
    std::fs::create_dir_all(&region_dir).map_err(|e| Error::io(e, &region_dir))?;

    let mut stats = RunStats::new();

    // Malformed lines and repeated output names never reach the pool
    let mut seen_stems = HashSet::new();
    let mut work = Vec::with_capacity(regions.len());
    for region in regions {
        match region {
            Ok(region) => {
                if seen_stems.insert(region.file_stem()) {
                    work.push(region);
                } else {
                    warn!(
                        "Skipping duplicate region {} ({})",
                        region.file_stem(),
                        region.locus()
                    );
                    stats.record_failed();
                }
            }
            Err(e) => {
                warn!("Skipping region: {}", e);
                stats.record_failed();
            }
        }
    }

    info!(
        ">> Discovering splice junctions across {} regions with {} threads",
        work.len(),
        params.run_thread_n
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(params.run_thread_n)
        .build()
        .map_err(|e| Error::Parameter(format!("failed to build thread pool: {}", e)))?;

    let source_ref: &dyn AlignmentSource = source.as_ref();
    let outcomes: Vec<(&GeneRecord, Result<RegionOutcome, Error>)> = pool.install(|| {
        work.par_iter()
            .map(|region| {
                (
                    region,
                    process_region(region, &samples, source_ref, &region_dir),
                )
            })
            .collect()
    });

    let mut written = Vec::with_capacity(outcomes.len());
    for (region, outcome) in outcomes {
        match outcome {
            Ok(outcome) => {
                stats.record_processed(outcome.n_junctions, outcome.scan);
                written.push(outcome.path);
            }
            Err(e) => {
                warn!("Region {} ({}) failed: {}", region.gene, region.locus(), e);
                stats.record_failed();
            }
        }
    }

    info!(">> Combining all data into final file: {}", final_path.display());
    let n_rows = merge_region_files(&written, &sample_ids, &final_path)?;
    info!("Wrote {} junctions to {}", n_rows, final_path.display());

    if !params.keep_region_files {
        for path in &written {
            std::fs::remove_file(path).map_err(|e| Error::io(e, path))?;
        }
        if let Err(e) = std::fs::remove_dir(&region_dir) {
            debug!("Leaving {}: {}", region_dir.display(), e);
        }
    }

    stats.print_summary();
    Ok(stats)
}
