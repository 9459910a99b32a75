use std::path::PathBuf;

use clap::Parser;

use crate::io::source::RecordFilter;
use crate::junction::AnnotationColumns;

// ---------------------------------------------------------------------------
// Run mode enum
// ---------------------------------------------------------------------------

/// `--runMode` values, one per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Scan alignments region by region and count junctions
    Discover,
    /// Re-aggregate junction tables produced in separate batches
    Aggregate,
    /// Classify and normalize junctions against an annotation
    Normalize,
    /// Keep only junctions absent from the annotation
    Filter,
}

impl std::str::FromStr for RunMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discover" => Ok(Self::Discover),
            "aggregate" => Ok(Self::Aggregate),
            "normalize" => Ok(Self::Normalize),
            "filter" => Ok(Self::Filter),
            _ => Err(format!(
                "unknown runMode '{s}'; expected 'discover', 'aggregate', 'normalize' or 'filter'"
            )),
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discover => write!(f, "discover"),
            Self::Aggregate => write!(f, "aggregate"),
            Self::Normalize => write!(f, "normalize"),
            Self::Filter => write!(f, "filter"),
        }
    }
}

// ---------------------------------------------------------------------------
// Alignment source
// ---------------------------------------------------------------------------

/// `--alignmentSource`: how per-sample records are retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentSourceKind {
    /// Indexed BAM files queried through `samtools view`
    Samtools,
    /// Plain SAM text files
    Sam,
}

impl std::str::FromStr for AlignmentSourceKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "samtools" => Ok(Self::Samtools),
            "sam" => Ok(Self::Sam),
            _ => Err(format!("unknown alignmentSource value: '{s}'")),
        }
    }
}

impl std::fmt::Display for AlignmentSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Samtools => write!(f, "samtools"),
            Self::Sam => write!(f, "sam"),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotation format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationFormat {
    /// Delimited chrom/start/stop table
    Table,
    /// GTF exons, introns derived per transcript
    Gtf,
}

impl std::str::FromStr for AnnotationFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(Self::Table),
            "gtf" => Ok(Self::Gtf),
            _ => Err(format!("unknown annotationFormat value: '{s}'")),
        }
    }
}

impl std::fmt::Display for AnnotationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Gtf => write!(f, "gtf"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parameters struct
// ---------------------------------------------------------------------------

/// ruSplice command-line parameters, with `--camelCase` argument names.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ruSplice",
    about = "Splice junction discovery and annotation-relative normalization",
    version
)]
pub struct Parameters {
    // ── Run ─────────────────────────────────────────────────────────────
    /// Run mode: discover, aggregate, normalize or filter
    #[arg(long = "runMode", default_value = "discover")]
    pub run_mode: RunMode,

    /// Number of worker threads (regions processed in parallel)
    #[arg(long = "runThreadN", default_value_t = 1)]
    pub run_thread_n: usize,

    // ── Discovery input ─────────────────────────────────────────────────
    /// Region definition file: gene, transcript, -, chrom, start, stop, type
    #[arg(long = "regionFile")]
    pub region_file: Option<PathBuf>,

    /// Directory searched recursively for per-sample alignment files
    #[arg(long = "alignmentDir")]
    pub alignment_dir: Option<PathBuf>,

    /// Alignment source: samtools (indexed BAM) or sam (plain SAM text)
    #[arg(long = "alignmentSource", default_value = "samtools")]
    pub alignment_source: AlignmentSourceKind,

    /// samtools executable
    #[arg(long = "samtoolsCommand", default_value = "samtools")]
    pub samtools_command: String,

    /// Minimum mapping quality of a counted record
    #[arg(long = "minMapq", default_value_t = 60)]
    pub min_mapq: u8,

    /// SAM flag bits excluding a record (secondary, QC-fail, duplicate, supplementary)
    #[arg(long = "excludeFlags", default_value_t = 3840)]
    pub exclude_flags: u16,

    // ── Output ──────────────────────────────────────────────────────────
    /// Output directory
    #[arg(long = "outDir", default_value = "sjd_output")]
    pub out_dir: PathBuf,

    /// Keep per-region junction files after the final merge
    #[arg(long = "keepRegionFiles", default_value_t = false)]
    pub keep_region_files: bool,

    /// Explicit output file for aggregate, normalize and filter
    #[arg(long = "outFile")]
    pub out_file: Option<PathBuf>,

    // ── Aggregation / normalization input ───────────────────────────────
    /// Junction table(s) to re-aggregate or normalize
    #[arg(long = "junctionFilesIn", num_args = 1..)]
    pub junction_files_in: Vec<PathBuf>,

    /// Name stem of the re-aggregated table
    #[arg(long = "sampleSetId", default_value = "sample_set")]
    pub sample_set_id: String,

    // ── Annotation ──────────────────────────────────────────────────────
    /// Reference junction model
    #[arg(long = "annotationFile")]
    pub annotation_file: Option<PathBuf>,

    /// Annotation format: table or gtf
    #[arg(long = "annotationFormat", default_value = "table")]
    pub annotation_format: AnnotationFormat,

    /// Annotation file is gzip compressed (also detected from a .gz suffix)
    #[arg(long = "annotationGzipped", default_value_t = false)]
    pub annotation_gzipped: bool,

    /// Zero-based chromosome column of a table annotation
    #[arg(long = "annotationChromCol", default_value_t = 0)]
    pub annotation_chrom_col: usize,

    /// Zero-based junction start column of a table annotation
    #[arg(long = "annotationStartCol", default_value_t = 1)]
    pub annotation_start_col: usize,

    /// Zero-based junction stop column of a table annotation
    #[arg(long = "annotationStopCol", default_value_t = 2)]
    pub annotation_stop_col: usize,

    // ── Filter ──────────────────────────────────────────────────────────
    /// Normalized table to filter
    #[arg(long = "normalizedFile")]
    pub normalized_file: Option<PathBuf>,
}

impl Parameters {
    /// Filter handed to the alignment source
    pub fn record_filter(&self) -> RecordFilter {
        RecordFilter {
            min_mapq: self.min_mapq,
            exclude_flags: self.exclude_flags,
        }
    }

    pub fn annotation_columns(&self) -> AnnotationColumns {
        AnnotationColumns {
            chrom: self.annotation_chrom_col,
            start: self.annotation_start_col,
            stop: self.annotation_stop_col,
        }
    }

    /// Validate parameter combinations that clap alone cannot enforce.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        let require = |present: bool, flag: &str| {
            if present {
                Ok(())
            } else {
                Err(crate::error::Error::Parameter(format!(
                    "--{} is required when --runMode {}",
                    flag, self.run_mode
                )))
            }
        };

        match self.run_mode {
            RunMode::Discover => {
                require(self.region_file.is_some(), "regionFile")?;
                require(self.alignment_dir.is_some(), "alignmentDir")?;
            }
            RunMode::Aggregate => {
                require(!self.junction_files_in.is_empty(), "junctionFilesIn")?;
            }
            RunMode::Normalize => {
                require(!self.junction_files_in.is_empty(), "junctionFilesIn")?;
                require(self.annotation_file.is_some(), "annotationFile")?;
            }
            RunMode::Filter => {
                require(self.normalized_file.is_some(), "normalizedFile")?;
            }
        }

        // Thread count must be at least 1
        if self.run_thread_n == 0 {
            return Err(crate::error::Error::Parameter(
                "--runThreadN must be >= 1".into(),
            ));
        }

        let cols = self.annotation_columns();
        if cols.chrom == cols.start || cols.chrom == cols.stop || cols.start == cols.stop {
            return Err(crate::error::Error::Parameter(format!(
                "annotation columns must be distinct (chrom {}, start {}, stop {})",
                cols.chrom, cols.start, cols.stop
            )));
        }

        if self.sample_set_id.is_empty() || self.sample_set_id.contains('/') {
            return Err(crate::error::Error::Parameter(format!(
                "--sampleSetId '{}' is not a valid file name stem",
                self.sample_set_id
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
