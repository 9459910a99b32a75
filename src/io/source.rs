/// Per-sample alignment retrieval
///
/// The counter only sees tab-delimited SAM lines for one region; how they
/// are obtained is up to an `AlignmentSource`:
/// - `SamtoolsView` queries an indexed BAM through `samtools view`
/// - `SamFile` scans a plain (optionally gzipped) SAM text file
///
/// Both apply the same contract: mapping quality floor and flag mask.
use crate::error::Error;
use crate::io::open_text;
use crate::io::regions::GeneRecord;
use crate::junction::canonical_chrom;
use noodles::sam;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::Command;

/// One sample's alignment file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SampleInput {
    pub id: String,
    pub path: PathBuf,
}

impl SampleInput {
    /// Sample id is the file name with its extension removed
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let name = file_name.strip_suffix(".gz").unwrap_or(file_name);
        let id = name
            .rsplit_once('.')
            .map_or(name, |(stem, _)| stem)
            .to_string();
        Some(Self { id, path })
    }
}

/// Filters every retrieval applies before records reach the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFilter {
    pub min_mapq: u8,
    /// Records with any of these flag bits set are dropped
    pub exclude_flags: u16,
}

impl RecordFilter {
    pub fn accepts(&self, flag: u16, mapq: u8) -> bool {
        flag & self.exclude_flags == 0 && mapq >= self.min_mapq
    }
}

/// Retrieves one sample's alignment lines for one region
pub trait AlignmentSource: Sync {
    /// File extension (without dot) of this source's inputs
    fn extension(&self) -> &'static str;

    fn fetch(&self, sample: &SampleInput, region: &GeneRecord) -> Result<Vec<String>, Error>;
}

/// `samtools view` on indexed BAM files
#[derive(Debug, Clone)]
pub struct SamtoolsView {
    pub command: String,
    pub filter: RecordFilter,
}

impl SamtoolsView {
    pub fn new(command: impl Into<String>, filter: RecordFilter) -> Self {
        Self {
            command: command.into(),
            filter,
        }
    }

    /// Region strings requested for one region: both `chr`-prefixed and
    /// bare names, so either BAM naming convention matches
    pub fn region_args(region: &GeneRecord) -> [String; 2] {
        let chrom = canonical_chrom(&region.chrom);
        [
            format!("chr{}:{}-{}", chrom, region.region_start, region.region_stop),
            format!("{}:{}-{}", chrom, region.region_start, region.region_stop),
        ]
    }
}

impl AlignmentSource for SamtoolsView {
    fn extension(&self) -> &'static str {
        "bam"
    }

    fn fetch(&self, sample: &SampleInput, region: &GeneRecord) -> Result<Vec<String>, Error> {
        let output = Command::new(&self.command)
            .arg("view")
            .arg("-F")
            .arg(self.filter.exclude_flags.to_string())
            .arg("-q")
            .arg(self.filter.min_mapq.to_string())
            .arg(&sample.path)
            .args(Self::region_args(region))
            .output()
            .map_err(|e| {
                Error::Retrieval(format!("failed to run '{}': {}", self.command, e))
            })?;

        if !output.status.success() {
            return Err(Error::Retrieval(format!(
                "'{} view' on {} for {} exited with {}: {}",
                self.command,
                sample.path.display(),
                region.locus(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }
}

/// Plain SAM text files, scanned in full for every region
#[derive(Debug, Clone)]
pub struct SamFile {
    pub filter: RecordFilter,
}

impl SamFile {
    pub fn new(filter: RecordFilter) -> Self {
        Self { filter }
    }

    /// Whether a line passes the chromosome, flag and MAPQ filters.
    ///
    /// Lines noodles cannot read are kept; the counter's tolerance policy
    /// decides what to do with them. A missing MAPQ (255) counts as 255.
    fn keep(&self, line: &str, chrom: &str) -> bool {
        let mut reader = sam::io::Reader::new(line.as_bytes());
        let mut record = sam::Record::default();
        match reader.read_record(&mut record) {
            Ok(n) if n > 0 => {}
            _ => return true,
        }

        match record.reference_sequence_name() {
            Some(name) if canonical_chrom(&String::from_utf8_lossy(name)) == chrom => {}
            _ => return false,
        }

        let flags = match record.flags() {
            Ok(flags) => flags.bits(),
            Err(_) => return true,
        };
        let mapq = match record.mapping_quality() {
            Some(Ok(mapq)) => mapq.get(),
            Some(Err(_)) => return true,
            None => u8::MAX,
        };

        self.filter.accepts(flags, mapq)
    }
}

impl AlignmentSource for SamFile {
    fn extension(&self) -> &'static str {
        "sam"
    }

    fn fetch(&self, sample: &SampleInput, region: &GeneRecord) -> Result<Vec<String>, Error> {
        let reader = open_text(&sample.path, false)?;
        let chrom = canonical_chrom(&region.chrom);

        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| Error::io(e, &sample.path))?;
            if line.starts_with('@') || line.trim().is_empty() {
                continue;
            }
            if self.keep(&line, chrom) {
                lines.push(line);
            }
        }

        Ok(lines)
    }
}

/// Find per-sample inputs under `dir` (recursively) with the given extension
/// (optionally gzipped), sorted by sample id
pub fn discover_samples(dir: &Path, extension: &str) -> Result<Vec<SampleInput>, Error> {
    let mut samples = Vec::new();
    collect_samples(dir, extension, &mut samples)?;
    samples.sort();

    for pair in samples.windows(2) {
        if pair[0].id == pair[1].id {
            return Err(Error::Parameter(format!(
                "sample id '{}' is used by both {} and {}",
                pair[0].id,
                pair[0].path.display(),
                pair[1].path.display()
            )));
        }
    }

    Ok(samples)
}

fn collect_samples(dir: &Path, extension: &str, samples: &mut Vec<SampleInput>) -> Result<(), Error> {
    let suffix = format!(".{}", extension);
    let gz_suffix = format!(".{}.gz", extension);

    for entry in std::fs::read_dir(dir).map_err(|e| Error::io(e, dir))? {
        let path = entry.map_err(|e| Error::io(e, dir))?.path();

        if path.is_dir() {
            collect_samples(&path, extension, samples)?;
            continue;
        }

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.ends_with(&suffix) || name.ends_with(&gz_suffix) {
            if let Some(sample) = SampleInput::from_path(path) {
                samples.push(sample);
            }
        }
    }

    Ok(())
}
