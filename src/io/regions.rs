/// Region definition file parsing
///
/// Tab-delimited, one gene/transcript per line (7 columns):
/// 1. gene name
/// 2. transcript id
/// 3. (ignored)
/// 4. chromosome
/// 5. region start
/// 6. region stop
/// 7. gene type
///
/// A header line carrying a `CHROM` column is skipped.
use crate::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Number of tab-delimited columns in a region line
pub const REGION_FIELDS: usize = 7;

/// One unit of discovery work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRecord {
    pub gene: String,
    pub transcript_id: String,
    pub chrom: String,
    pub region_start: u64,
    pub region_stop: u64,
    pub gene_type: String,
}

impl GeneRecord {
    /// Check whether a 1-based position lies strictly inside the region
    pub fn contains(&self, position: u64) -> bool {
        self.region_start < position && position < self.region_stop
    }

    /// Region as `chrom:start-stop`
    pub fn locus(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.region_start, self.region_stop)
    }

    /// Stem used for this region's output file
    pub fn file_stem(&self) -> String {
        let sanitize = |s: &str| s.replace(['/', '\\'], "_");
        format!(
            "{}.{}",
            sanitize(&self.gene),
            sanitize(&self.transcript_id)
        )
    }
}

/// Check whether a line is the region file header
pub fn is_header(line: &str) -> bool {
    line.starts_with("CHROM") || line.split('\t').any(|field| field.trim() == "CHROM")
}

/// Parse a single region line
///
/// `line_num` is 1-based and only used for error reporting.
pub fn parse_region_line(line: &str, line_num: usize) -> Result<GeneRecord, Error> {
    let malformed = |reason: String| Error::MalformedRegionLine {
        line: line_num,
        reason,
    };

    let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split('\t').collect();
    if fields.len() < REGION_FIELDS {
        return Err(malformed(format!(
            "line has {} fields, expected {}",
            fields.len(),
            REGION_FIELDS
        )));
    }

    let coord = |idx: usize, name: &str| {
        fields[idx]
            .trim()
            .parse::<u64>()
            .map_err(|e| malformed(format!("invalid {} '{}': {}", name, fields[idx], e)))
    };
    let region_start = coord(4, "start")?;
    let region_stop = coord(5, "stop")?;

    if region_stop <= region_start {
        return Err(malformed(format!(
            "stop {} does not follow start {}",
            region_stop, region_start
        )));
    }

    let gene = fields[0].trim();
    let chrom = fields[3].trim();
    if gene.is_empty() || chrom.is_empty() {
        return Err(malformed("empty gene or chromosome".to_string()));
    }

    Ok(GeneRecord {
        gene: gene.to_string(),
        transcript_id: fields[1].trim().to_string(),
        chrom: chrom.to_string(),
        region_start,
        region_stop,
        gene_type: fields[6].trim().to_string(),
    })
}

/// Read a region file.
///
/// Malformed lines are returned as errors in place so the caller can report
/// and skip them without aborting the other regions.
pub fn read_regions(path: &Path) -> Result<Vec<Result<GeneRecord, Error>>, Error> {
    let file = File::open(path).map_err(|e| Error::io(e, path))?;
    let reader = BufReader::new(file);

    let mut regions = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::io(e, path))?;
        if line.trim().is_empty() || line.starts_with('#') || is_header(&line) {
            continue;
        }
        regions.push(parse_region_line(&line, idx + 1));
    }

    Ok(regions)
}
