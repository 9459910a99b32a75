/// Reference junction model and its position-tolerant membership set
///
/// Two input formats are understood:
/// - a delimited table with configurable zero-based chromosome/start/stop
///   columns (plain or gzip compressed)
/// - a GTF file, from which introns are derived between consecutive exons
///   of each transcript
use super::{SpliceJunction, canonical_chrom};
use crate::error::Error;
use crate::io::open_text;
use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

/// Zero-based columns of a delimited annotation table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationColumns {
    pub chrom: usize,
    pub start: usize,
    pub stop: usize,
}

impl Default for AnnotationColumns {
    fn default() -> Self {
        Self {
            chrom: 0,
            start: 1,
            stop: 2,
        }
    }
}

/// Known junctions plus their ±1 base tolerance variants.
///
/// Chromosome names are stored without a `chr` prefix; lookups canonicalise
/// the same way. Tolerance is baked in at insertion, lookup is exact.
#[derive(Debug, Clone, Default)]
pub struct AnnotatedJunctionSet {
    junctions: HashSet<SpliceJunction>,
    /// Reference entries inserted (before variant expansion)
    n_reference: usize,
}

impl AnnotatedJunctionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reference junction and all of its tolerance variants:
    /// `(s+k, e+k)` for k in -1..=1, `(s-1, e+1)` and `(s+1, e-1)`
    pub fn insert(&mut self, chrom: &str, start: u64, stop: u64) {
        let chrom = canonical_chrom(chrom);
        self.n_reference += 1;

        let shifted = [
            (start.checked_sub(1), stop.checked_sub(1)),
            (Some(start), Some(stop)),
            (Some(start + 1), Some(stop + 1)),
            (start.checked_sub(1), Some(stop + 1)),
            (Some(start + 1), stop.checked_sub(1)),
        ];

        for (s, e) in shifted {
            if let (Some(s), Some(e)) = (s, e) {
                self.junctions.insert(SpliceJunction::new(chrom, s, e));
            }
        }
    }

    /// Exact membership of the junction's canonical form
    pub fn contains(&self, junction: &SpliceJunction) -> bool {
        if junction.chrom.starts_with("chr") {
            self.junctions.contains(&junction.canonical())
        } else {
            self.junctions.contains(junction)
        }
    }

    /// Number of keys in the set, tolerance variants included
    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }

    /// Number of reference junctions the set was built from
    pub fn n_reference(&self) -> usize {
        self.n_reference
    }

    /// Build the set from tab-delimited lines
    ///
    /// Comment lines (`#`) and blank lines are ignored; lines with missing
    /// columns or non-numeric coordinates are logged and skipped.
    pub fn from_table_reader<R: BufRead>(reader: R, columns: AnnotationColumns) -> Result<Self, Error> {
        let mut set = Self::new();
        let mut n_skipped = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_table_line(line, columns) {
                Ok((chrom, start, stop)) => set.insert(chrom, start, stop),
                Err(e) => {
                    log::warn!("Skipping annotation line {}: {}", idx + 1, e);
                    n_skipped += 1;
                }
            }
        }

        if n_skipped > 0 {
            log::warn!("Skipped {} malformed annotation lines", n_skipped);
        }

        Ok(set)
    }

    /// Load a delimited annotation table (plain or gzip compressed)
    pub fn from_table(path: &Path, columns: AnnotationColumns, gzipped: bool) -> Result<Self, Error> {
        let reader = open_text(path, gzipped)?;
        Self::from_table_reader(reader, columns).map_err(|e| match e {
            Error::Io { source, .. } => Error::io(source, path),
            other => other,
        })
    }

    /// Load introns derived from a GTF file's exons
    pub fn from_gtf(path: &Path, gzipped: bool) -> Result<Self, Error> {
        let reader = open_text(path, gzipped)?;
        let exons = parse_gtf_exons(reader).map_err(|e| match e {
            Error::Io { source, .. } => Error::io(source, path),
            other => other,
        })?;

        let mut set = Self::new();
        for (chrom, start, stop) in introns_from_exons(exons) {
            set.insert(&chrom, start, stop);
        }
        Ok(set)
    }
}

fn parse_table_line(line: &str, columns: AnnotationColumns) -> Result<(&str, u64, u64), Error> {
    let fields: Vec<&str> = line.split('\t').collect();
    let field = |idx: usize| {
        fields.get(idx).map(|f| f.trim()).ok_or_else(|| {
            Error::Annotation(format!(
                "line has {} fields, column {} requested",
                fields.len(),
                idx
            ))
        })
    };

    let chrom = field(columns.chrom)?;
    let coord = |idx: usize| -> Result<u64, Error> {
        let raw = field(idx)?;
        raw.parse::<u64>()
            .map_err(|e| Error::Annotation(format!("invalid coordinate '{}': {}", raw, e)))
    };

    Ok((chrom, coord(columns.start)?, coord(columns.stop)?))
}

/// Exon feature of a GTF file
#[derive(Debug, Clone)]
struct GtfExon {
    seqname: String,
    start: u64,
    end: u64,
    transcript_id: String,
}

/// Read the exon features of a GTF file
///
/// Columns: seqname, source, feature, start, end, score, strand, frame,
/// attributes (`key "value";` pairs).
fn parse_gtf_exons<R: BufRead>(reader: R) -> Result<Vec<GtfExon>, Error> {
    let mut exons = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_gtf_line(line) {
            Ok(Some(exon)) => exons.push(exon),
            Ok(None) => {}
            Err(e) => log::warn!("Skipping malformed GTF line {}: {}", idx + 1, e),
        }
    }

    Ok(exons)
}

/// Parse one GTF line, keeping only exon features
fn parse_gtf_line(line: &str) -> Result<Option<GtfExon>, Error> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() < 9 {
        return Err(Error::Annotation(format!(
            "GTF line has {} fields, expected 9",
            fields.len()
        )));
    }

    if !fields[2].eq_ignore_ascii_case("exon") {
        return Ok(None);
    }

    let start = fields[3]
        .parse::<u64>()
        .map_err(|e| Error::Annotation(format!("Invalid start position: {}", e)))?;
    let end = fields[4]
        .parse::<u64>()
        .map_err(|e| Error::Annotation(format!("Invalid end position: {}", e)))?;

    let transcript_id = parse_attributes(fields[8])
        .remove("transcript_id")
        .ok_or_else(|| Error::Annotation("exon missing transcript_id attribute".to_string()))?;

    Ok(Some(GtfExon {
        seqname: fields[0].to_string(),
        start,
        end,
        transcript_id,
    }))
}

/// Parse a GTF attributes field: `key1 "value1"; key2 "value2";`
fn parse_attributes(attr_str: &str) -> HashMap<String, String> {
    attr_str
        .split(';')
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once(' ')?;
            Some((key.trim().to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}

/// Introns between consecutive exons of each transcript, as
/// `(chrom, exon_a.end + 1, exon_b.start)`: inclusive start, exclusive end
fn introns_from_exons(exons: Vec<GtfExon>) -> Vec<(String, u64, u64)> {
    let mut transcripts: HashMap<String, Vec<GtfExon>> = HashMap::new();
    for exon in exons {
        transcripts
            .entry(exon.transcript_id.clone())
            .or_default()
            .push(exon);
    }

    let mut introns = Vec::new();
    for (transcript_id, mut exons) in transcripts {
        exons.sort_by_key(|e| e.start);

        for pair in exons.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let start = a.end + 1;
            if b.start <= start {
                log::warn!(
                    "Skipping overlapping exons in {}: {}-{} / {}-{}",
                    transcript_id,
                    a.start,
                    a.end,
                    b.start,
                    b.end
                );
                continue;
            }
            introns.push((a.seqname.clone(), start, b.start));
        }
    }

    // Same intron is shared by many transcripts
    introns.sort_unstable();
    introns.dedup();
    introns
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_exact_and_variants() {
        let mut set = AnnotatedJunctionSet::new();
        set.insert("chr1", 1221, 1345);

        for (s, e) in [(1221, 1345), (1222, 1346), (1220, 1344), (1220, 1346), (1222, 1344)] {
            assert!(set.contains(&SpliceJunction::new("1", s, e)), "{s}-{e}");
        }
        assert_eq!(set.len(), 5);
        assert_eq!(set.n_reference(), 1);

        // Two-base shifts and one-sided shifts are not tolerated
        assert!(!set.contains(&SpliceJunction::new("1", 1223, 1347)));
        assert!(!set.contains(&SpliceJunction::new("1", 1221, 1346)));
        assert!(!set.contains(&SpliceJunction::new("2", 1221, 1345)));
    }

    #[test]
    fn test_flank_symmetry() {
        let mut set = AnnotatedJunctionSet::new();
        let refs = [("1", 100u64, 250u64), ("X", 5000, 7000), ("chr7", 2, 900)];
        for (c, s, e) in refs {
            set.insert(c, s, e);
        }

        for (c, s, e) in refs {
            for (ds, de) in [(0i64, 0i64), (1, 1), (-1, -1), (-1, 1), (1, -1)] {
                let j = SpliceJunction::new(c, (s as i64 + ds) as u64, (e as i64 + de) as u64);
                assert!(set.contains(&j), "{j}");
            }
        }
    }

    #[test]
    fn test_chr_prefix_lookup() {
        let mut set = AnnotatedJunctionSet::new();
        set.insert("2", 10, 20);
        assert!(set.contains(&SpliceJunction::new("chr2", 10, 20)));
        assert!(set.contains(&SpliceJunction::new("2", 10, 20)));
    }

    #[test]
    fn test_start_at_zero_does_not_underflow() {
        let mut set = AnnotatedJunctionSet::new();
        set.insert("1", 0, 10);
        assert!(set.contains(&SpliceJunction::new("1", 0, 10)));
        assert!(set.contains(&SpliceJunction::new("1", 1, 11)));
        assert!(set.contains(&SpliceJunction::new("1", 1, 9)));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_from_table_reader_custom_columns() {
        let data = "# header\nENSG1\tchr3\t.\t400\t800\nbad\tline\nENSG2\t3\t.\tx\t9\n\n";
        let columns = AnnotationColumns {
            chrom: 1,
            start: 3,
            stop: 4,
        };
        let set = AnnotatedJunctionSet::from_table_reader(Cursor::new(data), columns).unwrap();

        assert_eq!(set.n_reference(), 1);
        assert!(set.contains(&SpliceJunction::new("3", 400, 800)));
    }

    #[test]
    fn test_from_table_gzipped() {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let file = NamedTempFile::new().unwrap();
        let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::default());
        writeln!(encoder, "chr1\t100\t250").unwrap();
        writeln!(encoder, "1\t100\t360").unwrap();
        encoder.finish().unwrap();

        let set =
            AnnotatedJunctionSet::from_table(file.path(), AnnotationColumns::default(), true).unwrap();
        assert_eq!(set.n_reference(), 2);
        assert!(set.contains(&SpliceJunction::new("1", 101, 361)));
    }

    #[test]
    fn test_parse_attributes() {
        let attrs = parse_attributes(r#"gene_id "ENSG001"; transcript_id "ENST001"; gene_name "MYC";"#);
        assert_eq!(attrs.get("gene_id"), Some(&"ENSG001".to_string()));
        assert_eq!(attrs.get("transcript_id"), Some(&"ENST001".to_string()));
        assert_eq!(attrs.get("gene_name"), Some(&"MYC".to_string()));
    }

    #[test]
    fn test_parse_gtf_line_filters_non_exons() {
        let gene = "chr1\ttest\tgene\t50\t300\t.\t+\t.\tgene_id \"G1\";";
        assert!(parse_gtf_line(gene).unwrap().is_none());

        let exon = "chr1\ttest\texon\t100\t200\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";";
        let exon = parse_gtf_line(exon).unwrap().unwrap();
        assert_eq!(exon.start, 100);
        assert_eq!(exon.end, 200);
        assert_eq!(exon.transcript_id, "T1");

        assert!(parse_gtf_line("chr1\ttest\texon").is_err());
    }

    #[test]
    fn test_from_gtf() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "chr1\tt\texon\t300\t400\t.\t+\t.\ttranscript_id \"T1\";").unwrap();
        writeln!(file, "chr1\tt\texon\t100\t200\t.\t+\t.\ttranscript_id \"T1\";").unwrap();
        // Second transcript sharing the same intron
        writeln!(file, "chr1\tt\texon\t150\t200\t.\t+\t.\ttranscript_id \"T2\";").unwrap();
        writeln!(file, "chr1\tt\texon\t300\t350\t.\t+\t.\ttranscript_id \"T2\";").unwrap();
        // Single-exon transcript contributes nothing
        writeln!(file, "chr1\tt\texon\t900\t950\t.\t+\t.\ttranscript_id \"T3\";").unwrap();

        let set = AnnotatedJunctionSet::from_gtf(file.path(), false).unwrap();
        assert_eq!(set.n_reference(), 1);
        // Intron bases 201..=299 as inclusive start, exclusive end
        assert!(set.contains(&SpliceJunction::new("1", 201, 300)));
        assert!(!set.contains(&SpliceJunction::new("1", 900, 950)));
    }
}
