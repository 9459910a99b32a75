/// Normalization pass
use crate::error::Error;
use crate::io::table::{read_junction_rows, write_normalized_file};
use crate::junction::normalize::normalize_rows;
use crate::junction::{AnnotatedJunctionSet, AnnotationTag, JunctionRows, NormalizedRow};
use crate::params::{AnnotationFormat, Parameters};
use crate::pipeline::aggregate::load_combined;
use crate::pipeline::output_path;
use log::info;
use std::path::{Path, PathBuf};

/// Default output name inside `--outDir`
pub const NORMALIZED_FILE_NAME: &str = "normalized.txt";

/// Rows per annotation tag
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TagCounts {
    pub both: usize,
    pub one: usize,
    pub neither: usize,
    pub seen_before: usize,
}

impl TagCounts {
    pub fn tally(rows: &[NormalizedRow]) -> Self {
        let mut counts = Self::default();
        for row in rows {
            match row.tag {
                AnnotationTag::Both => counts.both += 1,
                AnnotationTag::One => counts.one += 1,
                AnnotationTag::Neither => counts.neither += 1,
            }
            if row.seen_before {
                counts.seen_before += 1;
            }
        }
        counts
    }
}

/// Load the reference junction model named by the parameters
pub fn load_annotation(params: &Parameters) -> Result<AnnotatedJunctionSet, Error> {
    let path = params
        .annotation_file
        .as_deref()
        .ok_or_else(|| Error::Parameter("--annotationFile is required".into()))?;

    let set = match params.annotation_format {
        AnnotationFormat::Table => AnnotatedJunctionSet::from_table(
            path,
            params.annotation_columns(),
            params.annotation_gzipped,
        )?,
        AnnotationFormat::Gtf => AnnotatedJunctionSet::from_gtf(path, params.annotation_gzipped)?,
    };

    if set.is_empty() {
        return Err(Error::Annotation(format!(
            "no junctions could be read from {}",
            path.display()
        )));
    }

    info!(
        "Loaded {} annotated junctions ({} with tolerance variants) from {}",
        set.n_reference(),
        set.len(),
        path.display()
    );
    Ok(set)
}

/// Rows to normalize: a single table as written, several re-aggregated
pub fn load_rows(paths: &[PathBuf]) -> Result<JunctionRows, Error> {
    match paths {
        [single] => read_junction_rows(single),
        _ => Ok(JunctionRows::from_table(&load_combined(paths)?)),
    }
}

/// Normalize rows and write them to `out`
pub fn normalize_to_file(
    rows: &JunctionRows,
    annotated: &AnnotatedJunctionSet,
    out: &Path,
) -> Result<TagCounts, Error> {
    let normalized = normalize_rows(rows, annotated);
    write_normalized_file(out, &rows.samples, &normalized)?;
    Ok(TagCounts::tally(&normalized))
}

/// Run the normalization pass
pub fn run_normalize(params: &Parameters) -> Result<PathBuf, Error> {
    let annotated = load_annotation(params)?;
    let rows = load_rows(&params.junction_files_in)?;
    let out = output_path(params.out_file.as_deref(), &params.out_dir, NORMALIZED_FILE_NAME)?;

    let counts = normalize_to_file(&rows, &annotated, &out)?;

    info!("=== Normalization Summary ===");
    info!("Junction rows: {}", rows.len());
    info!("Both annotated: {}", counts.both);
    info!("One annotated: {}", counts.one);
    info!("Neither annotated: {}", counts.neither);
    info!("Seen in transcripts list: {}", counts.seen_before);
    info!("Output: {}", out.display());

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::table::junction_header;
    use crate::junction::{GeneLabel, JunctionTable, SpliceJunction};
    use tempfile::TempDir;

    #[test]
    fn test_normalize_to_file_counts_tags() {
        let label = GeneLabel::new("G", "pc");
        let mut table = JunctionTable::with_samples(["A"]);
        table.add_count(SpliceJunction::new("1", 100, 200), &label, "A", 4);
        table.add_count(SpliceJunction::new("1", 100, 300), &label, "A", 2);
        table.add_count(SpliceJunction::new("1", 700, 800), &label, "A", 1);

        let mut annotated = AnnotatedJunctionSet::new();
        annotated.insert("chr1", 100, 200);

        let dir = TempDir::new().unwrap();
        let out = dir.path().join(NORMALIZED_FILE_NAME);
        let counts = normalize_to_file(&JunctionRows::from_table(&table), &annotated, &out).unwrap();

        assert_eq!(
            counts,
            TagCounts {
                both: 1,
                one: 1,
                neither: 1,
                seen_before: 1
            }
        );
        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.contains("1\t100\t300\t2\t1\t2\tOne annotated\t0\t0.5"));
    }

    #[test]
    fn test_single_file_is_not_reaggregated() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("final.txt");
        std::fs::write(
            &input,
            format!(
                "{}\n\
                 GENE_A\tpc\t1\t100\t200\t5\t1\t5\n\
                 GENE_B\tpc\t1\t100\t200\t5\t1\t5\n",
                junction_header(&["S1".to_string()])
            ),
        )
        .unwrap();

        let rows = load_rows(&[input.clone()]).unwrap();
        assert_eq!(rows.len(), 2);

        let mut annotated = AnnotatedJunctionSet::new();
        annotated.insert("1", 100, 200);
        let out = dir.path().join(NORMALIZED_FILE_NAME);
        let counts = normalize_to_file(&rows, &annotated, &out).unwrap();
        assert_eq!(counts.both, 2);

        let content = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "GENE_A\tpc\t1\t100\t200\t5\t1\t5\tBoth annotated\t1\t1.0");
        assert_eq!(lines[2], "GENE_B\tpc\t1\t100\t200\t5\t1\t5\tBoth annotated\t1\t1.0");

        // Two files of the same table are re-aggregated
        let combined = load_rows(&[input.clone(), input]).unwrap();
        assert_eq!(combined.len(), 1);
        assert_eq!(combined.rows[0].counts, vec![20]);
    }
}
