/// Filtering pass: drop junctions already in the transcript model
use crate::error::Error;
use crate::io::table::{NormalizedLine, NormalizedTable, read_normalized_table};
use crate::params::Parameters;
use crate::pipeline::output_path;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Default output name inside `--outDir`
pub const NOVEL_FILE_NAME: &str = "novel.txt";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterSummary {
    pub total: usize,
    pub annotated: usize,
    pub novel: usize,
}

/// Rows whose `SeenInTranscriptsList` is 0
pub fn novel_rows(table: &NormalizedTable) -> (Vec<&NormalizedLine>, FilterSummary) {
    let novel: Vec<&NormalizedLine> = table.rows.iter().filter(|r| !r.seen_before).collect();
    let summary = FilterSummary {
        total: table.rows.len(),
        annotated: table.rows.len() - novel.len(),
        novel: novel.len(),
    };
    (novel, summary)
}

/// Filter a normalized table file into `out`
pub fn filter_file(input: &Path, out: &Path) -> Result<FilterSummary, Error> {
    let table = read_normalized_table(input)?;
    let (novel, summary) = novel_rows(&table);

    let file = File::create(out).map_err(|e| Error::io(e, out))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", table.header).map_err(|e| Error::io(e, out))?;
    for row in novel {
        writeln!(writer, "{}", row.line).map_err(|e| Error::io(e, out))?;
    }
    writer.flush().map_err(|e| Error::io(e, out))?;

    Ok(summary)
}

/// Run the filtering pass
pub fn run_filter(params: &Parameters) -> Result<FilterSummary, Error> {
    let input = params
        .normalized_file
        .as_deref()
        .ok_or_else(|| Error::Parameter("--normalizedFile is required".into()))?;
    let out = output_path(params.out_file.as_deref(), &params.out_dir, NOVEL_FILE_NAME)?;

    let summary = filter_file(input, &out)?;

    info!("{} total splice junctions", summary.total);
    info!("Filtering out {} annotated splice junctions...", summary.annotated);
    info!("{} non-canonical splice junctions", summary.novel);
    info!("Output: {}", out.display());

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER: &str = "Gene\tType\tChrom\tStart\tEnd\tNTimesSeen\tNSamplesSeen\tA\tTag\tSeenInTranscriptsList\tA_normed";

    #[test]
    fn test_filter_keeps_novel_rows() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("normalized.txt");
        std::fs::write(
            &input,
            format!(
                "{HEADER}\n\
                 G\tpc\t1\t100\t200\t4\t1\t4\tBoth annotated\t1\t1.0\n\
                 G\tpc\t1\t100\t300\t2\t1\t2\tOne annotated\t0\t0.5\n\
                 G\tpc\t1\t700\t800\t1\t1\t1\tNeither annotated\t0\t\n"
            ),
        )
        .unwrap();

        let out = dir.path().join(NOVEL_FILE_NAME);
        let summary = filter_file(&input, &out).unwrap();
        assert_eq!(
            summary,
            FilterSummary {
                total: 3,
                annotated: 1,
                novel: 2
            }
        );

        let content = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("\t100\t300\t"));
        assert!(lines[2].ends_with("Neither annotated\t0\t"));
    }

    #[test]
    fn test_filter_rejects_bad_flag() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("normalized.txt");
        std::fs::write(
            &input,
            format!("{HEADER}\nG\tpc\t1\t100\t200\t4\t1\t4\tBoth annotated\tyes\t1.0\n"),
        )
        .unwrap();

        assert!(filter_file(&input, &dir.path().join("out.txt")).is_err());
    }
}
