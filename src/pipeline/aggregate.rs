/// Cross-batch aggregation pass
///
/// Junction tables produced separately (typically one sample at a time) are
/// read in sorted path order and re-aggregated into one multi-sample table.
/// Any table whose shape does not match its header aborts the run.
use crate::error::Error;
use crate::io::table::{read_junction_table, write_junction_file};
use crate::junction::JunctionTable;
use crate::params::Parameters;
use crate::pipeline::output_path;
use log::info;
use std::path::{Path, PathBuf};

/// Read and re-aggregate junction tables
pub fn load_combined(paths: &[PathBuf]) -> Result<JunctionTable, Error> {
    let mut paths = paths.to_vec();
    paths.sort();

    let mut combined = JunctionTable::new();
    for path in &paths {
        let table = read_junction_table(path)?;
        info!(
            "Read {} junctions over {} samples from {}",
            table.len(),
            table.n_samples(),
            path.display()
        );
        combined.merge(&table);
    }

    Ok(combined)
}

/// Default output name of the re-aggregated table
pub fn aggregate_file_name(sample_set_id: &str) -> String {
    format!("{}_allsplicejunctions.txt", sample_set_id)
}

/// Re-aggregate `inputs` and write the combined table to `out`
pub fn aggregate_files(inputs: &[PathBuf], out: &Path) -> Result<JunctionTable, Error> {
    let combined = load_combined(inputs)?;
    let n = write_junction_file(out, &combined)?;
    info!(
        "Wrote {} junctions over {} samples to {}",
        n,
        combined.n_samples(),
        out.display()
    );
    Ok(combined)
}

/// Run the aggregation pass
pub fn run_aggregate(params: &Parameters) -> Result<PathBuf, Error> {
    let out = output_path(
        params.out_file.as_deref(),
        &params.out_dir,
        &aggregate_file_name(&params.sample_set_id),
    )?;

    info!(
        ">> Re-aggregating {} junction tables",
        params.junction_files_in.len()
    );
    aggregate_files(&params.junction_files_in, &out)?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::table::junction_header;
    use crate::junction::SpliceJunction;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, samples: &[&str], rows: &[&str]) -> PathBuf {
        let samples: Vec<String> = samples.iter().map(|s| s.to_string()).collect();
        let mut content = junction_header(&samples);
        content.push('\n');
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_aggregate_single_sample_tables() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "s1.txt", &["S1"], &["G\tpc\t1\t100\t200\t3\t1\t3"]);
        let b = write(
            dir.path(),
            "s2.txt",
            &["S2"],
            &["G\tpc\t1\t100\t200\t2\t1\t2", "G\tpc\t1\t300\t400\t1\t1\t1"],
        );
        // Same sample seen again in a later batch
        let c = write(dir.path(), "s1b.txt", &["S1"], &["G\tpc\t1\t100\t200\t4\t1\t4"]);

        let out = dir.path().join("combined.txt");
        let combined = aggregate_files(&[b, a, c], &out).unwrap();

        assert_eq!(combined.samples(), vec!["S1", "S2"]);
        let content = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[1], "G\tpc\t1\t100\t200\t9\t2\t7\t2");
        assert_eq!(lines[2], "G\tpc\t1\t300\t400\t1\t1\t0\t1");
    }

    #[test]
    fn test_aggregate_is_idempotent_over_its_output() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "s1.txt", &["S1", "S2"], &["G\tpc\t1\t100\t200\t3\t2\t1\t2"]);
        let once = dir.path().join("once.txt");
        let first = aggregate_files(&[a], &once).unwrap();

        let empty = write(dir.path(), "empty.txt", &[], &[]);
        let twice = dir.path().join("twice.txt");
        let second = aggregate_files(&[once.clone(), empty], &twice).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            std::fs::read_to_string(&once).unwrap(),
            std::fs::read_to_string(&twice).unwrap()
        );
        assert!(second.get(&SpliceJunction::new("1", 100, 200)).is_some());
    }

    #[test]
    fn test_aggregate_rejects_misaligned_table() {
        let dir = TempDir::new().unwrap();
        let good = write(dir.path(), "a.txt", &["S1"], &["G\tpc\t1\t100\t200\t3\t1\t3"]);
        let bad = write(dir.path(), "b.txt", &["S1", "S2"], &["G\tpc\t1\t100\t200\t3\t1\t3"]);

        let err = aggregate_files(&[good, bad], &dir.path().join("out.txt")).unwrap_err();
        assert!(matches!(err, Error::MissingSampleColumn { .. }));
    }

    #[test]
    fn test_default_file_name() {
        assert_eq!(aggregate_file_name("cohort1"), "cohort1_allsplicejunctions.txt");
    }
}
