/// One driver per run mode
///
/// - `discover`: per-region scan across samples, final merge
/// - `aggregate`: re-aggregation of separately produced junction tables
/// - `normalize`: annotation-relative normalization
/// - `filter`: novel-junction filtering of a normalized table
pub mod aggregate;
pub mod discover;
pub mod filter;
pub mod normalize;

use crate::error::Error;
use std::path::{Path, PathBuf};

/// Output path: `--outFile` if given, else `<outDir>/<default_name>`.
///
/// Creates the parent directory when needed.
pub(crate) fn output_path(
    out_file: Option<&Path>,
    out_dir: &Path,
    default_name: &str,
) -> Result<PathBuf, Error> {
    let path = match out_file {
        Some(p) => p.to_path_buf(),
        None => out_dir.join(default_name),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(e, parent))?;
        }
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_path_default_and_override() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("out");

        let p = output_path(None, &out_dir, "novel.txt").unwrap();
        assert_eq!(p, out_dir.join("novel.txt"));
        assert!(out_dir.is_dir());

        let explicit = dir.path().join("x").join("mine.txt");
        let p = output_path(Some(&explicit), &out_dir, "novel.txt").unwrap();
        assert_eq!(p, explicit);
        assert!(dir.path().join("x").is_dir());
    }
}
