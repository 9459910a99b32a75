pub mod regions;
pub mod source;
pub mod table;

use crate::error::Error;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Open a text file, plain or gzip compressed.
///
/// Compression is taken from `gzipped` or auto-detected from a `.gz`/`.gzip`
/// suffix.
pub fn open_text(path: &Path, gzipped: bool) -> Result<Box<dyn BufRead + Send>, Error> {
    let path_str = path.to_string_lossy();
    let is_gzipped = gzipped || path_str.ends_with(".gz") || path_str.ends_with(".gzip");

    let file = File::open(path).map_err(|e| Error::io(e, path))?;

    if is_gzipped {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
