/// Splice junction discovery, aggregation and annotation-relative normalization
///
/// This module handles:
/// - Walking CIGAR runs to locate intron skips (`extract`)
/// - Counting junction occurrences per region and sample (`counter`)
/// - Folding and re-aggregating per-sample counts (`table`)
/// - Building the position-tolerant set of known junctions (`annotation`)
/// - Classifying and normalizing discovered junctions (`normalize`)
pub mod annotation;
pub mod counter;
pub mod extract;
pub mod normalize;
pub mod table;

pub use annotation::{AnnotatedJunctionSet, AnnotationColumns};
pub use counter::{JunctionCounts, count_region_junctions};
pub use extract::extract_junctions;
pub use normalize::{
    AnnotationTag, Classification, EndpointSupportIndex, NormalizedRow, NormalizedValue,
};
pub use table::{GeneLabel, JunctionRow, JunctionRows, JunctionTable};

use std::fmt;

/// A spliced-out interval: inclusive start, exclusive end
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpliceJunction {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl SpliceJunction {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// Canonical string key: `{chrom},{start},{end}`
    pub fn key(&self) -> String {
        format!("{},{},{}", self.chrom, self.start, self.end)
    }

    /// Intron length (equals the originating N run length); zero if `end <= start`
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Same junction with its chromosome name canonicalised
    pub fn canonical(&self) -> SpliceJunction {
        SpliceJunction::new(canonical_chrom(&self.chrom), self.start, self.end)
    }
}

impl fmt::Display for SpliceJunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.chrom, self.start, self.end)
    }
}

/// Strip one leading `chr` so `chr1` and `1` name the same sequence
pub fn canonical_chrom(chrom: &str) -> &str {
    chrom.strip_prefix("chr").unwrap_or(chrom)
}
