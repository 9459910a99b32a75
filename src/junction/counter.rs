/// Per-region, per-sample junction counting
use super::SpliceJunction;
use super::extract::extract_record_junctions;
use crate::align::AlignmentRecord;
use crate::io::regions::GeneRecord;
use crate::stats::ScanStats;
use std::collections::HashMap;

/// Occurrence count of each junction found in one sample
pub type JunctionCounts = HashMap<SpliceJunction, u64>;

/// Count the junctions of one sample's alignment lines for one region.
///
/// Lines are tab-delimited SAM records already filtered by the retrieval
/// collaborator. Only records strictly inside `(region_start, region_stop)`
/// that carry an N run contribute; junctions are labelled with the region's
/// chromosome. Unparseable lines are counted in `stats` and skipped.
pub fn count_region_junctions<I, S>(
    region: &GeneRecord,
    lines: I,
    stats: &mut ScanStats,
) -> JunctionCounts
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts = JunctionCounts::new();

    for line in lines {
        let line = line.as_ref().trim_end_matches(['\n', '\r']);

        // Header and diagnostic lines interleaved by the collaborator
        if line.is_empty() || line.starts_with('@') {
            continue;
        }

        stats.records_seen += 1;

        let record = match AlignmentRecord::from_sam_line(line) {
            Ok(record) => record,
            Err(e) => {
                log::trace!("Skipping record in {}: {}", region.locus(), e);
                stats.malformed_records += 1;
                continue;
            }
        };

        count_record(region, &record, &mut counts, stats);
    }

    counts
}

fn count_record(
    region: &GeneRecord,
    record: &AlignmentRecord,
    counts: &mut JunctionCounts,
    stats: &mut ScanStats,
) {
    if !region.contains(record.position) {
        stats.out_of_region += 1;
        return;
    }

    if !record.cigar.has_skip() {
        return;
    }

    stats.spliced_records += 1;

    for junction in extract_record_junctions(&region.chrom, record) {
        log::debug!(
            ">> {} read_start: {} intron_start: {} intron_end: {}",
            record.cigar,
            record.position,
            junction.start,
            junction.end
        );
        *counts.entry(junction).or_insert(0) += 1;
        stats.junctions_emitted += 1;
    }
}
