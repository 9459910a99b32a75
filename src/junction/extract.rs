/// Junction extraction from CIGAR runs
///
/// Only M/=/X/D runs move the reference position before an intron; I, S, H
/// and P runs are skipped wherever they appear. The first junction starts at
/// `position + offset`, a second one starts at the first junction's end plus
/// the offset accumulated between the two N runs. Runs after the second N
/// are never inspected.
use super::SpliceJunction;
use crate::align::{AlignmentRecord, Cigar, CigarOp};

/// Maximum number of introns taken from one alignment
pub const MAX_JUNCTIONS_PER_RECORD: usize = 2;

/// Extract up to two splice junctions from one alignment.
///
/// # Arguments
/// * `chrom` - Chromosome label of the region being scanned
/// * `position` - 1-based leftmost reference base of the alignment
/// * `cigar` - Parsed CIGAR runs
///
/// # Returns
/// Zero, one or two junctions, each occurring once
pub fn extract_junctions(chrom: &str, position: u64, cigar: &Cigar) -> Vec<SpliceJunction> {
    let mut junctions = Vec::with_capacity(MAX_JUNCTIONS_PER_RECORD);

    // Reference coordinate the running offset is measured from
    let mut anchor = position;
    let mut offset = 0u64;

    for op in cigar.ops() {
        match op {
            CigarOp::RefSkip(n) => {
                let start = anchor + offset;
                let end = start + *n as u64;
                junctions.push(SpliceJunction::new(chrom, start, end));

                if junctions.len() == MAX_JUNCTIONS_PER_RECORD {
                    break;
                }

                anchor = end;
                offset = 0;
            }
            op if op.shifts_intron_start() => offset += op.len() as u64,
            _ => {}
        }
    }

    junctions
}

/// Extract junctions from a record, labelling them with the scanned region's chromosome
pub fn extract_record_junctions(chrom: &str, record: &AlignmentRecord) -> Vec<SpliceJunction> {
    extract_junctions(chrom, record.position, &record.cigar)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn junctions(cigar: &str, position: u64) -> Vec<(u64, u64)> {
        let cigar: Cigar = cigar.parse().unwrap();
        extract_junctions("1", position, &cigar)
            .into_iter()
            .map(|j| (j.start, j.end))
            .collect()
    }

    #[test]
    fn test_no_skip_no_junction() {
        for cigar in ["50M", "10S40M", "3M1D40M", "22M1I19M", "5H45M5H", "2P48M", "10=2X10="] {
            assert!(junctions(cigar, 100).is_empty(), "{cigar}");
        }
    }

    #[test]
    fn test_deletion_counts_toward_offset() {
        // 3 + 1 + 40 = 44 reference bases before the intron
        assert_eq!(junctions("3M1D40M20N", 5), vec![(49, 69)]);
    }

    #[test]
    fn test_double_skip() {
        // Second intron starts 34 bases after the first one ends
        assert_eq!(
            junctions("13M221400N34M2658N29M", 5),
            vec![(18, 221418), (221452, 224110)]
        );
    }

    #[test]
    fn test_single_skip() {
        assert_eq!(junctions("33M20N8M", 100), vec![(133, 153)]);
    }

    #[test]
    fn test_insertion_excluded_from_offset() {
        assert_eq!(junctions("22M1I19M1893N6M", 1000), vec![(1041, 2934)]);
    }

    #[test]
    fn test_leading_soft_clip_excluded_from_offset() {
        assert_eq!(junctions("8S13M221400N34M", 5), vec![(18, 221418)]);
    }

    #[test]
    fn test_hard_clip_and_padding_excluded_from_offset() {
        assert_eq!(junctions("4H2P10M50N10M4H", 1), vec![(11, 61)]);
    }

    #[test]
    fn test_exact_match_and_mismatch_count_toward_offset() {
        assert_eq!(junctions("5=1X4=30N10M", 1), vec![(11, 41)]);
    }

    #[test]
    fn test_every_kind_before_first_skip() {
        // Only 4M + 5D + 7= + 8X = 24 shift the start
        assert_eq!(junctions("2H3S4M1I5D7=8X1P100N9M", 10), vec![(34, 134)]);
    }

    #[test]
    fn test_every_kind_between_skips() {
        // Between the skips only 4M + 2D + 3M = 9 count
        assert_eq!(
            junctions("10M100N4M6I2D1P3M50N10M", 1),
            vec![(11, 111), (120, 170)]
        );
    }

    #[test]
    fn test_soft_clip_between_skips_excluded() {
        assert_eq!(
            junctions("10M100N5M3S5M40N10M", 1),
            vec![(11, 111), (121, 161)]
        );
    }

    #[test]
    fn test_kinds_after_skip_do_not_move_junction() {
        let a = junctions("10M100N10M", 1);
        for cigar in ["10M100N5I5M", "10M100N10S", "10M100N3D7M", "10M100N10M5H"] {
            assert_eq!(junctions(cigar, 1), a, "{cigar}");
        }
    }

    #[test]
    fn test_more_than_two_skips_keeps_first_two() {
        assert_eq!(
            junctions("10M100N10M200N10M300N10M", 1),
            vec![(11, 111), (121, 321)]
        );
    }

    #[test]
    fn test_adjacent_skips() {
        assert_eq!(junctions("10M5N7N10M", 1), vec![(11, 16), (16, 23)]);
    }

    #[test]
    fn test_skip_at_start() {
        assert_eq!(junctions("30N20M", 50), vec![(50, 80)]);
    }

    #[test]
    fn test_junction_length_equals_skip_length() {
        let cigar: Cigar = "7S12M1I3D2658N4M900N2M".parse().unwrap();
        let found = extract_junctions("X", 321, &cigar);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].len(), 2658);
        assert_eq!(found[1].len(), 900);
    }

    #[test]
    fn test_region_chromosome_is_used() {
        let record = AlignmentRecord {
            chrom: "chr2".to_string(),
            position: 5,
            cigar: "3M1D40M20N".parse().unwrap(),
        };
        let found = extract_record_junctions("2", &record);
        assert_eq!(found, vec![SpliceJunction::new("2", 49, 69)]);
    }
}
