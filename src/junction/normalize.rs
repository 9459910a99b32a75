/// Annotation-relative normalization of discovered junctions
///
/// Each junction is classified by how many of its endpoints coincide with
/// an endpoint of an annotation-confirmed junction, and each sample's count
/// is divided by the strongest annotated support seen at those endpoints.
use super::annotation::AnnotatedJunctionSet;
use super::table::{JunctionRow, JunctionRows, JunctionTable};
use super::{SpliceJunction, canonical_chrom};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Per-sample maximum count observed at one endpoint
pub type EndpointSupport = BTreeMap<String, u64>;

/// `(chrom, position)` → per-sample maximum support over annotated junctions
#[derive(Debug, Clone, Default)]
pub struct EndpointSupportIndex {
    support: HashMap<(String, u64), EndpointSupport>,
}

impl EndpointSupportIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from table rows: only junctions in `annotated` contribute, with
    /// every sample (zeros included) recorded at both endpoints. A junction
    /// listed on several rows contributes its per-sample maximum.
    pub fn build(rows: &JunctionRows, annotated: &AnnotatedJunctionSet) -> Self {
        let mut index = Self::new();

        for row in &rows.rows {
            if !annotated.contains(&row.junction) {
                continue;
            }
            let counts = rows
                .samples
                .iter()
                .map(String::as_str)
                .zip(row.counts.iter().copied());
            index.observe(&row.junction, counts);
        }

        index
    }

    /// Record an annotated junction's per-sample counts at both endpoints
    pub fn observe<'a, I>(&mut self, junction: &SpliceJunction, counts: I)
    where
        I: IntoIterator<Item = (&'a str, u64)> + Clone,
    {
        let chrom = canonical_chrom(&junction.chrom);
        for pos in [junction.start, junction.end] {
            let support = self.support.entry((chrom.to_string(), pos)).or_default();
            for (sample, count) in counts.clone() {
                let max = support.entry(sample.to_string()).or_insert(count);
                if count > *max {
                    *max = count;
                }
            }
        }
    }

    pub fn get(&self, chrom: &str, position: u64) -> Option<&EndpointSupport> {
        self.support
            .get(&(canonical_chrom(chrom).to_string(), position))
    }

    /// Number of indexed endpoints
    pub fn len(&self) -> usize {
        self.support.len()
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_empty()
    }

    /// Classify a junction by which of its endpoints are indexed
    pub fn classify(&self, junction: &SpliceJunction) -> Classification<'_> {
        match (
            self.get(&junction.chrom, junction.start),
            self.get(&junction.chrom, junction.end),
        ) {
            (Some(start), Some(stop)) => Classification::Both { start, stop },
            (Some(support), None) | (None, Some(support)) => Classification::One(support),
            (None, None) => Classification::Neither,
        }
    }
}

/// Endpoint classification of one junction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    Both {
        start: &'a EndpointSupport,
        stop: &'a EndpointSupport,
    },
    One(&'a EndpointSupport),
    Neither,
}

impl Classification<'_> {
    /// Baseline for a sample; `None` when no endpoint is annotated
    pub fn denominator(&self, sample: &str) -> Option<u64> {
        let get = |s: &EndpointSupport| s.get(sample).copied().unwrap_or(0);
        match self {
            Classification::Both { start, stop } => Some(get(start).max(get(stop))),
            Classification::One(support) => Some(get(support)),
            Classification::Neither => None,
        }
    }

    pub fn tag(&self) -> AnnotationTag {
        match self {
            Classification::Both { .. } => AnnotationTag::Both,
            Classification::One(_) => AnnotationTag::One,
            Classification::Neither => AnnotationTag::Neither,
        }
    }
}

/// Classification as written to the normalized table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationTag {
    Both,
    One,
    Neither,
}

impl AnnotationTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationTag::Both => "Both annotated",
            AnnotationTag::One => "One annotated",
            AnnotationTag::Neither => "Neither annotated",
        }
    }
}

impl fmt::Display for AnnotationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnnotationTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Both annotated" => Ok(AnnotationTag::Both),
            "One annotated" => Ok(AnnotationTag::One),
            "Neither annotated" => Ok(AnnotationTag::Neither),
            _ => Err(format!("unknown annotation tag '{}'", s)),
        }
    }
}

/// One sample's normalized support
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizedValue {
    /// `count / denominator`, rounded to 3 decimals
    Ratio(f64),
    /// Raw count where the annotated baseline for the sample is zero
    Unsupported(u64),
}

impl NormalizedValue {
    pub fn new(count: u64, denominator: u64) -> Self {
        if denominator == 0 {
            NormalizedValue::Unsupported(count)
        } else {
            NormalizedValue::Ratio(round3(count as f64 / denominator as f64))
        }
    }
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole ratios keep one decimal: 1.0, 0.0
            NormalizedValue::Ratio(r) if r.fract() == 0.0 => write!(f, "{:.1}", r),
            NormalizedValue::Ratio(r) => write!(f, "{}", r),
            NormalizedValue::Unsupported(count) => write!(f, "{}*", count),
        }
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// A junction row with its annotation tag and normalized values
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub row: JunctionRow,
    pub tag: AnnotationTag,
    /// Full junction is in the annotated set (within tolerance)
    pub seen_before: bool,
    /// One value per sample, empty for "Neither annotated"
    pub values: Vec<NormalizedValue>,
}

/// Normalize one finalized row; `samples` gives the order of `row.counts`
pub fn normalize_row(
    row: JunctionRow,
    samples: &[String],
    index: &EndpointSupportIndex,
    annotated: &AnnotatedJunctionSet,
) -> NormalizedRow {
    let classification = index.classify(&row.junction);
    let seen_before = annotated.contains(&row.junction);

    let values = samples
        .iter()
        .zip(row.counts.iter())
        .filter_map(|(sample, &count)| {
            classification
                .denominator(sample)
                .map(|d| NormalizedValue::new(count, d))
        })
        .collect();

    NormalizedRow {
        tag: classification.tag(),
        seen_before,
        values,
        row,
    }
}

/// Normalize every row independently, keeping row order
pub fn normalize_rows(rows: &JunctionRows, annotated: &AnnotatedJunctionSet) -> Vec<NormalizedRow> {
    let index = EndpointSupportIndex::build(rows, annotated);
    log::info!(
        "Indexed {} annotated endpoints from {} rows",
        index.len(),
        rows.len()
    );

    rows.rows
        .iter()
        .cloned()
        .map(|row| normalize_row(row, &rows.samples, &index, annotated))
        .collect()
}

/// Normalize every junction of a table, in output row order
pub fn normalize_table(
    table: &JunctionTable,
    annotated: &AnnotatedJunctionSet,
) -> Vec<NormalizedRow> {
    normalize_rows(&JunctionRows::from_table(table), annotated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::junction::GeneLabel;

    fn label() -> GeneLabel {
        GeneLabel::new("G1", "protein_coding")
    }

    fn add(table: &mut JunctionTable, start: u64, end: u64, counts: &[(&str, u64)]) {
        for &(sample, count) in counts {
            table.add_count(SpliceJunction::new("2", start, end), &label(), sample, count);
        }
    }

    fn find(rows: &[NormalizedRow], start: u64, end: u64) -> &NormalizedRow {
        rows.iter()
            .find(|r| r.row.junction.start == start && r.row.junction.end == end)
            .unwrap()
    }

    #[test]
    fn test_index_takes_max_per_endpoint() {
        // 2:100-250 Beryl:20 Besse:10, 2:100-360 Beryl:30 Besse:4
        let mut table = JunctionTable::new();
        add(&mut table, 100, 250, &[("Beryl", 20), ("Besse", 10)]);
        add(&mut table, 100, 360, &[("Beryl", 30), ("Besse", 4)]);

        let mut annotated = AnnotatedJunctionSet::new();
        annotated.insert("chr2", 100, 250);
        annotated.insert("chr2", 100, 360);

        let index = EndpointSupportIndex::build(&JunctionRows::from_table(&table), &annotated);
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("2", 100).unwrap()["Beryl"], 30);
        assert_eq!(index.get("2", 100).unwrap()["Besse"], 10);
        assert_eq!(index.get("2", 250).unwrap()["Beryl"], 20);
        assert_eq!(index.get("chr2", 360).unwrap()["Besse"], 4);
    }

    #[test]
    fn test_index_ignores_unannotated_and_keeps_zero_samples() {
        let mut table = JunctionTable::with_samples(["A", "B"]);
        add(&mut table, 10, 20, &[("A", 3)]);
        add(&mut table, 30, 40, &[("A", 9), ("B", 9)]);

        let mut annotated = AnnotatedJunctionSet::new();
        annotated.insert("2", 10, 20);

        let index = EndpointSupportIndex::build(&JunctionRows::from_table(&table), &annotated);
        assert!(index.get("2", 30).is_none());
        assert_eq!(index.get("2", 10).unwrap()["B"], 0);
    }

    #[test]
    fn test_both_annotated_ratios() {
        // Annotated support {A: 10, B: 8}; novel pairing has A:5, B:0
        let mut table = JunctionTable::with_samples(["A", "B"]);
        add(&mut table, 100, 200, &[("A", 10), ("B", 8)]);
        add(&mut table, 300, 400, &[("A", 10), ("B", 8)]);
        add(&mut table, 100, 400, &[("A", 5)]);

        let mut annotated = AnnotatedJunctionSet::new();
        annotated.insert("2", 100, 200);
        annotated.insert("2", 300, 400);

        let rows = normalize_table(&table, &annotated);
        let skip = find(&rows, 100, 400);
        assert_eq!(skip.tag, AnnotationTag::Both);
        assert!(!skip.seen_before);
        assert_eq!(
            skip.values,
            vec![NormalizedValue::Ratio(0.5), NormalizedValue::Ratio(0.0)]
        );
        let rendered: Vec<String> = skip.values.iter().map(|v| v.to_string()).collect();
        assert_eq!(rendered, vec!["0.5", "0.0"]);

        let known = find(&rows, 100, 200);
        assert_eq!(known.tag, AnnotationTag::Both);
        assert!(known.seen_before);
        assert_eq!(known.values[0].to_string(), "1.0");
    }

    #[test]
    fn test_one_annotated_and_zero_denominator() {
        let mut table = JunctionTable::with_samples(["A", "B"]);
        add(&mut table, 100, 200, &[("A", 3)]);
        add(&mut table, 100, 150, &[("A", 1), ("B", 5)]);

        let mut annotated = AnnotatedJunctionSet::new();
        annotated.insert("2", 100, 200);

        let rows = normalize_table(&table, &annotated);
        let ext = find(&rows, 100, 150);
        assert_eq!(ext.tag, AnnotationTag::One);
        assert_eq!(ext.values[0], NormalizedValue::Ratio(0.333));
        assert_eq!(ext.values[1], NormalizedValue::Unsupported(5));
        assert_eq!(ext.values[1].to_string(), "5*");
    }

    #[test]
    fn test_neither_annotated_has_no_values() {
        let mut table = JunctionTable::with_samples(["A"]);
        add(&mut table, 5000, 6000, &[("A", 7)]);

        let rows = normalize_table(&table, &AnnotatedJunctionSet::new());
        assert_eq!(rows[0].tag, AnnotationTag::Neither);
        assert!(rows[0].values.is_empty());
        assert_eq!(rows[0].row.counts, vec![7]);
        assert_eq!(rows[0].tag.to_string(), "Neither annotated");
    }

    #[test]
    fn test_seen_before_within_tolerance_only() {
        let mut table = JunctionTable::with_samples(["A"]);
        add(&mut table, 101, 201, &[("A", 2)]);

        let mut annotated = AnnotatedJunctionSet::new();
        annotated.insert("2", 100, 200);

        let rows = normalize_table(&table, &annotated);
        assert!(rows[0].seen_before);
        // The shifted junction indexes its own endpoints
        assert_eq!(rows[0].tag, AnnotationTag::Both);
    }

    #[test]
    fn test_rows_sharing_a_junction_stay_separate() {
        // One junction reported by two overlapping regions
        let row = |gene: &str, count: u64| JunctionRow {
            junction: SpliceJunction::new("1", 100, 200),
            label: GeneLabel::new(gene, "pc"),
            ntimes: count,
            nsamples: 1,
            counts: vec![count],
        };
        let mut rows = JunctionRows::new(vec!["A".to_string()]);
        rows.rows.push(row("GENE_A", 5));
        rows.rows.push(row("GENE_B", 5));
        rows.rows.push(JunctionRow {
            junction: SpliceJunction::new("1", 100, 300),
            ..row("GENE_B", 2)
        });

        let mut annotated = AnnotatedJunctionSet::new();
        annotated.insert("chr1", 100, 200);

        let index = EndpointSupportIndex::build(&rows, &annotated);
        assert_eq!(index.get("1", 100).unwrap()["A"], 5);

        let normalized = normalize_rows(&rows, &annotated);
        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[0].row.label.gene, "GENE_A");
        assert_eq!(normalized[1].row.label.gene, "GENE_B");
        for known in &normalized[..2] {
            assert_eq!(known.row.counts, vec![5]);
            assert_eq!(known.values, vec![NormalizedValue::Ratio(1.0)]);
        }
        assert_eq!(normalized[2].values, vec![NormalizedValue::Ratio(0.4)]);
    }

    #[test]
    fn test_value_formatting() {
        assert_eq!(NormalizedValue::new(1, 3).to_string(), "0.333");
        assert_eq!(NormalizedValue::new(2, 3).to_string(), "0.667");
        assert_eq!(NormalizedValue::new(6, 3).to_string(), "2.0");
        assert_eq!(NormalizedValue::new(0, 0).to_string(), "0*");
        assert_eq!(NormalizedValue::new(1, 8).to_string(), "0.125");
    }

    #[test]
    fn test_tag_round_trip() {
        for tag in [AnnotationTag::Both, AnnotationTag::One, AnnotationTag::Neither] {
            assert_eq!(tag.as_str().parse::<AnnotationTag>().unwrap(), tag);
        }
        assert!("Some annotated".parse::<AnnotationTag>().is_err());
    }
}
