/// Junction occurrence tables: per-sample fold and cross-batch re-aggregation
use super::SpliceJunction;
use super::counter::JunctionCounts;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Gene name and type a junction is reported under
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeneLabel {
    pub gene: String,
    pub gene_type: String,
}

impl GeneLabel {
    pub fn new(gene: impl Into<String>, gene_type: impl Into<String>) -> Self {
        Self {
            gene: gene.into(),
            gene_type: gene_type.into(),
        }
    }
}

/// One junction's label and sparse per-sample counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionEntry {
    pub label: GeneLabel,
    /// Samples with a non-zero count only
    pub counts: BTreeMap<String, u64>,
}

impl JunctionEntry {
    /// Total occurrences over all samples
    pub fn ntimes(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of samples with a non-zero count
    pub fn nsamples(&self) -> usize {
        self.counts.values().filter(|&&c| c > 0).count()
    }
}

/// A finalized table row with counts densified in sample order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionRow {
    pub junction: SpliceJunction,
    pub label: GeneLabel,
    pub ntimes: u64,
    pub nsamples: usize,
    /// One count per sample of `JunctionTable::samples`, zeros included
    pub counts: Vec<u64>,
}

/// Junction → sample → count, with the full sample set kept alongside.
///
/// The inner maps are sparse; a sample registered on the table but absent
/// from a junction's counts is zero for that junction. Columns are only
/// linearized by `rows()`, in sorted sample-id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JunctionTable {
    samples: BTreeSet<String>,
    entries: HashMap<SpliceJunction, JunctionEntry>,
}

impl JunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty table with a known sample set
    pub fn with_samples<I, S>(samples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            samples: samples.into_iter().map(Into::into).collect(),
            entries: HashMap::new(),
        }
    }

    /// Register a sample column, even if it never sees a junction
    pub fn add_sample(&mut self, sample: impl Into<String>) {
        self.samples.insert(sample.into());
    }

    /// Add `count` occurrences of a junction for one sample.
    ///
    /// Zero counts register the sample but never materialize an inner entry.
    pub fn add_count(&mut self, junction: SpliceJunction, label: &GeneLabel, sample: &str, count: u64) {
        if !self.samples.contains(sample) {
            self.samples.insert(sample.to_string());
        }
        if count == 0 {
            return;
        }

        let entry = self
            .entries
            .entry(junction)
            .or_insert_with(|| JunctionEntry {
                label: label.clone(),
                counts: BTreeMap::new(),
            });
        if *label < entry.label {
            entry.label = label.clone();
        }
        let total = entry.counts.entry(sample.to_string()).or_insert(0);
        *total = total.saturating_add(count);
    }

    /// Fold one sample's counts for a region into the table
    pub fn fold(&mut self, sample: &str, label: &GeneLabel, counts: &JunctionCounts) {
        self.add_sample(sample);
        for (junction, &count) in counts {
            self.add_count(junction.clone(), label, sample, count);
        }
    }

    /// Re-aggregate another table into this one.
    ///
    /// Counts for the same (junction, sample) pair are summed; the sample set
    /// becomes the union; conflicting labels resolve to the smallest one.
    pub fn merge(&mut self, other: &JunctionTable) {
        for sample in &other.samples {
            self.add_sample(sample.clone());
        }
        for (junction, entry) in &other.entries {
            for (sample, &count) in &entry.counts {
                self.add_count(junction.clone(), &entry.label, sample, count);
            }
        }
    }

    /// Re-aggregate any number of tables into a fresh one
    pub fn reaggregate<'a, I>(tables: I) -> JunctionTable
    where
        I: IntoIterator<Item = &'a JunctionTable>,
    {
        let mut combined = JunctionTable::new();
        for table in tables {
            combined.merge(table);
        }
        combined
    }

    /// Sample ids in column order
    pub fn samples(&self) -> Vec<String> {
        self.samples.iter().cloned().collect()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn get(&self, junction: &SpliceJunction) -> Option<&JunctionEntry> {
        self.entries.get(junction)
    }

    /// Number of distinct junctions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finalize into rows sorted by junction key, counts dense in sample order
    pub fn rows(&self) -> Vec<JunctionRow> {
        let mut keyed: Vec<(String, &SpliceJunction, &JunctionEntry)> = self
            .entries
            .iter()
            .map(|(junction, entry)| (junction.key(), junction, entry))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        keyed
            .into_iter()
            .map(|(_, junction, entry)| JunctionRow {
                junction: junction.clone(),
                label: entry.label.clone(),
                ntimes: entry.ntimes(),
                nsamples: entry.nsamples(),
                counts: self
                    .samples
                    .iter()
                    .map(|s| entry.counts.get(s).copied().unwrap_or(0))
                    .collect(),
            })
            .collect()
    }
}

/// Rows kept in input order, one per line of a junction table file.
///
/// Unlike `JunctionTable`, the same junction may appear under several
/// labels (overlapping regions report it once each).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JunctionRows {
    pub samples: Vec<String>,
    pub rows: Vec<JunctionRow>,
}

impl JunctionRows {
    pub fn new(samples: Vec<String>) -> Self {
        Self {
            samples,
            rows: Vec::new(),
        }
    }

    /// Finalized rows of a folded or re-aggregated table
    pub fn from_table(table: &JunctionTable) -> Self {
        Self {
            samples: table.samples(),
            rows: table.rows(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
