/// Scan statistics tracking and reporting
use log::{info, warn};
use std::ops::AddAssign;

/// Tracks what happened to the alignment records of one or more region scans
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    /// Alignment records examined (header lines excluded)
    pub records_seen: u64,
    /// Records skipped because a field or the CIGAR could not be parsed
    pub malformed_records: u64,
    /// Records whose position is not strictly inside the region
    pub out_of_region: u64,
    /// Records inside the region carrying at least one N run
    pub spliced_records: u64,
    /// Junction occurrences counted (one or two per spliced record)
    pub junctions_emitted: u64,
}

impl ScanStats {
    /// Create new statistics tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Get percentage of malformed records
    pub fn malformed_percent(&self) -> f64 {
        if self.records_seen == 0 {
            0.0
        } else {
            100.0 * self.malformed_records as f64 / self.records_seen as f64
        }
    }

    /// Get percentage of spliced records
    pub fn spliced_percent(&self) -> f64 {
        if self.records_seen == 0 {
            0.0
        } else {
            100.0 * self.spliced_records as f64 / self.records_seen as f64
        }
    }
}

impl AddAssign for ScanStats {
    fn add_assign(&mut self, other: Self) {
        self.records_seen += other.records_seen;
        self.malformed_records += other.malformed_records;
        self.out_of_region += other.out_of_region;
        self.spliced_records += other.spliced_records;
        self.junctions_emitted += other.junctions_emitted;
    }
}

/// Tracks region-level outcomes of a discovery run
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// Regions read from the region file (malformed lines included)
    pub regions_total: u64,
    /// Regions whose output was written
    pub regions_processed: u64,
    /// Regions skipped: malformed line, retrieval or write failure
    pub regions_failed: u64,
    /// Processed regions in which no junction was found
    pub regions_without_junctions: u64,
    /// Record-level totals over all processed regions
    pub scan: ScanStats,
}

impl RunStats {
    /// Create new statistics tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a region that was scanned and written
    pub fn record_processed(&mut self, n_junctions: usize, scan: ScanStats) {
        self.regions_total += 1;
        self.regions_processed += 1;
        if n_junctions == 0 {
            self.regions_without_junctions += 1;
        }
        self.scan += scan;
    }

    /// Record a region that could not be processed
    pub fn record_failed(&mut self) {
        self.regions_total += 1;
        self.regions_failed += 1;
    }

    /// Print summary statistics to log
    pub fn print_summary(&self) {
        if self.regions_total == 0 {
            info!("No regions processed");
            return;
        }

        info!("=== Discovery Summary ===");
        info!("Number of regions: {}", self.regions_total);
        info!("Regions processed: {}", self.regions_processed);
        info!(
            "Regions with no junctions: {}",
            self.regions_without_junctions
        );
        if self.regions_failed > 0 {
            warn!("Regions failed: {}", self.regions_failed);
        } else {
            info!("Regions failed: 0");
        }

        info!("Alignment records examined: {}", self.scan.records_seen);
        info!(
            "Spliced records: {} ({:.2}%)",
            self.scan.spliced_records,
            self.scan.spliced_percent()
        );
        info!(
            "Malformed records skipped: {} ({:.2}%)",
            self.scan.malformed_records,
            self.scan.malformed_percent()
        );
        info!("Records outside region: {}", self.scan.out_of_region);
        info!("Junction occurrences: {}", self.scan.junctions_emitted);
    }
}
