//! End-of-run accounting
//!
//! Every stage returns a [`LoadReport`] instead of swallowing failures, so the
//! binaries can print one structured summary and decide on the exit status.

use crate::error::LoadError;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Records or rows looked at
    pub processed: usize,
    /// Rows inserted into the store
    pub created: usize,
    /// Relation sets or edges written
    pub updated: usize,
    /// Records rejected before reaching the store
    pub skipped: usize,
    /// Rows or relation updates rejected by the store
    pub failed: usize,
    /// Batches rolled back as a whole
    pub failed_batches: usize,
    /// Input paths that could not be read
    pub unavailable_sources: usize,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: &LoadReport) {
        self.processed += other.processed;
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.failed_batches += other.failed_batches;
        self.unavailable_sources += other.unavailable_sources;
    }

    /// Tally a per-record outcome, logging the failure
    pub fn record<T>(&mut self, outcome: Result<T, LoadError>) -> Option<T> {
        self.processed += 1;
        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("⚠️  Skipping record: {}", e);
                self.skipped += 1;
                None
            }
        }
    }

    pub fn log_summary(&self, label: &str) {
        log::info!("📊 {} summary:", label);
        log::info!("   ├─ processed: {}", self.processed);
        log::info!("   ├─ created: {}", self.created);
        log::info!("   ├─ updated: {}", self.updated);
        log::info!("   ├─ skipped: {}", self.skipped);
        log::info!("   ├─ failed: {}", self.failed);
        log::info!("   ├─ failed batches: {}", self.failed_batches);
        log::info!("   └─ unavailable sources: {}", self.unavailable_sources);
    }
}
