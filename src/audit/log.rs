//! Persistent run statistics.
//!
//! Counts what the batch runner processed so `circadian status` can report
//! cumulative totals across runs. Counters are atomic because batch workers
//! record into one shared log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Counters for the current run, optionally backed by a file.
#[derive(Debug)]
pub struct RunLog {
    /// Recordings analyzed successfully
    recordings_processed: AtomicU64,
    /// Recordings that could not be analyzed
    recordings_failed: AtomicU64,
    /// Samples read from recording files
    samples_ingested: AtomicU64,
    /// VMC buckets produced
    buckets_emitted: AtomicU64,
    /// VMC buckets without data
    empty_buckets: AtomicU64,
    /// Run start time
    run_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl RunLog {
    pub fn new() -> Self {
        Self {
            recordings_processed: AtomicU64::new(0),
            recordings_failed: AtomicU64::new(0),
            samples_ingested: AtomicU64::new(0),
            buckets_emitted: AtomicU64::new(0),
            empty_buckets: AtomicU64::new(0),
            run_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a run log that continues the totals stored at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            warn!("could not load previous run statistics: {e}");
        }

        log
    }

    pub fn record_processed(&self) {
        self.recordings_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.recordings_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_samples(&self, count: u64) {
        self.samples_ingested.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a batch of VMC buckets, `empty` of which had no data.
    pub fn record_buckets(&self, total: u64, empty: u64) {
        self.buckets_emitted.fetch_add(total, Ordering::Relaxed);
        self.empty_buckets.fetch_add(empty, Ordering::Relaxed);
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            recordings_processed: self.recordings_processed.load(Ordering::Relaxed),
            recordings_failed: self.recordings_failed.load(Ordering::Relaxed),
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            buckets_emitted: self.buckets_emitted.load(Ordering::Relaxed),
            empty_buckets: self.empty_buckets.load(Ordering::Relaxed),
            run_start: self.run_start,
            run_duration_secs: (Utc::now() - self.run_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Run Statistics:\n\
             - Recordings processed: {}\n\
             - Recordings failed: {}\n\
             - Samples ingested: {}\n\
             - VMC buckets: {} ({} without data)\n\
             - Run duration: {} seconds",
            stats.recordings_processed,
            stats.recordings_failed,
            stats.samples_ingested,
            stats.buckets_emitted,
            stats.empty_buckets,
            stats.run_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                recordings_processed: stats.recordings_processed,
                recordings_failed: stats.recordings_failed,
                samples_ingested: stats.samples_ingested,
                buckets_emitted: stats.buckets_emitted,
                empty_buckets: stats.empty_buckets,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.recordings_processed
                    .store(persisted.recordings_processed, Ordering::Relaxed);
                self.recordings_failed
                    .store(persisted.recordings_failed, Ordering::Relaxed);
                self.samples_ingested
                    .store(persisted.samples_ingested, Ordering::Relaxed);
                self.buckets_emitted
                    .store(persisted.buckets_emitted, Ordering::Relaxed);
                self.empty_buckets
                    .store(persisted.empty_buckets, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.recordings_processed.store(0, Ordering::Relaxed);
        self.recordings_failed.store(0, Ordering::Relaxed);
        self.samples_ingested.store(0, Ordering::Relaxed);
        self.buckets_emitted.store(0, Ordering::Relaxed);
        self.empty_buckets.store(0, Ordering::Relaxed);
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub recordings_processed: u64,
    pub recordings_failed: u64,
    pub samples_ingested: u64,
    pub buckets_emitted: u64,
    pub empty_buckets: u64,
    pub run_start: DateTime<Utc>,
    pub run_duration_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    recordings_processed: u64,
    recordings_failed: u64,
    samples_ingested: u64,
    buckets_emitted: u64,
    empty_buckets: u64,
    last_updated: DateTime<Utc>,
}

/// Run log shared between batch workers.
pub type SharedRunLog = Arc<RunLog>;

pub fn create_shared_log() -> SharedRunLog {
    Arc::new(RunLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedRunLog {
    Arc::new(RunLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("circadian-audit-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_run_log_counting() {
        let log = RunLog::new();

        log.record_processed();
        log.record_processed();
        log.record_failed();
        log.record_samples(1_000);
        log.record_buckets(60, 2);

        let stats = log.stats();
        assert_eq!(stats.recordings_processed, 2);
        assert_eq!(stats.recordings_failed, 1);
        assert_eq!(stats.samples_ingested, 1_000);
        assert_eq!(stats.buckets_emitted, 60);
        assert_eq!(stats.empty_buckets, 2);
    }

    #[test]
    fn test_run_log_reset() {
        let log = RunLog::new();
        log.record_samples(100);
        log.reset();
        assert_eq!(log.stats().samples_ingested, 0);
    }

    #[test]
    fn test_persistence_round_trip() {
        let path = temp_path("run.json");
        let _ = std::fs::remove_file(&path);

        let log = RunLog::with_persistence(path.clone());
        log.record_processed();
        log.record_buckets(10, 1);
        log.save().unwrap();

        let restored = RunLog::with_persistence(path.clone());
        let stats = restored.stats();
        assert_eq!(stats.recordings_processed, 1);
        assert_eq!(stats.buckets_emitted, 10);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_summary_format() {
        let summary = create_shared_log().summary();
        assert!(summary.contains("Recordings processed"));
        assert!(summary.contains("VMC buckets"));
    }
}
