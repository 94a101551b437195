//! Run auditing for the batch analyzer.
//!
//! Tracks how many recordings, samples and buckets went through the
//! analyzer so results can be checked against the input that produced them.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, RunLog, RunStats, SharedRunLog,
};
