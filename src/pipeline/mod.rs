//! Concurrent transcoding pipeline

pub mod orchestrator;
pub mod queue;
pub mod report;
pub mod worker;

pub use orchestrator::run;
pub use queue::{build_queue, EncodeTarget, QueueEntry, WorkQueue};
pub use report::{format_elapsed, FailedEntry, FailureCollector, RunSummary};
pub use worker::{available_workers, process_entry, WorkerPool};
