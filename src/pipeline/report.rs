//! Failure collection and the run summary

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::time::Duration;

use super::queue::QueueEntry;
use crate::error::MulticodeError;

/// An entry that was abandoned, with the error that stopped it
#[derive(Debug)]
pub struct FailedEntry {
    pub entry: QueueEntry,
    pub error: MulticodeError,
}

impl FailedEntry {
    pub fn path(&self) -> &std::path::Path {
        self.entry.input.path()
    }
}

/// Collects failed entries from any number of workers
///
/// Clones share one collection. Pushes need no external locking.
#[derive(Debug, Clone)]
pub struct FailureCollector {
    tx: Sender<FailedEntry>,
    rx: Receiver<FailedEntry>,
}

impl FailureCollector {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn record(&self, entry: QueueEntry, error: MulticodeError) {
        // Both ends live in self, so the channel cannot be disconnected here
        let _ = self.tx.send(FailedEntry { entry, error });
    }

    /// Take everything recorded so far, ordered by entry number
    pub fn drain(&self) -> Vec<FailedEntry> {
        let mut failures: Vec<_> = self.rx.try_iter().collect();
        failures.sort_by_key(|f| f.entry.number);
        failures
    }
}

impl Default for FailureCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Queue entries built
    pub total: usize,
    pub failures: Vec<FailedEntry>,
    pub unclassified: Vec<PathBuf>,
    pub elapsed: Duration,
    /// Selected profile names, in order
    pub profiles: Vec<String>,
    /// Set when the queue was only printed
    pub dry_run: bool,
}

impl RunSummary {
    /// Entries that completed every target
    pub fn encoded(&self) -> usize {
        if self.dry_run {
            0
        } else {
            self.total.saturating_sub(self.failures.len())
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line result: encoded and total counts, failures, elapsed time
    pub fn completion_line(&self) -> String {
        format!(
            "Encoded {} of {} files, {} failed in {}",
            self.encoded(),
            self.total,
            self.failed(),
            format_elapsed(self.elapsed)
        )
    }
}

/// Format a duration as `Dd Hh Mm Ss`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{}d {}h {}m {}s",
        secs / 86_400,
        (secs % 86_400) / 3_600,
        (secs % 3_600) / 60,
        secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioFile;
    use crate::types::{AudioFormat, Tags};
    use std::thread;
    use tempfile::TempDir;

    fn entry(dir: &TempDir, number: usize) -> QueueEntry {
        let path = dir.path().join(format!("{}.wav", number));
        std::fs::write(&path, b"x").unwrap();
        QueueEntry {
            number,
            input: AudioFile::with_tags(path, AudioFormat::Wave, Tags::new()).unwrap(),
            targets: Vec::new(),
        }
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0d 0h 0m 0s");
        assert_eq!(format_elapsed(Duration::from_secs(3_725)), "0d 1h 2m 5s");
        assert_eq!(format_elapsed(Duration::from_secs(90_061)), "1d 1h 1m 1s");
    }

    #[test]
    fn test_collector_accepts_concurrent_pushes() {
        let dir = TempDir::new().unwrap();
        let collector = FailureCollector::new();
        let entries: Vec<_> = (1..=8).rev().map(|n| entry(&dir, n)).collect();

        let handles: Vec<_> = entries
            .into_iter()
            .map(|e| {
                let collector = collector.clone();
                thread::spawn(move || collector.record(e, MulticodeError::NoInputs))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let failures = collector.drain();
        let numbers: Vec<_> = failures.iter().map(|f| f.entry.number).collect();
        assert_eq!(numbers, (1..=8).collect::<Vec<_>>());
        assert!(collector.drain().is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let dir = TempDir::new().unwrap();
        let summary = RunSummary {
            total: 3,
            failures: vec![FailedEntry {
                entry: entry(&dir, 2),
                error: MulticodeError::decode_failed("/2.flac", "exit 1"),
            }],
            ..Default::default()
        };
        assert_eq!(summary.encoded(), 2);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_success());

        let empty = RunSummary::default();
        assert_eq!(empty.encoded(), 0);
        assert!(empty.is_success());
    }

    #[test]
    fn test_completion_line_always_shows_totals() {
        let dir = TempDir::new().unwrap();
        let summary = RunSummary {
            total: 3,
            failures: vec![FailedEntry {
                entry: entry(&dir, 1),
                error: MulticodeError::decode_failed("/1.flac", "exit 1"),
            }],
            elapsed: Duration::from_secs(65),
            ..Default::default()
        };
        assert_eq!(
            summary.completion_line(),
            "Encoded 2 of 3 files, 1 failed in 0d 0h 1m 5s"
        );
        assert_eq!(
            RunSummary::default().completion_line(),
            "Encoded 0 of 0 files, 0 failed in 0d 0h 0m 0s"
        );
    }
}
