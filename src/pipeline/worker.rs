//! Fixed-size worker pool
//!
//! All entries are placed on one shared channel before any worker starts.
//! Each worker pulls without blocking and exits as soon as it finds the
//! queue empty; nothing is ever added or requeued after that.

use crossbeam_channel::{unbounded, Receiver};
use indicatif::ProgressBar;
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::{debug, error, info, warn};

use super::queue::QueueEntry;
use super::report::{FailedEntry, FailureCollector};
use crate::error::{MulticodeError, Result};
use crate::tools::Toolbox;

/// Number of workers to run when none is configured
///
/// Falls back to a single worker when the parallelism of the machine cannot
/// be determined.
pub fn available_workers() -> usize {
    match thread::available_parallelism() {
        Ok(n) => n.get(),
        Err(e) => {
            warn!("Could not detect the number of processors ({}); using 1 worker", e);
            1
        }
    }
}

/// A pool of OS threads that drains a work queue once
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Process every entry and return the ones that failed
    ///
    /// Returns only after every worker has terminated.
    pub fn run(
        &self,
        entries: Vec<QueueEntry>,
        tools: &Toolbox,
        progress: Option<ProgressBar>,
    ) -> Vec<FailedEntry> {
        let total = entries.len();
        let (tx, rx) = unbounded::<QueueEntry>();
        for entry in entries {
            // The receiver is held below, so this cannot fail
            let _ = tx.send(entry);
        }
        drop(tx);

        let collector = FailureCollector::new();
        let workers = self.size.min(total.max(1));
        debug!("Starting {} workers for {} entries", workers, total);

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let queue = rx.clone();
            let tools = tools.clone();
            let collector = collector.clone();
            let progress = progress.clone();
            let spawned = thread::Builder::new()
                .name(format!("multicode-worker-{}", id))
                .spawn(move || work(queue, total, &tools, &collector, progress.as_ref()));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => error!("Failed to start worker {}: {}", id, e),
            }
        }

        if handles.is_empty() {
            warn!("No worker threads could be started; processing on the main thread");
            work(rx, total, tools, &collector, progress.as_ref());
        }

        for handle in handles {
            if let Err(panic_info) = handle.join() {
                error!("Worker thread panicked: {}", panic_message(&*panic_info));
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Encoding complete");
        }

        collector.drain()
    }
}

/// Body of one worker: pull until the queue is observed empty
fn work(
    queue: Receiver<QueueEntry>,
    total: usize,
    tools: &Toolbox,
    collector: &FailureCollector,
    progress: Option<&ProgressBar>,
) {
    while let Ok(mut entry) = queue.try_recv() {
        let prefix = format!("[{:>6} / {:>6}]: ", entry.number, total);
        info!("{}{}", prefix, entry.input.path().display());
        let name = entry.input.name();

        let result = panic::catch_unwind(AssertUnwindSafe(|| process_entry(&mut entry, tools)))
            .unwrap_or_else(|payload| {
                Err(MulticodeError::WorkerPanic {
                    path: entry.input.path().to_path_buf(),
                    message: panic_message(&*payload),
                })
            });
        entry.input.remove_temporary_files();

        if let Err(e) = result {
            error!("{}{}", prefix, e);
            collector.record(entry, e);
        }

        if let Some(pb) = progress {
            pb.inc(1);
            pb.set_message(name);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Decode an entry once, then encode it to each target in order
///
/// The first failing step abandons the remaining targets. Temporary files
/// are left for the caller to remove.
pub fn process_entry(entry: &mut QueueEntry, tools: &Toolbox) -> Result<()> {
    entry.input.decode(tools)?;

    for target in &entry.targets {
        if let Some(dir) = target.output.parent() {
            if !dir.is_dir() {
                debug!("Creating directory {}", dir.display());
            }
            fs::create_dir_all(dir).map_err(|e| MulticodeError::directory_creation(dir, e))?;
        }
        target.profile.encode(&mut entry.input, &target.output, tools)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioFile;
    use crate::encoder::ProfileRegistry;
    use crate::pipeline::queue::EncodeTarget;
    use crate::testing::MockToolRunner;
    use crate::tools::ToolPaths;
    use crate::types::{AudioFormat, Tags};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn entry(dir: &Path, number: usize, name: &str, profiles: &[&str]) -> QueueEntry {
        let path = dir.join("in").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"x").unwrap();
        let format = AudioFormat::from_path(&path).unwrap();
        let registry = ProfileRegistry::builtin();
        let targets = registry
            .select(profiles)
            .unwrap()
            .into_iter()
            .map(|profile| EncodeTarget {
                output: dir.join("out").join(profile.folder).join(name).with_extension(""),
                profile,
            })
            .collect();
        QueueEntry {
            number,
            input: AudioFile::with_tags(path, format, Tags::new()).unwrap(),
            targets,
        }
    }

    fn setup() -> (TempDir, Arc<MockToolRunner>, Toolbox) {
        let dir = TempDir::new().unwrap();
        let temp = dir.path().join("tmp");
        fs::create_dir(&temp).unwrap();
        let runner = Arc::new(MockToolRunner::new());
        let tools = Toolbox::new(runner.clone(), ToolPaths::default(), temp);
        (dir, runner, tools)
    }

    #[test]
    fn test_pool_size_is_at_least_one() {
        assert_eq!(WorkerPool::new(0).size(), 1);
        assert!(available_workers() >= 1);
    }

    #[test]
    fn test_every_entry_is_processed() {
        let (dir, runner, tools) = setup();
        let entries: Vec<_> = (1..=12)
            .map(|n| entry(dir.path(), n, &format!("t{}.flac", n), &["lame-vbr2"]))
            .collect();

        let failures = WorkerPool::new(4).run(entries, &tools, None);

        assert!(failures.is_empty());
        assert_eq!(runner.calls_to("lame"), 12);
        for n in 1..=12 {
            assert!(dir.path().join(format!("out/mp3-vbr2/t{}.mp3", n)).is_file());
        }
    }

    #[test]
    fn test_decode_failure_skips_all_targets() {
        let (dir, runner, tools) = setup();
        runner.fail_on("flac", "bad.flac");
        let entries = vec![entry(dir.path(), 1, "bad.flac", &["lame-vbr2", "oggenc-q5"])];

        let failures = WorkerPool::new(2).run(entries, &tools, None);

        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0].error, MulticodeError::DecodeFailed { .. }));
        assert_eq!(runner.calls_to("lame"), 0);
        assert_eq!(runner.calls_to("oggenc"), 0);
    }

    #[test]
    fn test_encode_failure_stops_later_targets_only() {
        let (dir, runner, tools) = setup();
        runner.fail_on("oggenc", "a.wav");
        let entries = vec![
            entry(dir.path(), 1, "a.wav", &["flac", "oggenc-q5", "lame-vbr2"]),
            entry(dir.path(), 2, "b.wav", &["flac", "oggenc-q5", "lame-vbr2"]),
        ];

        let failures = WorkerPool::new(1).run(entries, &tools, None);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].entry.number, 1);
        assert!(dir.path().join("out/flac/a.flac").is_file());
        assert!(!dir.path().join("out/vorbis-q5/a.ogg").exists());
        assert!(!dir.path().join("out/mp3-vbr2/a.mp3").exists());
        assert_eq!(runner.calls_to("lame"), 1, "only b reaches lame");
        assert!(dir.path().join("out/mp3-vbr2/b.mp3").is_file());
    }

    #[test]
    fn test_directory_creation_failure_aborts_entry() {
        let (dir, runner, tools) = setup();
        // A file where the profile folder should be
        fs::create_dir_all(dir.path().join("out")).unwrap();
        fs::write(dir.path().join("out/flac"), b"in the way").unwrap();
        let entries = vec![entry(dir.path(), 1, "a.wav", &["flac", "lame-vbr2"])];

        let failures = WorkerPool::new(1).run(entries, &tools, None);

        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0].error, MulticodeError::DirectoryCreation { .. }));
        assert_eq!(runner.calls_to("lame"), 0);
    }

    #[test]
    fn test_temporary_files_are_always_removed() {
        let (dir, runner, tools) = setup();
        runner.fail_on("lame", "b.mp3");
        let entries = vec![
            entry(dir.path(), 1, "a.mp3", &["flac"]),
            entry(dir.path(), 2, "b.mp3", &["lame-vbr2"]),
        ];

        let failures = WorkerPool::new(2).run(entries, &tools, None);

        assert_eq!(failures.len(), 1);
        assert_eq!(fs::read_dir(tools.temp_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_panicking_tool_fails_only_its_entry() {
        let (dir, runner, tools) = setup();
        runner.panic_on("lame", "a.flac");
        let entries = vec![
            entry(dir.path(), 1, "a.flac", &["lame-vbr2"]),
            entry(dir.path(), 2, "b.flac", &["lame-vbr2"]),
        ];

        let failures = WorkerPool::new(1).run(entries, &tools, None);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].entry.number, 1);
        assert!(matches!(failures[0].error, MulticodeError::WorkerPanic { .. }));
        assert!(dir.path().join("out/mp3-vbr2/b.mp3").is_file());
        assert_eq!(fs::read_dir(tools.temp_dir()).unwrap().count(), 0);
    }
}
