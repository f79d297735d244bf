//! Work-item construction
//!
//! Turns the scanned input roots into one queue entry per classified file,
//! each fanned out to one target per selected profile.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::audio::{self, AudioFile};
use crate::encoder::{output_path, Profile};
use crate::error::MulticodeError;
use crate::tools::Toolbox;
use crate::types::FileList;

/// One (profile, output path) pair of a queue entry
#[derive(Debug, Clone)]
pub struct EncodeTarget {
    pub profile: Profile,
    /// Output path without the profile's extension
    pub output: PathBuf,
}

impl EncodeTarget {
    /// The file the encoder will write
    pub fn output_file(&self) -> PathBuf {
        output_path(&self.output, self.profile.extension())
    }
}

/// One unit of work: an input file and everything it is encoded to
#[derive(Debug)]
pub struct QueueEntry {
    /// 1-based position, for progress display
    pub number: usize,
    pub input: AudioFile,
    pub targets: Vec<EncodeTarget>,
}

/// The fully built work queue, plus the files that could not be classified
#[derive(Debug, Default)]
pub struct WorkQueue {
    pub entries: Vec<QueueEntry>,
    pub unclassified: Vec<PathBuf>,
}

impl WorkQueue {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of encodes across all entries
    pub fn target_count(&self) -> usize {
        self.entries.iter().map(|e| e.targets.len()).sum()
    }
}

/// Build the work queue for `file_lists` and the selected `profiles`
///
/// Each output path is `output_dir/<profile folder>/<root name>/<relative
/// path without extension>`. Unclassifiable files are warned about and
/// collected, never fatal.
pub fn build_queue(
    file_lists: &[FileList],
    profiles: &[Profile],
    output_dir: &Path,
    tools: &Toolbox,
) -> WorkQueue {
    warn_on_shared_root_names(file_lists);

    let mut queue = WorkQueue::default();
    for list in file_lists {
        let root_name = list.root_name();
        for path in &list.files {
            let Some(input) = audio::classify(path, tools) else {
                warn!("{}", MulticodeError::Unclassified { path: path.clone() });
                queue.unclassified.push(path.clone());
                continue;
            };

            let relative = relative_without_extension(&list.root, path);
            let targets = profiles
                .iter()
                .map(|profile| EncodeTarget {
                    profile: profile.clone(),
                    output: output_dir.join(profile.folder).join(&root_name).join(&relative),
                })
                .collect();

            let number = queue.entries.len() + 1;
            debug!("Queued #{} {} ({})", number, path.display(), input.format());
            queue.entries.push(QueueEntry {
                number,
                input,
                targets,
            });
        }
    }

    info!(
        "Queued {} files for {} encodes ({} unrecognized)",
        queue.len(),
        queue.target_count(),
        queue.unclassified.len()
    );
    queue
}

/// `path` relative to `root` with its final extension removed
fn relative_without_extension(root: &Path, path: &Path) -> PathBuf {
    let relative = match path.strip_prefix(root) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => PathBuf::from(path.file_name().unwrap_or(path.as_os_str())),
    };
    relative.with_extension("")
}

fn warn_on_shared_root_names(file_lists: &[FileList]) {
    let mut by_name: HashMap<String, &Path> = HashMap::new();
    for list in file_lists {
        let name = list.root_name();
        if let Some(first) = by_name.get(&name) {
            warn!(
                "Input folders {} and {} share the name \"{}\"; their outputs will be mixed together",
                first.display(),
                list.root.display(),
                name
            );
        } else {
            by_name.insert(name, &list.root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::ProfileRegistry;
    use crate::testing::MockToolRunner;
    use crate::tools::ToolPaths;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn toolbox(dir: &Path) -> Toolbox {
        Toolbox::new(
            Arc::new(MockToolRunner::new()),
            ToolPaths::default(),
            dir.to_path_buf(),
        )
    }

    fn file_list(root: &Path, names: &[&str]) -> FileList {
        let files = names
            .iter()
            .map(|name| {
                let path = root.join(name);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(&path, b"x").unwrap();
                path
            })
            .collect();
        FileList::new(root.to_path_buf(), files)
    }

    #[test]
    fn test_fan_out_is_files_times_profiles() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("music");
        let lists = [file_list(&root, &["a.flac", "b.mp3", "sub/c.wav"])];
        let profiles = ProfileRegistry::builtin()
            .select(&["flac", "lame-vbr2"])
            .unwrap();

        let queue = build_queue(&lists, &profiles, Path::new("/out"), &toolbox(dir.path()));

        assert_eq!(queue.len(), 3);
        assert!(queue.entries.iter().all(|e| e.targets.len() == 2));
        assert_eq!(queue.target_count(), 6);
        let numbers: Vec<_> = queue.entries.iter().map(|e| e.number).collect();
        assert_eq!(numbers, [1, 2, 3]);
    }

    #[test]
    fn test_output_paths_mirror_input_layout() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("music");
        let lists = [file_list(&root, &["album/01. Intro.flac"])];
        let profiles = ProfileRegistry::builtin()
            .select(&["lame-vbr2", "flac"])
            .unwrap();

        let queue = build_queue(&lists, &profiles, Path::new("/out"), &toolbox(dir.path()));
        let targets = &queue.entries[0].targets;

        assert_eq!(targets[0].profile.name, "lame-vbr2");
        assert_eq!(targets[0].output, PathBuf::from("/out/mp3-vbr2/music/album/01. Intro"));
        assert_eq!(
            targets[0].output_file(),
            PathBuf::from("/out/mp3-vbr2/music/album/01. Intro.mp3")
        );
        assert_eq!(
            targets[1].output_file(),
            PathBuf::from("/out/flac/music/album/01. Intro.flac")
        );
    }

    #[test]
    fn test_unclassified_files_are_collected() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("music");
        let lists = [file_list(&root, &["cover.jpg", "notes.xyz", "track.mp3"])];
        let profiles = ProfileRegistry::builtin().select(&["flac"]).unwrap();

        let queue = build_queue(&lists, &profiles, Path::new("/out"), &toolbox(dir.path()));

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.unclassified, [root.join("cover.jpg"), root.join("notes.xyz")]);
    }

    #[test]
    fn test_numbers_continue_across_roots() {
        let dir = TempDir::new().unwrap();
        let lists = [
            file_list(&dir.path().join("one"), &["a.flac"]),
            file_list(&dir.path().join("two"), &["b.flac", "c.flac"]),
        ];
        let profiles = ProfileRegistry::builtin().select(&["alac"]).unwrap();

        let queue = build_queue(&lists, &profiles, Path::new("/out"), &toolbox(dir.path()));

        let numbers: Vec<_> = queue.entries.iter().map(|e| e.number).collect();
        assert_eq!(numbers, [1, 2, 3]);
        assert_eq!(queue.entries[2].targets[0].output, PathBuf::from("/out/alac/two/c"));
    }

    #[test]
    fn test_empty_input_gives_empty_queue() {
        let dir = TempDir::new().unwrap();
        let lists = [FileList::new(dir.path().to_path_buf(), Vec::new())];
        let profiles = ProfileRegistry::builtin().select(&["flac"]).unwrap();
        let queue = build_queue(&lists, &profiles, Path::new("/out"), &toolbox(dir.path()));
        assert!(queue.is_empty());
        assert!(queue.unclassified.is_empty());
    }
}
