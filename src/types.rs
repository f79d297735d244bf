//! Core data types for multicode
//!
//! These types represent the domain model and flow through the pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

// =============================================================================
// Format variants
// =============================================================================

/// Audio formats multicode can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    /// RIFF wave, raw PCM
    Wave,
    /// AIFF, raw PCM
    Aiff,
    /// Apple Lossless in an MP4 container
    Alac,
    Flac,
    /// Ogg Vorbis
    Vorbis,
    Mp3,
    /// AAC in an MP4 container
    Mp4,
}

/// Extension table, in lookup order.
///
/// `m4a` appears for both ALAC and MP4; ALAC comes first and masks MP4.
const EXTENSION_TABLE: &[(AudioFormat, &[&str])] = &[
    (AudioFormat::Aiff, &["aif", "aiff"]),
    (AudioFormat::Alac, &["m4a"]),
    (AudioFormat::Flac, &["flac"]),
    (AudioFormat::Mp3, &["mp3"]),
    (AudioFormat::Mp4, &["mp4", "m4a"]),
    (AudioFormat::Vorbis, &["ogg"]),
    (AudioFormat::Wave, &["wav"]),
];

impl AudioFormat {
    /// Detect format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        EXTENSION_TABLE
            .iter()
            .find(|(_, exts)| exts.contains(&ext.as_str()))
            .map(|(format, _)| *format)
    }

    /// Detect format from a path's extension
    ///
    /// Paths without an extension, or with one that is not valid UTF-8, yield `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Raw PCM formats decode to themselves
    pub fn is_pcm(self) -> bool {
        matches!(self, AudioFormat::Wave | AudioFormat::Aiff)
    }

    /// Short lowercase name for logs and reports
    pub fn name(self) -> &'static str {
        match self {
            AudioFormat::Wave => "wave",
            AudioFormat::Aiff => "aiff",
            AudioFormat::Alac => "alac",
            AudioFormat::Flac => "flac",
            AudioFormat::Vorbis => "vorbis",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Tags
// =============================================================================

/// The fixed set of tag fields carried from source to every encoded output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagKey {
    Artist,
    Album,
    Title,
    Track,
    Year,
    Comment,
}

impl TagKey {
    pub const ALL: [TagKey; 6] = [
        TagKey::Artist,
        TagKey::Album,
        TagKey::Title,
        TagKey::Track,
        TagKey::Year,
        TagKey::Comment,
    ];
}

/// Tag mapping; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(BTreeMap<TagKey, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. Empty values are ignored so they never reach an encoder.
    pub fn set(&mut self, key: TagKey, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.0.insert(key, value);
        }
    }

    pub fn get(&self, key: TagKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: TagKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[(TagKey, &str); N]> for Tags {
    fn from(pairs: [(TagKey, &str); N]) -> Self {
        let mut tags = Tags::new();
        for (key, value) in pairs {
            tags.set(key, value);
        }
        tags
    }
}

// =============================================================================
// Directory snapshots
// =============================================================================

/// All files under one input root, taken once before the queue is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileList {
    /// Normalized root directory
    pub root: PathBuf,
    /// Sorted absolute paths of every file under `root`
    pub files: Vec<PathBuf>,
}

impl FileList {
    pub fn new(root: PathBuf, mut files: Vec<PathBuf>) -> Self {
        files.sort();
        Self { root, files }
    }

    /// Final component of the root, used as the per-root output folder
    pub fn root_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_supported_extension() {
        let cases = [
            ("wav", AudioFormat::Wave),
            ("aif", AudioFormat::Aiff),
            ("aiff", AudioFormat::Aiff),
            ("m4a", AudioFormat::Alac),
            ("flac", AudioFormat::Flac),
            ("ogg", AudioFormat::Vorbis),
            ("mp3", AudioFormat::Mp3),
            ("mp4", AudioFormat::Mp4),
        ];
        for (ext, expected) in cases {
            assert_eq!(AudioFormat::from_extension(ext), Some(expected), "{ext}");
        }
    }

    #[test]
    fn test_m4a_is_always_alac() {
        assert_eq!(AudioFormat::from_extension("m4a"), Some(AudioFormat::Alac));
        assert_eq!(AudioFormat::from_extension("M4A"), Some(AudioFormat::Alac));
        assert_eq!(
            AudioFormat::from_path(Path::new("/music/song.m4a")),
            Some(AudioFormat::Alac)
        );
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert_eq!(AudioFormat::from_extension("FLAC"), Some(AudioFormat::Flac));
        assert_eq!(AudioFormat::from_extension("Mp3"), Some(AudioFormat::Mp3));
    }

    #[test]
    fn test_unsupported_or_missing_extension() {
        assert_eq!(AudioFormat::from_extension("xyz"), None);
        assert_eq!(AudioFormat::from_extension(""), None);
        assert_eq!(AudioFormat::from_path(Path::new("/music/README")), None);
        assert_eq!(AudioFormat::from_path(Path::new("/music/cover.jpg")), None);
    }

    #[test]
    fn test_pcm_variants() {
        assert!(AudioFormat::Wave.is_pcm());
        assert!(AudioFormat::Aiff.is_pcm());
        assert!(!AudioFormat::Flac.is_pcm());
        assert!(!AudioFormat::Alac.is_pcm());
    }

    #[test]
    fn test_empty_tag_values_are_absent() {
        let mut tags = Tags::new();
        tags.set(TagKey::Comment, "");
        tags.set(TagKey::Artist, "A");
        assert!(!tags.contains(TagKey::Comment));
        assert_eq!(tags.get(TagKey::Artist), Some("A"));
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn test_file_list_is_sorted() {
        let list = FileList::new(
            PathBuf::from("/music"),
            vec![PathBuf::from("/music/b.mp3"), PathBuf::from("/music/a.mp3")],
        );
        assert_eq!(list.files[0], PathBuf::from("/music/a.mp3"));
        assert_eq!(list.root_name(), "music");
    }
}
