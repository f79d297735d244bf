//! Locations of the external codec binaries

use std::path::{Path, PathBuf};

/// Paths to every external program multicode calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub afconvert: PathBuf,
    pub atomicparsley: PathBuf,
    pub faad: PathBuf,
    pub flac: PathBuf,
    pub lame: PathBuf,
    pub madplay: PathBuf,
    pub metaflac: PathBuf,
    pub oggdec: PathBuf,
    pub oggenc: PathBuf,
    pub vorbiscomment: PathBuf,
}

impl Default for ToolPaths {
    /// Bare program names, resolved through `PATH`
    fn default() -> Self {
        Self {
            afconvert: PathBuf::from("afconvert"),
            atomicparsley: PathBuf::from("AtomicParsley"),
            faad: PathBuf::from("faad"),
            flac: PathBuf::from("flac"),
            lame: PathBuf::from("lame"),
            madplay: PathBuf::from("madplay"),
            metaflac: PathBuf::from("metaflac"),
            oggdec: PathBuf::from("oggdec"),
            oggenc: PathBuf::from("oggenc"),
            vorbiscomment: PathBuf::from("vorbiscomment"),
        }
    }
}

impl ToolPaths {
    /// All programs resolved inside `dir` (e.g. `/usr/local/bin`)
    pub fn with_prefix(dir: &Path) -> Self {
        let defaults = Self::default();
        let join = |p: PathBuf| dir.join(p);
        Self {
            afconvert: join(defaults.afconvert),
            atomicparsley: join(defaults.atomicparsley),
            faad: join(defaults.faad),
            flac: join(defaults.flac),
            lame: join(defaults.lame),
            madplay: join(defaults.madplay),
            metaflac: join(defaults.metaflac),
            oggdec: join(defaults.oggdec),
            oggenc: join(defaults.oggenc),
            vorbiscomment: join(defaults.vorbiscomment),
        }
    }
}
