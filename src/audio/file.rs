//! The AudioFile model and its decode protocol

use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::tags;
use crate::error::{MulticodeError, Result};
use crate::tools::{remove_quietly, Invocation, ToolPaths, Toolbox};
use crate::types::{AudioFormat, Tags};

/// One audio file on disk, with its tags and (once decoded) its PCM form
///
/// An `AudioFile` is only constructed for a path that is a readable regular
/// file at construction time.
#[derive(Debug)]
pub struct AudioFile {
    path: PathBuf,
    format: AudioFormat,
    tags: Tags,
    /// Temporary PCM file created by `decode`, owned by this instance
    decoded: Option<Box<AudioFile>>,
}

/// Classify `path` and open it as an AudioFile, loading its tags
///
/// Returns `None` for anything that is not a readable regular file with a
/// recognized extension; the caller is responsible for reporting it.
pub fn classify(path: &Path, tools: &Toolbox) -> Option<AudioFile> {
    let format = AudioFormat::from_path(path)?;
    match AudioFile::open(path, format, tools) {
        Ok(file) => Some(file),
        Err(e) => {
            debug!("Cannot open {} as {}: {}", path.display(), format, e);
            None
        }
    }
}

fn ensure_readable_file(path: &Path) -> Result<()> {
    let file = File::open(path)?;
    if file.metadata()?.is_file() {
        Ok(())
    } else {
        Err(MulticodeError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        )))
    }
}

impl AudioFile {
    /// Open an existing file of a known format, reading its tags
    pub fn open(path: impl Into<PathBuf>, format: AudioFormat, tools: &Toolbox) -> Result<Self> {
        let path = path.into();
        ensure_readable_file(&path)?;
        let tags = tags::load_tags(format, &path, tools);
        Ok(Self {
            path,
            format,
            tags,
            decoded: None,
        })
    }

    /// Wrap an existing file whose tags are already known
    pub fn with_tags(path: impl Into<PathBuf>, format: AudioFormat, tags: Tags) -> Result<Self> {
        let path = path.into();
        ensure_readable_file(&path)?;
        Ok(Self {
            path,
            format,
            tags,
            decoded: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Containing directory
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Base filename, e.g. `track.flac`
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Filename without its extension, e.g. `track`
    pub fn name_without_extension(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Path of the cached temporary PCM file, if one exists
    pub fn decoded_path(&self) -> Option<&Path> {
        self.decoded.as_deref().map(AudioFile::path)
    }

    /// Produce the PCM form of this file
    ///
    /// PCM formats return themselves. Compressed formats run their decoder
    /// into a fresh temporary file on the first call and return the cached
    /// result on every later call. A failed decode caches nothing.
    pub fn decode(&mut self, tools: &Toolbox) -> Result<&AudioFile> {
        if self.format.is_pcm() {
            return Ok(self);
        }

        let decoded = match self.decoded.take() {
            Some(cached) => cached,
            None => Box::new(self.decode_to_temporary(tools)?),
        };
        Ok(&**self.decoded.insert(decoded))
    }

    fn decode_to_temporary(&self, tools: &Toolbox) -> Result<AudioFile> {
        let temp = tools.temp_path(&format!("{}.wav", self.name()));
        let Some(invocation) = decoder_invocation(self.format, &self.path, &temp, tools.paths())
        else {
            return Err(MulticodeError::decode_failed(
                &self.path,
                format!("no decoder for {} files", self.format),
            ));
        };

        tools
            .run_checked(&invocation)
            .map_err(|reason| MulticodeError::decode_failed(&self.path, reason))?;

        AudioFile::with_tags(&temp, AudioFormat::Wave, self.tags.clone()).map_err(|e| {
            remove_quietly(&temp);
            MulticodeError::decode_failed(&self.path, format!("decoded output unreadable: {}", e))
        })
    }

    /// Delete the temporary PCM file created by `decode`, if any
    ///
    /// Safe to call repeatedly; deletion failures are ignored.
    pub fn remove_temporary_files(&mut self) {
        if let Some(decoded) = self.decoded.take() {
            if decoded.path != self.path {
                remove_quietly(&decoded.path);
            }
        }
    }
}

/// The program call that decodes `input` to a wave file at `output`
fn decoder_invocation(
    format: AudioFormat,
    input: &Path,
    output: &Path,
    paths: &ToolPaths,
) -> Option<Invocation> {
    let invocation = match format {
        AudioFormat::Wave | AudioFormat::Aiff => return None,
        // afconvert assumes 16-bit little-endian output
        AudioFormat::Alac => Invocation::new(&paths.afconvert)
            .args(["-f", "WAVE", "-d", "LEI16"])
            .arg(input)
            .arg(output),
        AudioFormat::Flac => Invocation::new(&paths.flac)
            .args(["--silent", "--decode", "-o"])
            .arg(output)
            .arg(input),
        AudioFormat::Vorbis => Invocation::new(&paths.oggdec)
            .args(["--quiet", "-o"])
            .arg(output)
            .arg(input),
        AudioFormat::Mp3 => Invocation::new(&paths.madplay)
            .args(["--quiet", "-o"])
            .arg(output)
            .arg(input),
        AudioFormat::Mp4 => Invocation::new(&paths.faad)
            .args(["--quiet", "-o"])
            .arg(output)
            .arg(input),
    };
    Some(invocation.creates(output))
}
