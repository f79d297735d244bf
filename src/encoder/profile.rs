//! Named encoder profiles and the registry they are selected from

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

use super::{output_path, EncoderKind};
use crate::audio::AudioFile;
use crate::error::{MulticodeError, Result};
use crate::tools::Toolbox;

/// An encoder bound to fixed options, writing into its own output folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Unique registry key, as given to `-s`
    pub name: &'static str,
    /// Subfolder of the output directory
    pub folder: &'static str,
    pub encoder: EncoderKind,
    pub options: &'static [&'static str],
}

impl Profile {
    pub const fn new(
        name: &'static str,
        folder: &'static str,
        encoder: EncoderKind,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            folder,
            encoder,
            options,
        }
    }

    pub fn extension(&self) -> &'static str {
        self.encoder.extension()
    }

    /// Encode `source` to `output_base` plus this profile's extension
    ///
    /// `source` is decoded first if it has not been already; the decoded
    /// form is cached on `source`, so repeated calls across profiles share
    /// one decode. Absent tags are not passed to the encoder. On failure no
    /// partial output is left behind.
    pub fn encode(
        &self,
        source: &mut AudioFile,
        output_base: &Path,
        tools: &Toolbox,
    ) -> Result<AudioFile> {
        let tags = source.tags().clone();
        let pcm = source.decode(tools)?.path().to_path_buf();
        let output = output_path(output_base, self.extension());

        for invocation in
            self.encoder
                .invocations(self.options, &pcm, &output, &tags, tools.paths())
        {
            tools.run_checked(&invocation).map_err(|reason| {
                MulticodeError::encode_failed(self.name, source.path(), reason)
            })?;
        }

        debug!("Encoded {}", output.display());
        AudioFile::with_tags(&output, self.encoder.output_format(), tags).map_err(|e| {
            MulticodeError::encode_failed(self.name, source.path(), e.to_string())
        })
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

const BUILTIN_PROFILES: &[Profile] = &[
    Profile::new("alac", "alac", EncoderKind::Alac, &[]),
    Profile::new("flac", "flac", EncoderKind::Flac, &["--best", "--verify"]),
    Profile::new("oggenc-q5", "vorbis-q5", EncoderKind::Oggenc, &["-q", "5"]),
    Profile::new(
        "lame-vbr2",
        "mp3-vbr2",
        EncoderKind::Lame,
        &["-m", "j", "-h", "--vbr-new", "-V", "2", "--id3v2-only", "--noreplaygain"],
    ),
    Profile::new(
        "lame-cbr192",
        "mp3-cbr192",
        EncoderKind::Lame,
        &["-m", "j", "-h", "-b", "192", "--id3v2-only", "--noreplaygain"],
    ),
    Profile::new(
        "lame-cbr256",
        "mp3-cbr256",
        EncoderKind::Lame,
        &["-m", "j", "-h", "-b", "256", "--id3v2-only", "--noreplaygain"],
    ),
    Profile::new(
        "lame-standard",
        "mp3-standard",
        EncoderKind::Lame,
        &["--preset", "standard", "--id3v2-only", "--noreplaygain"],
    ),
    Profile::new(
        "lame-extreme",
        "mp3-extreme",
        EncoderKind::Lame,
        &["--preset", "extreme", "--id3v2-only", "--noreplaygain"],
    ),
    Profile::new(
        "lame-insane",
        "mp3-insane",
        EncoderKind::Lame,
        &["--preset", "insane", "--id3v2-only", "--noreplaygain"],
    ),
];

/// The fixed list of known profiles, built once at startup
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<Profile>,
}

impl ProfileRegistry {
    /// Every built-in profile
    pub fn builtin() -> Self {
        Self {
            profiles: BUILTIN_PROFILES.to_vec(),
        }
    }

    /// Look a profile up by name
    pub fn get(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| MulticodeError::UnknownProfile(name.to_string()))
    }

    /// Resolve the profiles named on the command line, keeping their order
    ///
    /// Unknown and repeated names are rejected. Distinct profiles that share
    /// an output folder are allowed but warned about.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Profile>> {
        if names.is_empty() {
            return Err(MulticodeError::NoProfiles);
        }

        let mut seen = HashSet::new();
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let profile = self.get(name)?;
            if !seen.insert(profile.name) {
                return Err(MulticodeError::DuplicateProfile(name.to_string()));
            }
            selected.push(profile.clone());
        }

        let mut folders = HashSet::new();
        for profile in &selected {
            if !folders.insert((profile.folder, profile.extension())) {
                warn!(
                    "Profile {} writes to folder \"{}\" used by another selected profile; outputs will overwrite each other",
                    profile.name, profile.folder
                );
            }
        }
        Ok(selected)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
