//! Encoders and encoder profiles
//!
//! The four encoder variants differ only in their program, their option and
//! tag syntax, and whether tags need a separate pass. Those differences live
//! in [`EncoderKind`]; the encode protocol itself is written once in
//! [`Profile::encode`].

mod profile;

pub use profile::{Profile, ProfileRegistry};

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::tools::{Invocation, ToolPaths};
use crate::types::{AudioFormat, TagKey, Tags};

/// One tag field as an encoder flag: `flag`, then `prefix` + value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagFlag {
    pub key: TagKey,
    pub flag: &'static str,
    pub prefix: &'static str,
}

const fn flag(key: TagKey, flag: &'static str, prefix: &'static str) -> TagFlag {
    TagFlag { key, flag, prefix }
}

/// AtomicParsley, used for the separate ALAC tagging pass
const ALAC_TAG_FLAGS: &[TagFlag] = &[
    flag(TagKey::Artist, "--artist", ""),
    flag(TagKey::Album, "--album", ""),
    flag(TagKey::Title, "--title", ""),
    flag(TagKey::Track, "--tracknum", ""),
    flag(TagKey::Year, "--year", ""),
    flag(TagKey::Comment, "--comment", ""),
];

const FLAC_TAG_FLAGS: &[TagFlag] = &[
    flag(TagKey::Artist, "-T", "ARTIST="),
    flag(TagKey::Album, "-T", "ALBUM="),
    flag(TagKey::Title, "-T", "TITLE="),
    flag(TagKey::Track, "-T", "TRACKNUMBER="),
    flag(TagKey::Year, "-T", "DATE="),
    flag(TagKey::Comment, "-T", "COMMENT="),
];

const OGGENC_TAG_FLAGS: &[TagFlag] = &[
    flag(TagKey::Artist, "-a", ""),
    flag(TagKey::Album, "-l", ""),
    flag(TagKey::Title, "-t", ""),
    flag(TagKey::Track, "-N", ""),
    flag(TagKey::Year, "-d", ""),
    flag(TagKey::Comment, "-c", "COMMENT="),
];

const LAME_TAG_FLAGS: &[TagFlag] = &[
    flag(TagKey::Artist, "--ta", ""),
    flag(TagKey::Album, "--tl", ""),
    flag(TagKey::Title, "--tt", ""),
    flag(TagKey::Track, "--tn", ""),
    flag(TagKey::Year, "--ty", ""),
    flag(TagKey::Comment, "--tc", ""),
];

/// Encoder variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderKind {
    /// afconvert, tagged afterwards with AtomicParsley
    Alac,
    Flac,
    /// Ogg Vorbis via oggenc
    Oggenc,
    /// MP3 via lame
    Lame,
}

impl EncoderKind {
    /// Extension appended to every output path
    pub fn extension(self) -> &'static str {
        match self {
            EncoderKind::Alac => "m4a",
            EncoderKind::Flac => "flac",
            EncoderKind::Oggenc => "ogg",
            EncoderKind::Lame => "mp3",
        }
    }

    /// Format of the files this encoder produces
    pub fn output_format(self) -> AudioFormat {
        match self {
            EncoderKind::Alac => AudioFormat::Alac,
            EncoderKind::Flac => AudioFormat::Flac,
            EncoderKind::Oggenc => AudioFormat::Vorbis,
            EncoderKind::Lame => AudioFormat::Mp3,
        }
    }

    pub fn tag_flags(self) -> &'static [TagFlag] {
        match self {
            EncoderKind::Alac => ALAC_TAG_FLAGS,
            EncoderKind::Flac => FLAC_TAG_FLAGS,
            EncoderKind::Oggenc => OGGENC_TAG_FLAGS,
            EncoderKind::Lame => LAME_TAG_FLAGS,
        }
    }

    /// Whether tags are written by an AtomicParsley call after encoding
    pub fn tags_separately(self) -> bool {
        matches!(self, EncoderKind::Alac)
    }

    /// The program calls that encode `pcm` into `output`, in order
    ///
    /// Every call declares `output` as the file it creates, so a failure at
    /// any step removes the partial result.
    pub fn invocations(
        self,
        options: &[&str],
        pcm: &Path,
        output: &Path,
        tags: &Tags,
        paths: &ToolPaths,
    ) -> Vec<Invocation> {
        let tag_args = tag_arguments(self.tag_flags(), tags);
        let (inline_tags, tag_pass) = if self.tags_separately() {
            (Vec::new(), Some(tag_args))
        } else {
            (tag_args, None)
        };

        let encode = match self {
            EncoderKind::Alac => Invocation::new(&paths.afconvert)
                .args(["-d", "alac"])
                .args(options)
                .args(inline_tags)
                .arg(pcm)
                .arg(output),
            EncoderKind::Flac => Invocation::new(&paths.flac)
                .arg("--silent")
                .args(options)
                .args(inline_tags)
                .arg("-o")
                .arg(output)
                .arg(pcm),
            EncoderKind::Oggenc => Invocation::new(&paths.oggenc)
                .arg("--quiet")
                .args(options)
                .args(inline_tags)
                .arg("-o")
                .arg(output)
                .arg(pcm),
            EncoderKind::Lame => Invocation::new(&paths.lame)
                .arg("--silent")
                .args(options)
                .args(inline_tags)
                .arg(pcm)
                .arg(output),
        };

        let mut calls = vec![encode];
        if let Some(tag_args) = tag_pass {
            calls.push(
                Invocation::new(&paths.atomicparsley)
                    .arg(output)
                    .arg("--overWrite")
                    .args(tag_args),
            );
        }
        calls.into_iter().map(|call| call.creates(output)).collect()
    }
}

/// Flag/value pairs for the tags that are present; absent tags add nothing
pub fn tag_arguments(flags: &[TagFlag], tags: &Tags) -> Vec<OsString> {
    let mut args = Vec::new();
    for tag_flag in flags {
        if let Some(value) = tags.get(tag_flag.key) {
            args.push(OsString::from(tag_flag.flag));
            args.push(OsString::from(format!("{}{}", tag_flag.prefix, value)));
        }
    }
    args
}

/// `base` with `.ext` appended
///
/// Input names may contain dots of their own, so the extension is always
/// appended rather than substituted.
pub fn output_path(base: &Path, extension: &str) -> PathBuf {
    let mut path = base.as_os_str().to_os_string();
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}
