//! Tag extraction from tag-reader output
//!
//! Each compressed variant has a tag-reading program and a table of line
//! patterns. Patterns are anchored at the start of a line and matched
//! case-insensitively; the first capture group is the value. A field with no
//! matching line is simply absent.

use regex_lite::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::tools::{Invocation, ToolPaths, Toolbox};
use crate::types::{AudioFormat, Tags, TagKey};

struct PatternTable {
    source: &'static [(TagKey, &'static str)],
    compiled: OnceLock<Vec<(TagKey, Regex)>>,
}

impl PatternTable {
    const fn new(source: &'static [(TagKey, &'static str)]) -> Self {
        Self {
            source,
            compiled: OnceLock::new(),
        }
    }

    fn patterns(&self) -> &[(TagKey, Regex)] {
        self.compiled.get_or_init(|| {
            self.source
                .iter()
                .filter_map(|(key, pattern)| match Regex::new(pattern) {
                    Ok(re) => Some((*key, re)),
                    Err(e) => {
                        warn!("Invalid tag pattern {:?}: {}", pattern, e);
                        None
                    }
                })
                .collect()
        })
    }
}

// Comment atoms are not read back from ALAC files.
static ALAC_PATTERNS: PatternTable = PatternTable::new(&[
    (TagKey::Artist, r#"(?i)^Atom "©ART" contains: (.+)"#),
    (TagKey::Album, r#"(?i)^Atom "©alb" contains: (.+)"#),
    (TagKey::Title, r#"(?i)^Atom "©nam" contains: (.+)"#),
    (TagKey::Track, r#"(?i)^Atom "trkn" contains: (.+)"#),
    (TagKey::Year, r#"(?i)^Atom "©day" contains: (\d+)"#),
]);

/// Vorbis comments, shared by FLAC and Ogg Vorbis
static XIPH_PATTERNS: PatternTable = PatternTable::new(&[
    (TagKey::Artist, r"(?i)^ARTIST=(.+)"),
    (TagKey::Album, r"(?i)^ALBUM=(.+)"),
    (TagKey::Title, r"(?i)^TITLE=(.+)"),
    (TagKey::Track, r"(?i)^TRACKNUMBER=(.+)"),
    (TagKey::Year, r"(?i)^DATE=(.+)"),
    (TagKey::Comment, r"(?i)^COMMENT=(.+)"),
]);

static MP3_PATTERNS: PatternTable = PatternTable::new(&[
    (TagKey::Artist, r"(?i)^\s*artist: (.+)"),
    (TagKey::Album, r"(?i)^\s*album: (.+)"),
    (TagKey::Title, r"(?i)^\s*title: (.+)"),
    (TagKey::Track, r"(?i)^\s*track: (.+)"),
    (TagKey::Year, r"(?i)^\s*year: (.+)"),
]);

static MP4_PATTERNS: PatternTable = PatternTable::new(&[
    (TagKey::Artist, r"(?i)^artist: (.+)"),
    (TagKey::Album, r"(?i)^album: (.+)"),
    (TagKey::Title, r"(?i)^title: (.+)"),
    (TagKey::Track, r"(?i)^track: (.+)"),
    (TagKey::Year, r"(?i)^date: (.+)"),
]);

fn pattern_table(format: AudioFormat) -> Option<&'static PatternTable> {
    match format {
        AudioFormat::Wave | AudioFormat::Aiff => None,
        AudioFormat::Alac => Some(&ALAC_PATTERNS),
        AudioFormat::Flac | AudioFormat::Vorbis => Some(&XIPH_PATTERNS),
        AudioFormat::Mp3 => Some(&MP3_PATTERNS),
        AudioFormat::Mp4 => Some(&MP4_PATTERNS),
    }
}

/// The program call that prints the tags of `path`, if the format has tags
pub fn reader_invocation(format: AudioFormat, path: &Path, paths: &ToolPaths) -> Option<Invocation> {
    let invocation = match format {
        AudioFormat::Wave | AudioFormat::Aiff => return None,
        AudioFormat::Alac => Invocation::new(&paths.atomicparsley).arg(path).arg("-t"),
        AudioFormat::Flac => Invocation::new(&paths.metaflac)
            .arg("--export-tags-to=-")
            .arg(path),
        AudioFormat::Vorbis => Invocation::new(&paths.vorbiscomment).arg("--list").arg(path),
        AudioFormat::Mp3 => Invocation::new(&paths.madplay)
            .arg("--show-tags-only")
            .arg(path),
        AudioFormat::Mp4 => Invocation::new(&paths.faad).arg("--info").arg(path),
    };
    Some(invocation)
}

/// Extract tags from a tag reader's stdout
///
/// When a field appears on several lines the last one wins.
pub fn parse_tags(format: AudioFormat, output: &str) -> Tags {
    let mut tags = Tags::new();
    let Some(table) = pattern_table(format) else {
        return tags;
    };

    for line in output.lines() {
        for (key, re) in table.patterns() {
            if let Some(value) = re.captures(line).and_then(|c| c.get(1)) {
                tags.set(*key, value.as_str().trim_end());
            }
        }
    }
    tags
}

/// Read the tags of `path` through its format's tag reader
///
/// Never fails: a reader that cannot run yields an empty mapping.
pub fn load_tags(format: AudioFormat, path: &Path, tools: &Toolbox) -> Tags {
    let Some(invocation) = reader_invocation(format, path, tools.paths()) else {
        return Tags::new();
    };

    match tools.run(&invocation) {
        Ok(output) => {
            let tags = parse_tags(format, &output.stdout);
            debug!("Read {} tags from {}", tags.len(), path.display());
            tags
        }
        Err(e) => {
            warn!("Could not read tags from {}: {}", path.display(), e);
            Tags::new()
        }
    }
}
