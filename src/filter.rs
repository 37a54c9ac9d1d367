/*!
 * Inclusion rules for files and directories
 *
 * Everything here is a pure predicate over names and relative paths, except
 * binary detection which reads the file.
 */

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Markers that make a path git-related. Matched as substrings.
const GIT_MARKERS: [&str; 3] = [".git", ".gitignore", ".gitattributes"];

const LICENSE_NAMES: [&str; 3] = ["license", "license.txt", "license.md"];

const README_NAMES: [&str; 3] = ["readme", "readme.txt", "readme.md"];

/// Number of leading bytes inspected by [`ContentSniffer`]
const SNIFF_LEN: u64 = 8192;

/// True if `path` contains any git marker anywhere in it.
///
/// This is a substring test, not a path-component test: `.github/` and
/// `big.gitattributes-backup` both count as git-related.
pub fn is_git_related(path: &str) -> bool {
    GIT_MARKERS.iter().any(|marker| path.contains(marker))
}

/// Name-based exclusion: git files, license files and readme files.
pub fn should_exclude(
    filename: &str,
    ignore_git: bool,
    exclude_license: bool,
    exclude_readme: bool,
) -> bool {
    if ignore_git && is_git_related(filename) {
        return true;
    }

    let lower = filename.to_lowercase();
    if exclude_license && LICENSE_NAMES.contains(&lower.as_str()) {
        return true;
    }
    if exclude_readme && README_NAMES.contains(&lower.as_str()) {
        return true;
    }

    false
}

/// Suffix-based extension filtering.
///
/// Entries are plain suffixes, not parsed extensions: `.py` keeps `a.py`
/// but not `c.spy`, while a dotless `py` also keeps `happy`. An empty
/// include list keeps everything not excluded.
pub fn matches_extension_filters<S: AsRef<str>>(
    filename: &str,
    exclude: &[S],
    include: &[S],
) -> bool {
    if exclude.iter().any(|ext| filename.ends_with(ext.as_ref())) {
        return false;
    }

    include.is_empty() || include.iter().any(|ext| filename.ends_with(ext.as_ref()))
}

/// Filter options for one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Skip git metadata files and directories
    pub ignore_git: bool,
    /// Skip LICENSE / LICENSE.txt / LICENSE.md
    pub exclude_license: bool,
    /// Skip README / README.txt / README.md
    pub exclude_readme: bool,
    /// Suffixes to exclude
    pub exclude_extensions: Vec<String>,
    /// Suffixes to keep; empty keeps all
    pub include_extensions: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            ignore_git: true,
            exclude_license: true,
            exclude_readme: false,
            exclude_extensions: Vec::new(),
            include_extensions: Vec::new(),
        }
    }
}

impl FilterConfig {
    /// Whether a file with this name belongs in the structure listing and,
    /// unless it turns out to be binary, in the concatenated content
    pub fn includes_file(&self, filename: &str) -> bool {
        !should_exclude(
            filename,
            self.ignore_git,
            self.exclude_license,
            self.exclude_readme,
        ) && matches_extension_filters(
            filename,
            &self.exclude_extensions,
            &self.include_extensions,
        )
    }

    /// Whether a directory (given by its `/`-joined path relative to the
    /// scan root) is skipped along with everything below it
    pub fn prunes_dir(&self, rel_path: &str) -> bool {
        self.ignore_git && is_git_related(rel_path)
    }
}

/// Decides whether a file is binary and must stay out of the content
pub trait BinaryDetector: Send + Sync {
    /// True if the file should be treated as binary
    fn is_binary(&self, path: &Path) -> bool;
}

/// Treats a file as text only if all of it decodes as UTF-8.
///
/// Unreadable files are reported as binary as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Decoder;

impl BinaryDetector for Utf8Decoder {
    fn is_binary(&self, path: &Path) -> bool {
        fs::read_to_string(path).is_err()
    }
}

/// Samples the first few KiB and classifies them with `content_inspector`.
///
/// Cheaper on large files and stricter about control bytes, but a file
/// that is invalid UTF-8 past the sample still passes and then fails to
/// read later.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentSniffer;

impl BinaryDetector for ContentSniffer {
    fn is_binary(&self, path: &Path) -> bool {
        let mut sample = Vec::with_capacity(SNIFF_LEN as usize);
        let read = File::open(path).and_then(|file| file.take(SNIFF_LEN).read_to_end(&mut sample));
        match read {
            Ok(_) => content_inspector::inspect(&sample).is_binary(),
            Err(_) => true,
        }
    }
}

/// Which [`BinaryDetector`] to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryDetection {
    /// Full UTF-8 decode of the file
    #[default]
    Decode,
    /// Byte sampling of the first 8 KiB
    Sniff,
}

impl BinaryDetection {
    /// Build the detector for this mode
    pub fn detector(self) -> Box<dyn BinaryDetector> {
        match self {
            Self::Decode => Box::new(Utf8Decoder),
            Self::Sniff => Box::new(ContentSniffer),
        }
    }
}
