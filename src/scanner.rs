/*!
 * Directory traversal and text rendering
 *
 * Two passes over the same tree: one for the indented structure listing,
 * one for the concatenated file contents. Both visit entries in sorted
 * order so re-running on an unchanged tree gives byte-identical output.
 */

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::AnalysisError;
use crate::filter::{BinaryDetector, Utf8Decoder, FilterConfig};
use crate::types::{Entry, EntryKind, RenderedOutput};

/// Marker repeated once per nesting level in the structure listing
const INDENT: &str = "│   ";
/// Marker in front of every listed name
const BRANCH: &str = "├── ";
/// Header for the scan root in the content pass
const ROOT_HEADER: &str = "\n---/---\n";

/// Counters collected while rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStatistics {
    /// Directories visited
    pub directories: usize,
    /// Files listed in the structure
    pub files_listed: usize,
    /// Files skipped from the content as binary
    pub binary_skipped: usize,
    /// Files skipped because they could not be read
    pub read_errors: usize,
}

/// A directory together with the files directly inside it
struct Listing {
    dirs: Vec<(PathBuf, Entry)>,
    files: Vec<(PathBuf, Entry)>,
}

/// Renders a directory tree into structure and content text
pub struct Scanner {
    /// Inclusion rules
    filter: FilterConfig,
    /// Omit files from the structure listing
    directories_only: bool,
    /// Binary classification for the content pass
    detector: Box<dyn BinaryDetector>,
}

impl Scanner {
    /// Create a scanner using full-decode binary detection
    pub fn new(filter: FilterConfig) -> Self {
        Self {
            filter,
            directories_only: false,
            detector: Box::new(Utf8Decoder),
        }
    }

    /// List only directories in the structure pass
    pub fn directories_only(mut self, directories_only: bool) -> Self {
        self.directories_only = directories_only;
        self
    }

    /// Swap in a different binary detector
    pub fn with_detector(mut self, detector: Box<dyn BinaryDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Run both passes over `root`
    pub fn render(&self, root: &Path) -> io::Result<(RenderedOutput, ScanStatistics)> {
        let mut stats = ScanStatistics::default();

        info!(root = %root.display(), "Generating folder structure");
        let structure = self.structure_with_stats(root, &mut stats)?;

        info!(root = %root.display(), "Concatenating file contents");
        let (content, file_positions) = self.concatenate_with_stats(root, &mut stats)?;

        Ok((
            RenderedOutput {
                structure,
                content,
                file_positions,
            },
            stats,
        ))
    }

    /// Build the indented structure listing.
    ///
    /// Each directory line is followed by its files, then by its
    /// subdirectories, all sorted by name. A plain filesystem walk would
    /// give the same shape in enumeration order; sorting keeps the listing
    /// stable across platforms.
    pub fn structure(&self, root: &Path) -> io::Result<String> {
        self.structure_with_stats(root, &mut ScanStatistics::default())
    }

    /// Build the concatenated content and the header offset of every file
    pub fn concatenate(&self, root: &Path) -> io::Result<(String, BTreeMap<String, usize>)> {
        self.concatenate_with_stats(root, &mut ScanStatistics::default())
    }

    pub(crate) fn structure_with_stats(
        &self,
        root: &Path,
        stats: &mut ScanStatistics,
    ) -> io::Result<String> {
        let (abs_root, root_entry) = root_entry(root)?;
        let mut lines = Vec::new();
        self.write_structure(&abs_root, &root_entry, &mut lines, stats)?;
        Ok(lines.join("\n"))
    }

    fn write_structure(
        &self,
        abs_path: &Path,
        dir: &Entry,
        lines: &mut Vec<String>,
        stats: &mut ScanStatistics,
    ) -> io::Result<()> {
        let listing = self.list_dir(abs_path, dir)?;

        lines.push(structure_line(dir));

        if !self.directories_only {
            for (_, file) in &listing.files {
                if !self.filter.includes_file(&file.name) {
                    continue;
                }
                stats.files_listed += 1;
                lines.push(structure_line(file));
            }
        }

        for (sub_path, sub) in &listing.dirs {
            if let Err(e) = self.write_structure(sub_path, sub, lines, stats) {
                warn!(path = %sub_path.display(), error = %e, "Error listing directory");
            }
        }

        Ok(())
    }

    pub(crate) fn concatenate_with_stats(
        &self,
        root: &Path,
        stats: &mut ScanStatistics,
    ) -> io::Result<(String, BTreeMap<String, usize>)> {
        let (abs_root, root_entry) = root_entry(root)?;

        let mut dirs = Vec::new();
        let root_listing = self.list_dir(&abs_root, &root_entry)?;
        self.collect_dirs(root_entry, root_listing, &mut dirs);

        // Whole relative path strings decide the order, so `a-b` precedes `a/c`
        dirs.sort_by(|(a, _), (b, _)| a.rel_path().cmp(&b.rel_path()));
        stats.directories = dirs.len();

        let mut builder = ContentBuilder::default();
        for (dir, files) in dirs {
            if dir.is_root() {
                builder.push(ROOT_HEADER);
            } else {
                builder.push(&format!("\n---{}/---\n", dir.rel_path()));
            }

            for (path, file) in files {
                if !self.filter.includes_file(&file.name) {
                    continue;
                }
                if self.detector.is_binary(&path) {
                    debug!(path = %path.display(), "Skipping binary file");
                    stats.binary_skipped += 1;
                    continue;
                }

                match fs::read_to_string(&path) {
                    Ok(body) => builder.push_file(
                        file.rel_path(),
                        &format!("\n--{}--\n", file.name),
                        &body,
                    ),
                    Err(source) => {
                        let error = AnalysisError::Read { path, source };
                        warn!(%error, "Skipping unreadable file");
                        stats.read_errors += 1;
                    }
                }
            }
        }

        Ok(builder.finish())
    }

    /// Flatten the tree below a listed directory, depth first
    fn collect_dirs(
        &self,
        dir: Entry,
        listing: Listing,
        out: &mut Vec<(Entry, Vec<(PathBuf, Entry)>)>,
    ) {
        out.push((dir, listing.files));

        for (sub_path, sub) in listing.dirs {
            match self.list_dir(&sub_path, &sub) {
                Ok(sub_listing) => self.collect_dirs(sub, sub_listing, out),
                Err(e) => warn!(path = %sub_path.display(), error = %e, "Error reading directory"),
            }
        }
    }

    /// Read one directory level, sorted by name.
    ///
    /// Pruned subdirectories are dropped here. Symlinks to directories are
    /// not followed.
    fn list_dir(&self, abs_path: &Path, parent: &Entry) -> io::Result<Listing> {
        // Surface a missing or unreadable directory instead of an empty listing
        fs::read_dir(abs_path)?;

        let mut listing = Listing {
            dirs: Vec::new(),
            files: Vec::new(),
        };

        for entry in WalkDir::new(abs_path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = %abs_path.display(), error = %e, "Error reading directory entry");
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                let child = parent.child(name, EntryKind::Directory);
                if self.filter.prunes_dir(&child.rel_path()) {
                    debug!(path = %child.rel_path(), "Pruning git-related directory");
                    continue;
                }
                listing.dirs.push((entry.into_path(), child));
            } else if file_type.is_symlink() && entry.path().is_dir() {
                continue;
            } else {
                let child = parent.child(name, EntryKind::File);
                listing.files.push((entry.into_path(), child));
            }
        }

        Ok(listing)
    }
}

impl Entry {
    fn child(&self, name: String, kind: EntryKind) -> Entry {
        let mut segments = self.segments.clone();
        segments.push(name.clone());
        Entry {
            segments,
            name,
            kind,
            depth: self.depth + 1,
        }
    }
}

/// One listing line. Files sit one level below their directory, and the
/// root shares the bare prefix with its direct subdirectories.
fn structure_line(entry: &Entry) -> String {
    let indent = INDENT.repeat(entry.depth.saturating_sub(1));
    match entry.kind {
        EntryKind::Directory => format!("{}{}{}/", indent, BRANCH, entry.name),
        EntryKind::File => format!("{}{}{}", indent, BRANCH, entry.name),
    }
}

/// Resolve the scan root and the entry describing it
fn root_entry(root: &Path) -> io::Result<(PathBuf, Entry)> {
    let abs_path = fs::canonicalize(root)?;
    if !abs_path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Not a directory: {}", root.display()),
        ));
    }

    let name = abs_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| abs_path.display().to_string());

    Ok((
        abs_path,
        Entry {
            segments: Vec::new(),
            name,
            kind: EntryKind::Directory,
            depth: 0,
        },
    ))
}

/// Accumulates `\n`-joined content pieces and file header offsets
#[derive(Default)]
struct ContentBuilder {
    text: String,
    positions: BTreeMap<String, usize>,
    started: bool,
}

impl ContentBuilder {
    fn push(&mut self, piece: &str) {
        if self.started {
            self.text.push('\n');
        }
        self.text.push_str(piece);
        self.started = true;
    }

    fn push_file(&mut self, key: String, header: &str, body: &str) {
        if self.started {
            self.text.push('\n');
        }
        self.positions.insert(key, self.text.len());
        self.text.push_str(header);
        self.started = true;
        self.push(body);
    }

    fn finish(self) -> (String, BTreeMap<String, usize>) {
        (self.text, self.positions)
    }
}
