/*!
 * Core types and data structures for repotxt
 */

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Kind of a visited filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Directory containing other entries
    Directory,
    /// Regular file (or symlink to one)
    File,
}

/// Snapshot of one filesystem node seen during a traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path segments from the scan root; empty for the root itself
    pub segments: Vec<String>,
    /// Entry name
    pub name: String,
    /// Entry kind
    pub kind: EntryKind,
    /// Distance from the scan root
    pub depth: usize,
}

impl Entry {
    /// Path relative to the scan root, always `/`-joined
    pub fn rel_path(&self) -> String {
        self.segments.join("/")
    }

    /// Whether this entry is the scan root
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Output of one render pass over a tree
#[derive(Debug, Clone, Default)]
pub struct RenderedOutput {
    /// Indented tree listing
    pub structure: String,
    /// Directory and file sections with file bodies
    pub content: String,
    /// Byte offset of each file header inside `content`, keyed by relative path
    pub file_positions: BTreeMap<String, usize>,
}

impl RenderedOutput {
    /// Full document as written to disk (before any truncation)
    pub fn document(&self) -> String {
        format!(
            "Folder structure:\n{}\nConcatenated content:\n{}",
            self.structure, self.content
        )
    }

    /// Number of files whose content was included
    pub fn file_count(&self) -> usize {
        self.file_positions.len()
    }
}

/// Summary of a finished analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Repository or folder name
    pub repo_name: String,
    /// Path to the written text file
    pub output_file: PathBuf,
    /// Session folder holding the output file
    pub session_folder: PathBuf,
    /// Tokens in the final text; 0 when the tokenizer failed
    pub token_count: usize,
    /// Characters in the final text
    pub char_count: usize,
    /// Files whose content was concatenated
    pub file_count: usize,
}
