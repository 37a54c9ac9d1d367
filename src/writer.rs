/*!
 * Session output persistence
 *
 * Every run writes `{output_dir}/{session}/{session}.txt`, where the
 * session name is the repository or folder name plus a local timestamp.
 */

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::error::{PersistContext, Result};

/// Folder under the current directory used when no output dir is given
pub const DEFAULT_OUTPUT_DIR: &str = "repotxt_output";

/// Build a session name like `myrepo_2024_05_01_134502`
pub fn session_name(name: &str, at: DateTime<Local>) -> String {
    format!("{}_{}", name, at.format("%Y_%m_%d_%H%M%S"))
}

/// Default output root: [`DEFAULT_OUTPUT_DIR`] in the working directory
pub fn default_output_dir() -> io::Result<PathBuf> {
    Ok(env::current_dir()?.join(DEFAULT_OUTPUT_DIR))
}

/// Read back a previously written output file
pub fn read_output(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}

/// Location of one written session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Session name
    pub name: String,
    /// Folder holding the output file
    pub folder: PathBuf,
    /// The output text file
    pub output_file: PathBuf,
}

/// Writes analysis output into timestamped session folders
pub struct SessionWriter {
    /// Root for session folders
    output_dir: PathBuf,
}

impl SessionWriter {
    /// Create a new session writer
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write `text` into a new session for `name`, stamped with the current time
    pub fn write(&self, name: &str, text: &str) -> Result<Session> {
        self.write_at(name, text, Local::now())
    }

    /// Write `text` into the session for `name` at the given time
    pub fn write_at(&self, name: &str, text: &str, at: DateTime<Local>) -> Result<Session> {
        let session = session_name(name, at);
        let folder = self.output_dir.join(&session);
        fs::create_dir_all(&folder).persist_context(&folder)?;

        let output_file = folder.join(format!("{}.txt", session));
        fs::write(&output_file, text).persist_context(&output_file)?;
        info!(path = %output_file.display(), "Output written");

        Ok(Session {
            name: session,
            folder,
            output_file,
        })
    }
}
