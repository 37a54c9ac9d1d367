/*!
 * repotxt - Flatten a directory tree or git repository into one text file
 *
 * The output holds an indented folder structure followed by the
 * concatenated contents of every included text file, optionally cut down
 * to a token budget, and is written to a timestamped session folder.
 */

pub mod analyzer;
pub mod config;
pub mod error;
pub mod filter;
pub mod git;
pub mod logging;
pub mod report;
pub mod scanner;
pub mod server;
pub mod tokenizer;
pub mod types;
pub mod utils;
pub mod writer;

#[cfg(test)]
mod tests;

// Re-export main components for easier access
pub use analyzer::{AnalysisObserver, AnalysisRequest, Analyzer, Stage};
pub use config::{Config, ServerConfig};
pub use error::{AnalysisError, Result};
pub use filter::{BinaryDetection, FilterConfig};
pub use report::{Reporter, ScanReport};
pub use scanner::{ScanStatistics, Scanner};
pub use types::{AnalysisResult, Entry, EntryKind, RenderedOutput};
pub use writer::{Session, SessionWriter};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
