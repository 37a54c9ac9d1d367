/*!
 * Git repository acquisition
 */

use std::path::Path;
use std::sync::Arc;

use git2::{FetchOptions, RemoteCallbacks};
use tracing::debug;

use super::error::{GitError, GitResult};
use super::progress::{GitProgress, ProgressReporter};

/// Something that can materialize a remote source into a local directory
pub trait SourceProvider: Send + Sync {
    /// Fetch `url` into the existing, empty directory `dest`
    fn fetch(&self, url: &str, dest: &Path) -> GitResult<()>;
}

/// Clones repositories with libgit2
#[derive(Clone, Default)]
pub struct Git2Provider {
    /// Optional transfer progress reporter
    progress: Option<Arc<dyn ProgressReporter>>,
}

impl Git2Provider {
    /// Create a provider without progress reporting
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure with progress reporting
    pub fn with_progress<P: ProgressReporter + 'static>(mut self, reporter: P) -> Self {
        self.progress = Some(Arc::new(reporter));
        self
    }
}

impl SourceProvider for Git2Provider {
    fn fetch(&self, url: &str, dest: &Path) -> GitResult<()> {
        let mut builder = git2::build::RepoBuilder::new();

        if let Some(reporter) = &self.progress {
            let mut callbacks = RemoteCallbacks::new();
            callbacks.transfer_progress(|stats| {
                reporter.report(&GitProgress::from_stats(&stats));
                true
            });

            let mut fetch_options = FetchOptions::new();
            fetch_options.remote_callbacks(callbacks);
            builder.fetch_options(fetch_options);
        }

        builder.clone(url, dest).map_err(GitError::CloneError)?;
        debug!(dest = %dest.display(), "Clone finished");

        Ok(())
    }
}
