/*!
 * Progress reporting for Git operations
 */

use crate::utils::format_file_size;

/// Trait for reporting Git operation progress
pub trait ProgressReporter: Send + Sync {
    /// Called with progress information during Git operations
    fn report(&self, progress: &GitProgress);
}

/// Progress information for Git operations
#[derive(Debug, Clone, Default)]
pub struct GitProgress {
    /// Total number of objects to download
    pub total_objects: usize,
    /// Number of received objects
    pub received_objects: usize,
    /// Number of indexed objects
    pub indexed_objects: usize,
    /// Number of local objects
    pub local_objects: usize,
    /// Total number of deltas
    pub total_deltas: usize,
    /// Number of indexed deltas
    pub indexed_deltas: usize,
    /// Number of bytes received
    pub received_bytes: usize,
}

impl GitProgress {
    /// Snapshot libgit2 transfer statistics
    pub fn from_stats(stats: &git2::Progress<'_>) -> Self {
        Self {
            total_objects: stats.total_objects(),
            received_objects: stats.received_objects(),
            indexed_objects: stats.indexed_objects(),
            local_objects: stats.local_objects(),
            total_deltas: stats.total_deltas(),
            indexed_deltas: stats.indexed_deltas(),
            received_bytes: stats.received_bytes(),
        }
    }

    /// Get the progress percentage
    pub fn percentage(&self) -> u8 {
        if self.total_objects == 0 {
            return 0;
        }

        ((self.received_objects * 100) / self.total_objects) as u8
    }

    /// Get a formatted string of received bytes
    pub fn formatted_bytes(&self) -> String {
        format_file_size(self.received_bytes as u64)
    }
}

// Implement ProgressReporter for closures
impl<F> ProgressReporter for F
where
    F: Fn(&GitProgress) + Send + Sync,
{
    fn report(&self, progress: &GitProgress) {
        self(progress)
    }
}
