/*!
 * Git repository handling functionality
 */

mod checkout;
mod error;
mod progress;
mod repository;
mod url;

// Re-export public items
pub use checkout::{TempCheckout, DEFAULT_SETTLE_DELAY};
pub use error::{GitError, GitResult};
pub use progress::{GitProgress, ProgressReporter};
pub use repository::{Git2Provider, SourceProvider};
pub use url::{authenticated_url, parse_git_url, repo_name_from_source, GitHost, GitRepoInfo};
