/*!
 * Private temporary directories for cloned sources
 */

use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;
use tracing::{info, warn};

/// Default pause before removing a checkout, letting open handles close
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Temporary clone destination, removed when dropped.
///
/// Removal is best-effort: failures are logged and never propagate.
#[derive(Debug)]
pub struct TempCheckout {
    dir: Option<TempDir>,
    settle_delay: Duration,
}

impl TempCheckout {
    /// Create a fresh, empty directory under the system temp dir
    pub fn create(settle_delay: Duration) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("repotxt-").tempdir()?;
        Ok(Self {
            dir: Some(dir),
            settle_delay,
        })
    }

    /// Location of the checkout
    pub fn path(&self) -> &Path {
        self.dir
            .as_ref()
            .map(TempDir::path)
            .unwrap_or_else(|| Path::new(""))
    }
}

impl Drop for TempCheckout {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        info!(path = %dir.path().display(), "Cleaning up temporary directory");
        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }

        let path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            warn!(path = %path.display(), error = %e, "Failed to remove temporary directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_checkout_removed_on_drop() {
        let checkout = TempCheckout::create(Duration::ZERO).unwrap();
        let path = checkout.path().to_path_buf();
        fs::create_dir_all(path.join("nested")).unwrap();
        fs::write(path.join("nested/file.txt"), "x").unwrap();
        assert!(path.exists());

        drop(checkout);
        assert!(!path.exists());
    }

    #[test]
    fn test_checkouts_do_not_collide() {
        let a = TempCheckout::create(Duration::ZERO).unwrap();
        let b = TempCheckout::create(Duration::ZERO).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
