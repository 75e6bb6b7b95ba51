//! Publishes an acquired fluence tree: a stable symlink in the bin directory, the bin directory on
//! `PATH`, and a smoke test of the installed binary.
mod install;
mod path;

pub use install::BinaryInstaller;
pub use path::PathPublisher;

use crate::acquire::AcquiredTree;
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Outcome of a successful installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    /// The executable inside the acquired tree.
    pub binary: PathBuf,
    /// `<bin_dir>/fluence`, pointing at `binary`.
    pub link: PathBuf,
    pub bin_dir: PathBuf,
    pub source: String,
}

#[async_trait]
pub trait Install: Send + Sync {
    async fn install(&self, tree: AcquiredTree) -> Result<Installation>;
}
