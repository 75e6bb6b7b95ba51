use super::{Install, Installation, PathPublisher};
use crate::acquire::AcquiredTree;
use crate::constants::BINARY_NAME;
use crate::error::{Result, SetupError};
use crate::fs::{ensure_dir_with_permissions, ensure_executable};
use crate::{info_message, success_message};
use anyhow::{bail, Context};
use async_trait::async_trait;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Links `fluence/bin/fluence` of an acquired tree into a stable bin directory, publishes that
/// directory on `PATH` and runs a smoke test through the link.
pub struct BinaryInstaller {
    bin_dir: PathBuf,
    smoke_test_args: Vec<String>,
    path: PathPublisher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkOutcome {
    Created,
    Replaced,
    Unchanged,
}

impl BinaryInstaller {
    pub fn new(bin_dir: impl Into<PathBuf>, smoke_test_args: Vec<String>, path: PathPublisher) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            smoke_test_args,
            path,
        }
    }

    /// `<root>/fluence/bin/fluence`
    pub fn expected_binary(root: &Path) -> PathBuf {
        root.join(BINARY_NAME).join("bin").join(BINARY_NAME)
    }

    fn publish(&self, binary: &Path) -> anyhow::Result<PathBuf> {
        ensure_executable(binary)?;
        ensure_dir_with_permissions(&self.bin_dir, Some(0o755))?;

        let link = self.bin_dir.join(BINARY_NAME);
        let outcome = link_binary(binary, &link)?;
        debug!(?link, ?binary, ?outcome, "bin directory link");

        self.path.prepend_to_process_path(&self.bin_dir)?;
        Ok(link)
    }

    async fn smoke_test(&self, link: &Path) -> Result<()> {
        let command = std::iter::once(BINARY_NAME.to_string())
            .chain(self.smoke_test_args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        info_message!("Running `{}`", command);

        let status = Command::new(link)
            .args(&self.smoke_test_args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("Failed to run {:?}", link))
            .map_err(SetupError::Install)?;

        if !status.success() {
            return Err(SetupError::SmokeTestFailed {
                command,
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// Points `link` at `binary`. An existing link to the same target is left alone; a link to
/// anything else is replaced.
fn link_binary(binary: &Path, link: &Path) -> anyhow::Result<LinkOutcome> {
    let outcome = match fs::symlink_metadata(link) {
        Ok(meta) if meta.file_type().is_symlink() => {
            if fs::read_link(link)? == binary {
                return Ok(LinkOutcome::Unchanged);
            }
            fs::remove_file(link)
                .with_context(|| format!("Failed to remove stale link {:?}", link))?;
            LinkOutcome::Replaced
        }
        Ok(_) => bail!("{:?} exists and is not a symlink", link),
        Err(e) if e.kind() == ErrorKind::NotFound => LinkOutcome::Created,
        Err(e) => return Err(e).with_context(|| format!("Failed to inspect {:?}", link)),
    };

    std::os::unix::fs::symlink(binary, link)
        .with_context(|| format!("Failed to link {:?} to {:?}", link, binary))?;
    Ok(outcome)
}

#[async_trait]
impl Install for BinaryInstaller {
    async fn install(&self, tree: AcquiredTree) -> Result<Installation> {
        let expected = Self::expected_binary(&tree.root);
        if !expected.is_file() {
            return Err(SetupError::BinaryNotFound(expected));
        }
        let binary = fs::canonicalize(&expected)
            .with_context(|| format!("Failed to resolve {:?}", expected))
            .map_err(SetupError::Install)?;

        let link = self.publish(&binary).map_err(SetupError::Install)?;
        self.smoke_test(&link).await?;
        // later steps only see the bin directory once the binary is known to work
        self.path
            .append_to_path_file(&self.bin_dir)
            .map_err(SetupError::Install)?;

        success_message!("fluence from {} installed to {}", tree.source, link.display());

        Ok(Installation {
            binary,
            link,
            bin_dir: self.bin_dir.clone(),
            source: tree.source,
        })
    }
}
