//! Acquirers turn a classified specifier into a freshly unpacked fluence tree.
mod artifact;
mod artifact_store;
mod channel;
mod release;

pub use artifact::ArtifactAcquirer;
pub use artifact_store::{ArtifactStore, GitHubArtifactStore};
pub use channel::ChannelAcquirer;
pub use release::{ReleaseAcquirer, VersionIndex};

use crate::archive;
use crate::download::Downloader;
use crate::error::{Result, SetupError};
use crate::platform::PlatformKey;
use crate::specifier::{ChannelSet, VersionSpecifier};
use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A directory exclusively owned by one acquisition, holding the unpacked tool tree
/// (`<root>/fluence/bin/fluence` by convention).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredTree {
    pub root: PathBuf,
    pub source: String,
}

#[async_trait]
pub trait Acquire: Send + Sync {
    async fn acquire(&self, specifier: &VersionSpecifier) -> Result<AcquiredTree>;
}

/// Where public builds live: `<bucket>/channels/...` and `<bucket>/versions/...`.
#[derive(Clone)]
pub struct Bucket {
    pub downloader: Downloader,
    pub url: String,
    pub platform: PlatformKey,
    pub temp_root: PathBuf,
}

impl Bucket {
    pub fn new(
        downloader: Downloader,
        url: impl Into<String>,
        platform: PlatformKey,
        temp_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            downloader,
            url: url.into().trim_end_matches('/').to_string(),
            platform,
            temp_root: temp_root.into(),
        }
    }
}

/// Dispatches channel names to [`ChannelAcquirer`] and semantic versions to
/// [`ReleaseAcquirer`]. Anything else is rejected with the run's channel list.
pub struct PublicReleases {
    channel: ChannelAcquirer,
    release: ReleaseAcquirer,
    channels: ChannelSet,
}

impl PublicReleases {
    pub fn new(bucket: Bucket, channels: ChannelSet) -> Self {
        Self {
            channel: ChannelAcquirer::new(bucket.clone()),
            release: ReleaseAcquirer::new(bucket),
            channels,
        }
    }
}

#[async_trait]
impl Acquire for PublicReleases {
    async fn acquire(&self, specifier: &VersionSpecifier) -> Result<AcquiredTree> {
        match specifier {
            VersionSpecifier::Channel(channel) => self.channel.acquire_channel(channel).await,
            VersionSpecifier::SemVer(version) => self.release.acquire_version(version).await,
            other => Err(SetupError::InvalidSpecifier {
                input: other.to_string(),
                channels: self.channels.names().join(", "),
            }),
        }
    }
}

/// Unpacks a tarball on the blocking pool.
pub(crate) async fn unpack_tarball(tarball: &Path, dest: &Path) -> anyhow::Result<()> {
    let (tarball, dest) = (tarball.to_path_buf(), dest.to_path_buf());
    tokio::task::spawn_blocking(move || archive::unpack_tar_gz(&tarball, &dest))
        .await
        .context("Archive extraction task failed")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use url::Url;

    #[tokio::test]
    async fn test_rejection_lists_run_channels() -> anyhow::Result<()> {
        let temp_root = TempDir::new()?;
        let bucket = Bucket::new(
            Downloader::new(None)?,
            "http://127.0.0.1:9",
            PlatformKey::from_parts("linux", "x64")?,
            temp_root.path(),
        );
        let releases = PublicReleases::new(bucket, ChannelSet::new(vec!["nightly".to_string()]));

        let url = Url::parse("https://example.com/fluence.tar.gz")?;
        let err = releases
            .acquire(&VersionSpecifier::Url(url))
            .await
            .unwrap_err();

        match err {
            SetupError::InvalidSpecifier { input, channels } => {
                assert_eq!(input, "https://example.com/fluence.tar.gz");
                assert_eq!(channels, "nightly");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }
}
