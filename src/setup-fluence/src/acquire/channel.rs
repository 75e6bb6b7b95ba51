use super::{unpack_tarball, AcquiredTree, Bucket};
use crate::error::{Result, SetupError};
use crate::fs::create_unique_dir;
use crate::info_message;
use url::Url;

/// Fetches the continuously updated tarball of a release channel.
pub struct ChannelAcquirer {
    bucket: Bucket,
}

impl ChannelAcquirer {
    pub fn new(bucket: Bucket) -> Self {
        Self { bucket }
    }

    /// `<bucket>/channels/<channel>/fluence-<platform>.tar.gz`
    pub fn tarball_url(&self, channel: &str) -> anyhow::Result<Url> {
        Ok(Url::parse(&format!(
            "{}/channels/{}/{}",
            self.bucket.url,
            channel,
            self.bucket.platform.tarball_name()
        ))?)
    }

    pub async fn acquire_channel(&self, channel: &str) -> Result<AcquiredTree> {
        info_message!("Downloading fcli from channel {}", channel);

        self.fetch(channel)
            .await
            .map_err(|source| SetupError::ChannelDownloadFailed {
                channel: channel.to_string(),
                source,
            })
    }

    async fn fetch(&self, channel: &str) -> anyhow::Result<AcquiredTree> {
        let url = self.tarball_url(channel)?;
        let root = create_unique_dir(&self.bucket.temp_root, &format!("fluence-{channel}"))?;

        let tarball = self.bucket.downloader.download_to(&url, &root).await?;
        unpack_tarball(&tarball, &root).await?;

        Ok(AcquiredTree {
            root,
            source: format!("channel {channel}"),
        })
    }
}
