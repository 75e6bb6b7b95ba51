use super::{unpack_tarball, AcquiredTree, Bucket};
use crate::error::{Result, SetupError};
use crate::fs::create_unique_dir;
use crate::info_message;
use semver::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use url::Url;

/// Version index published per platform: a JSON object mapping version strings to tarball URLs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct VersionIndex(BTreeMap<String, String>);

impl VersionIndex {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    /// Looks up the tarball URL of `version`. A missing key fails with the full list of
    /// versions the index does know about.
    pub fn resolve(&self, version: &str) -> Result<&str> {
        self.0
            .get(version)
            .map(String::as_str)
            .ok_or_else(|| SetupError::VersionNotFound {
                version: version.to_string(),
                available: self.available(),
            })
    }

    /// Known versions, semver-ordered where they parse, lexically otherwise.
    pub fn available(&self) -> Vec<String> {
        let mut versions: Vec<String> = self.0.keys().cloned().collect();
        versions.sort_by(|a, b| match (parse(a), parse(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        });
        versions
    }
}

fn parse(version: &str) -> Option<Version> {
    Version::parse(version.trim_start_matches('v')).ok()
}

/// Resolves a semantic version through the platform's version index, then fetches its tarball.
pub struct ReleaseAcquirer {
    bucket: Bucket,
}

impl ReleaseAcquirer {
    pub fn new(bucket: Bucket) -> Self {
        Self { bucket }
    }

    /// `<bucket>/versions/fluence-<platform>-tar-gz.json`
    pub fn index_url(&self) -> anyhow::Result<Url> {
        Ok(Url::parse(&format!(
            "{}/versions/{}",
            self.bucket.url,
            self.bucket.platform.version_index_name()
        ))?)
    }

    pub async fn fetch_index(&self) -> Result<VersionIndex> {
        let url = self
            .index_url()
            .map_err(|source| SetupError::VersionIndexFailed {
                url: self.bucket.url.clone(),
                source,
            })?;

        self.bucket
            .downloader
            .fetch_json(&url)
            .await
            .map_err(|source| SetupError::VersionIndexFailed {
                url: url.to_string(),
                source,
            })
    }

    pub async fn acquire_version(&self, version: &Version) -> Result<AcquiredTree> {
        let version = version.to_string();
        let index = self.fetch_index().await?;
        let tarball_url = index.resolve(&version)?.to_string();

        info_message!("Downloading fcli version {}", version);

        self.fetch(&version, &tarball_url)
            .await
            .map_err(|source| SetupError::ReleaseDownloadFailed {
                version: version.clone(),
                url: tarball_url.clone(),
                source,
            })
    }

    async fn fetch(&self, version: &str, tarball_url: &str) -> anyhow::Result<AcquiredTree> {
        let url = Url::parse(tarball_url)?;
        let root = create_unique_dir(&self.bucket.temp_root, &format!("fluence-{version}"))?;

        let tarball = self.bucket.downloader.download_to(&url, &root).await?;
        unpack_tarball(&tarball, &root).await?;

        Ok(AcquiredTree {
            root,
            source: format!("version {version}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::Downloader;
    use crate::platform::PlatformKey;

    fn index(pairs: &[(&str, &str)]) -> VersionIndex {
        VersionIndex::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_resolve_known_version() {
        let index = index(&[("1.2.3", "https://example.com/fluence-1.2.3.tar.gz")]);
        assert_eq!(
            index.resolve("1.2.3").unwrap(),
            "https://example.com/fluence-1.2.3.tar.gz"
        );
    }

    #[test]
    fn test_resolve_unknown_version_lists_alternatives() {
        let index = index(&[("1.2.3", "https://example.com/a.tar.gz")]);
        let err = index.resolve("9.9.9").unwrap_err();

        match &err {
            SetupError::VersionNotFound { version, available } => {
                assert_eq!(version, "9.9.9");
                assert_eq!(available, &vec!["1.2.3".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("1.2.3"));
        assert!(err.to_string().contains("9.9.9"));
    }

    #[test]
    fn test_available_is_semver_sorted() {
        let index = index(&[
            ("0.10.0", "u"),
            ("0.9.1", "u"),
            ("0.2.0", "u"),
            ("nightly", "u"),
            ("1.0.0-rc.1", "u"),
        ]);
        assert_eq!(
            index.available(),
            vec!["0.2.0", "0.9.1", "0.10.0", "1.0.0-rc.1", "nightly"]
        );
    }

    #[test]
    fn test_index_deserializes_from_json_object() {
        let index: VersionIndex =
            serde_json::from_str(r#"{"0.1.0": "https://a", "0.2.0": "https://b"}"#).unwrap();
        assert_eq!(index.resolve("0.2.0").unwrap(), "https://b");
    }

    #[test]
    fn test_index_url() {
        let bucket = Bucket::new(
            Downloader::new(None).unwrap(),
            "https://fcli-binaries.s3.eu-west-1.amazonaws.com",
            PlatformKey::from_parts("linux", "x86_64").unwrap(),
            "/tmp",
        );
        assert_eq!(
            ReleaseAcquirer::new(bucket).index_url().unwrap().as_str(),
            "https://fcli-binaries.s3.eu-west-1.amazonaws.com/versions/fluence-linux-x64-tar-gz.json"
        );
    }
}
