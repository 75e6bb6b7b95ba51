use crate::constants::CHANNELS;
use crate::error::{Result, SetupError};
use semver::Version;
use std::fmt::{self, Display, Formatter};
use url::Url;

/// A classified version/artifact input. Produced once per input and never re-derived from the
/// raw string afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpecifier {
    Url(Url),
    ArtifactRef(String),
    Channel(String),
    SemVer(Version),
}

/// Which input a raw string came from. Artifact inputs may name an artifact-store entry; version
/// inputs must be a channel or a semantic version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Artifact,
    Version,
}

/// The set of channel names that are accepted as a `version` input.
#[derive(Debug, Clone)]
pub struct ChannelSet {
    channels: Vec<String>,
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::new(CHANNELS.iter().map(|c| c.to_string()).collect())
    }
}

impl ChannelSet {
    pub fn new(channels: Vec<String>) -> Self {
        Self { channels }
    }

    /// Replaces the fixed list with a live listing, unless the listing is empty.
    pub fn refine(self, live: Vec<String>) -> Self {
        if live.is_empty() {
            self
        } else {
            Self::new(live)
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.iter().any(|c| c == name)
    }

    pub fn names(&self) -> &[String] {
        &self.channels
    }

    /// Classifies `raw` in priority order: absolute http(s) URL, known channel, strict semantic
    /// version (a leading `v` is stripped only once the rest parses), and finally an opaque
    /// artifact reference when `kind` is [`InputKind::Artifact`].
    pub fn classify(&self, raw: &str, kind: InputKind) -> Result<VersionSpecifier> {
        let raw = raw.trim();

        if let Some(url) = parse_http_url(raw) {
            return Ok(VersionSpecifier::Url(url));
        }
        if self.contains(raw) {
            return Ok(VersionSpecifier::Channel(raw.to_string()));
        }
        if let Some(version) = parse_semver(raw) {
            return Ok(VersionSpecifier::SemVer(version));
        }
        match kind {
            InputKind::Artifact if !raw.is_empty() => {
                Ok(VersionSpecifier::ArtifactRef(raw.to_string()))
            }
            _ => Err(SetupError::InvalidSpecifier {
                input: raw.to_string(),
                channels: self.channels.join(", "),
            }),
        }
    }
}

fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn parse_semver(raw: &str) -> Option<Version> {
    Version::parse(raw)
        .or_else(|_| Version::parse(raw.strip_prefix('v').unwrap_or_default()))
        .ok()
}

impl VersionSpecifier {
    /// Short name used to prefix acquisition directories.
    pub fn dir_prefix(&self) -> String {
        match self {
            Self::Url(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|name| !name.is_empty())
                .unwrap_or("download")
                .to_string(),
            Self::ArtifactRef(name) => name.clone(),
            Self::Channel(channel) => format!("fluence-{channel}"),
            Self::SemVer(version) => format!("fluence-{version}"),
        }
    }
}

impl Display for VersionSpecifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::ArtifactRef(name) => write!(f, "artifact {name}"),
            Self::Channel(channel) => write!(f, "channel {channel}"),
            Self::SemVer(version) => write!(f, "version {version}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn classify(raw: &str) -> Result<VersionSpecifier> {
        ChannelSet::default().classify(raw, InputKind::Version)
    }

    #[test]
    fn test_classify_url() {
        let spec = classify("https://x/y.tar.gz").unwrap();
        assert!(matches!(spec, VersionSpecifier::Url(ref url) if url.as_str() == "https://x/y.tar.gz"));
    }

    #[rstest]
    #[case("1.2.3", "1.2.3")]
    #[case("v1.2.3", "1.2.3")]
    #[case("0.18.0-rc.1", "0.18.0-rc.1")]
    fn test_classify_semver(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(
            classify(raw).unwrap(),
            VersionSpecifier::SemVer(Version::parse(expected).unwrap())
        );
    }

    #[rstest]
    #[case("stable")]
    #[case("latest")]
    #[case("main")]
    #[case("unstable")]
    #[case("kras")]
    fn test_classify_channel(#[case] raw: &str) {
        assert_eq!(
            classify(raw).unwrap(),
            VersionSpecifier::Channel(raw.to_string())
        );
    }

    #[rstest]
    #[case("not-a-version-or-channel")]
    #[case("1.2")]
    #[case("vv1.2.3")]
    #[case("ftp://example.com/fluence.tar.gz")]
    #[case("")]
    fn test_classify_invalid_version(#[case] raw: &str) {
        let err = classify(raw).unwrap_err();
        assert!(matches!(err, SetupError::InvalidSpecifier { .. }));
        assert!(err.to_string().contains("stable"));
    }

    #[test]
    fn test_classify_artifact_reference() {
        let channels = ChannelSet::default();
        assert_eq!(
            channels
                .classify("fcli-linux-x64", InputKind::Artifact)
                .unwrap(),
            VersionSpecifier::ArtifactRef("fcli-linux-x64".to_string())
        );
        assert!(matches!(
            channels.classify("  ", InputKind::Artifact),
            Err(SetupError::InvalidSpecifier { .. })
        ));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let channels = ChannelSet::default();
        for raw in ["stable", "v0.1.0", "https://x/y.zip", "build-42"] {
            assert_eq!(
                channels.classify(raw, InputKind::Artifact).unwrap(),
                channels.classify(raw, InputKind::Artifact).unwrap()
            );
        }
    }

    #[test]
    fn test_live_channel_listing_takes_precedence() {
        let channels = ChannelSet::default().refine(vec!["nightly".to_string()]);
        assert!(matches!(
            channels.classify("nightly", InputKind::Version),
            Ok(VersionSpecifier::Channel(_))
        ));
        assert!(channels.classify("stable", InputKind::Version).is_err());

        let unchanged = ChannelSet::default().refine(vec![]);
        assert!(unchanged.contains("stable"));
    }

    #[test]
    fn test_dir_prefix() {
        let url = classify("https://example.com/builds/fluence.zip").unwrap();
        assert_eq!(url.dir_prefix(), "fluence.zip");
        assert_eq!(classify("stable").unwrap().dir_prefix(), "fluence-stable");
        assert_eq!(classify("v1.2.3").unwrap().dir_prefix(), "fluence-1.2.3");
    }
}
