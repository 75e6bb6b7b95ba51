use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = SetupError> = std::result::Result<T, E>;

/// Every way a setup run can fail. Artifact-path failures are recovered by the orchestrator
/// according to the fallback policy; everything else ends the run.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Unsupported platform: {platform}. Supported platforms: {supported}")]
    UnsupportedPlatform { platform: String, supported: String },

    #[error("Invalid input 'version': {input:?}. Available channels: {channels}")]
    InvalidSpecifier { input: String, channels: String },

    #[error(
        "Unrecognized 'if-no-artifact-found' input. Provided: {0}. Available options: warn, error, ignore"
    )]
    InvalidPolicy(String),

    #[error("No archive found: {0}")]
    NoArchiveFound(String),

    #[error("Version {version} not found. Available versions are: {}", .available.join(", "))]
    VersionNotFound {
        version: String,
        available: Vec<String>,
    },

    #[error("Failed to fetch version index {url}")]
    VersionIndexFailed {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to download fluence {version} from {url}")]
    ReleaseDownloadFailed {
        version: String,
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to download fluence from channel '{channel}'")]
    ChannelDownloadFailed {
        channel: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("An error occurred while processing the artifact '{artifact}'")]
    ArtifactFailed {
        artifact: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to download artifact '{artifact}'")]
    ArtifactRequired {
        artifact: String,
        #[source]
        source: Box<SetupError>,
    },

    #[error("Expected binary not found at: {}", .0.display())]
    BinaryNotFound(PathBuf),

    #[error("Smoke test `{command}` failed: {status}")]
    SmokeTestFailed { command: String, status: String },

    #[error("Invalid setup configuration")]
    Config(#[source] anyhow::Error),

    #[error("Failed to install fluence")]
    Install(#[source] anyhow::Error),
}

impl SetupError {
    /// The message followed by every underlying cause, `: `-separated.
    pub fn report(&self) -> String {
        let mut report = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            report.push_str(": ");
            report.push_str(&cause.to_string());
            source = cause.source();
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_report_includes_causes() {
        let err = SetupError::ArtifactRequired {
            artifact: "fcli".to_string(),
            source: Box::new(SetupError::ArtifactFailed {
                artifact: "fcli".to_string(),
                source: anyhow!("connection refused").context("Failed to initiate download"),
            }),
        };

        assert_eq!(
            err.report(),
            "Failed to download artifact 'fcli': \
             An error occurred while processing the artifact 'fcli': \
             Failed to initiate download: connection refused"
        );
    }

    #[test]
    fn test_version_not_found_lists_versions() {
        let err = SetupError::VersionNotFound {
            version: "9.9.9".to_string(),
            available: vec!["0.1.0".to_string(), "1.2.3".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Version 9.9.9 not found. Available versions are: 0.1.0, 1.2.3"
        );
    }
}
