use crate::error::SetupError;
use clap::Parser;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// What to do when the artifact could not be acquired or installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Warn and fall back to the version/channel input.
    #[default]
    Warn,
    /// Fail the run.
    Error,
    /// Log quietly and fall back.
    Ignore,
}

impl FromStr for FallbackPolicy {
    type Err = SetupError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "ignore" => Ok(Self::Ignore),
            _ => Err(SetupError::InvalidPolicy(input.to_string())),
        }
    }
}

impl Display for FallbackPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Ignore => "ignore",
        };
        f.write_str(name)
    }
}

/// Action inputs. The runner exports each input as `INPUT_<NAME>`.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "setup-fluence", about = "Installs the fluence CLI into a CI job")]
pub struct SetupFluenceCli {
    /// Artifact name or id from the current workflow, or a direct download URL.
    #[arg(long, env = "INPUT_ARTIFACT")]
    pub artifact: Option<String>,

    /// Release channel (e.g. "stable") or semantic version to install.
    #[arg(long, env = "INPUT_VERSION")]
    pub version: Option<String>,

    /// What to do when the artifact can't be used: warn, error or ignore.
    #[arg(long = "if-no-artifact-found", env = "INPUT_IF-NO-ARTIFACT-FOUND")]
    pub if_no_artifact_found: Option<String>,
}

impl SetupFluenceCli {
    pub fn artifact(&self) -> Option<&str> {
        non_empty(&self.artifact)
    }

    pub fn version(&self) -> Option<&str> {
        non_empty(&self.version)
    }

    /// The fallback policy; `warn` when the input is absent.
    pub fn policy(&self) -> Result<FallbackPolicy, SetupError> {
        non_empty(&self.if_no_artifact_found)
            .map(str::parse)
            .unwrap_or(Ok(FallbackPolicy::default()))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
