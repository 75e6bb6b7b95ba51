//! Artifact first, public releases second.
//!
//! A run starts in [`State::TryingArtifact`] when an artifact input is present and in
//! [`State::ResolvingVersion`] otherwise. The only transition out of `TryingArtifact` on failure
//! is decided by [`on_artifact_failure`], a pure function of the fallback policy.
use crate::acquire::Acquire;
use crate::error::{Result, SetupError};
use crate::installer::{Install, Installation};
use crate::specifier::{ChannelSet, InputKind, VersionSpecifier};
use crate::types::FallbackPolicy;
use crate::{info_message, warning_message};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    TryingArtifact,
    ResolvingVersion,
}

/// What happens after the artifact path failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Annotate the failure as a warning, then resolve the version input.
    WarnAndResolve,
    /// Log the failure, then resolve the version input.
    LogAndResolve,
    /// The artifact failure ends the run.
    Fail,
}

pub fn on_artifact_failure(policy: FallbackPolicy) -> Transition {
    match policy {
        FallbackPolicy::Warn => Transition::WarnAndResolve,
        FallbackPolicy::Ignore => Transition::LogAndResolve,
        FallbackPolicy::Error => Transition::Fail,
    }
}

pub fn initial_state(artifact: Option<&str>) -> State {
    match artifact {
        Some(_) => State::TryingArtifact,
        None => State::ResolvingVersion,
    }
}

pub struct FallbackOrchestrator<A, R, I> {
    artifacts: A,
    releases: R,
    installer: I,
    channels: ChannelSet,
    policy: FallbackPolicy,
}

impl<A, R, I> FallbackOrchestrator<A, R, I>
where
    A: Acquire,
    R: Acquire,
    I: Install,
{
    pub fn new(
        artifacts: A,
        releases: R,
        installer: I,
        channels: ChannelSet,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            artifacts,
            releases,
            installer,
            channels,
            policy,
        }
    }

    /// Installs fluence from `artifact` if given, falling back to `version` as the policy allows.
    pub async fn run(&self, artifact: Option<&str>, version: Option<&str>) -> Result<Installation> {
        let mut state = initial_state(artifact);

        loop {
            debug!(?state, policy = %self.policy, "orchestrator step");
            match (state, artifact) {
                (State::TryingArtifact, Some(artifact)) => {
                    let err = match self.try_artifact(artifact).await {
                        Ok(installation) => return Ok(installation),
                        Err(err) => err,
                    };

                    match on_artifact_failure(self.policy) {
                        Transition::WarnAndResolve => {
                            warning_message!(
                                "Failed to download artifact '{}' with error: {}. Falling back to releases.",
                                artifact,
                                err.report()
                            );
                        }
                        Transition::LogAndResolve => {
                            info_message!(
                                "Failed to download artifact '{}' with error: {}. Falling back to releases.",
                                artifact,
                                err.report()
                            );
                        }
                        Transition::Fail => {
                            return Err(SetupError::ArtifactRequired {
                                artifact: artifact.to_string(),
                                source: Box::new(err),
                            })
                        }
                    }
                    state = State::ResolvingVersion;
                }
                _ => return self.resolve_version(version).await,
            }
        }
    }

    async fn try_artifact(&self, artifact: &str) -> Result<Installation> {
        let specifier = match self.channels.classify(artifact, InputKind::Artifact)? {
            url @ VersionSpecifier::Url(_) => url,
            _ => VersionSpecifier::ArtifactRef(artifact.trim().to_string()),
        };

        let tree = self.artifacts.acquire(&specifier).await?;
        self.installer.install(tree).await
    }

    async fn resolve_version(&self, version: Option<&str>) -> Result<Installation> {
        let raw = version.unwrap_or_default();
        let specifier = match self.channels.classify(raw, InputKind::Version)? {
            VersionSpecifier::Url(_) | VersionSpecifier::ArtifactRef(_) => {
                return Err(SetupError::InvalidSpecifier {
                    input: raw.to_string(),
                    channels: self.channels.names().join(", "),
                })
            }
            specifier => specifier,
        };

        let tree = self.releases.acquire(&specifier).await?;
        self.installer.install(tree).await
    }
}
