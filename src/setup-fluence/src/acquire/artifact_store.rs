use crate::download::Downloader;
use crate::fs::{ensure_dir, sanitize_component};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// A CI artifact store: "fetch artifact by name (or id) into a local directory".
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Materializes the artifact into `dest` and returns the directory holding the download.
    async fn download(&self, name: &str, dest: &Path) -> Result<PathBuf>;
}

#[derive(Debug, Deserialize)]
struct ArtifactList {
    artifacts: Vec<ArtifactInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct ArtifactInfo {
    id: u64,
    name: String,
    #[serde(default)]
    expired: bool,
    archive_download_url: String,
}

/// Artifacts uploaded by GitHub Actions workflows, fetched through the REST API. The download is
/// the zip archive GitHub wraps every artifact in.
pub struct GitHubArtifactStore {
    downloader: Downloader,
    api_url: String,
    repository: Option<String>,
    run_id: Option<String>,
}

impl GitHubArtifactStore {
    pub fn new(
        downloader: Downloader,
        api_url: impl Into<String>,
        repository: Option<String>,
        run_id: Option<String>,
    ) -> Self {
        Self {
            downloader,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            repository,
            run_id,
        }
    }

    fn repository(&self) -> Result<&str> {
        self.repository
            .as_deref()
            .ok_or_else(|| anyhow!("GITHUB_REPOSITORY is not set; cannot look up artifacts"))
    }

    /// Lookup URL for `name`: a direct artifact lookup for numeric ids, otherwise a name search
    /// scoped to the current workflow run when it is known.
    fn lookup_url(&self, name: &str) -> Result<Url> {
        let repo = self.repository()?;

        if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Url::parse(&format!(
                "{}/repos/{}/actions/artifacts/{}",
                self.api_url, repo, name
            ))?);
        }

        let base = match self.run_id.as_deref() {
            Some(run_id) => format!(
                "{}/repos/{}/actions/runs/{}/artifacts",
                self.api_url, repo, run_id
            ),
            None => format!("{}/repos/{}/actions/artifacts", self.api_url, repo),
        };
        Ok(Url::parse_with_params(
            &base,
            &[("name", name), ("per_page", "100")],
        )?)
    }

    async fn find_artifact(&self, name: &str) -> Result<ArtifactInfo> {
        let url = self.lookup_url(name)?;
        debug!(%url, "looking up artifact");

        let response = self
            .downloader
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .context("Failed to query artifacts")?
            .error_for_status()
            .with_context(|| format!("Artifact lookup for '{name}' failed"))?;

        let candidates = if url.path().ends_with("/artifacts") {
            response.json::<ArtifactList>().await?.artifacts
        } else {
            vec![response.json::<ArtifactInfo>().await?]
        };

        select_artifact(candidates, name)
    }
}

fn select_artifact(candidates: Vec<ArtifactInfo>, name: &str) -> Result<ArtifactInfo> {
    let by_id = name.parse::<u64>().ok();
    let matching: Vec<ArtifactInfo> = candidates
        .into_iter()
        .filter(|a| a.name == name || Some(a.id) == by_id)
        .collect();

    if matching.is_empty() {
        bail!("Artifact '{name}' not found");
    }

    matching
        .into_iter()
        .filter(|a| !a.expired)
        .max_by_key(|a| a.id)
        .ok_or_else(|| anyhow!("Artifact '{name}' has expired"))
}

#[async_trait]
impl ArtifactStore for GitHubArtifactStore {
    async fn download(&self, name: &str, dest: &Path) -> Result<PathBuf> {
        let artifact = self.find_artifact(name).await?;
        debug!(id = artifact.id, name = %artifact.name, "resolved artifact");

        ensure_dir(dest)?;
        let url = Url::parse(&artifact.archive_download_url)
            .context("Invalid artifact download URL")?;
        let archive = dest.join(format!("{}.zip", sanitize_component(&artifact.name)));
        self.downloader.download_file(&url, &archive).await?;

        Ok(dest.to_path_buf())
    }
}
