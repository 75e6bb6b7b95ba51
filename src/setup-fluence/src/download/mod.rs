mod progress;

pub use progress::{DownloadProgress, PROGRESS_STEP};

use crate::constants::USER_AGENT;
use crate::fs::sanitize_component;
use crate::info_message;
use anyhow::{Context, Result};
use futures_util::StreamExt;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

/// HTTP downloads with progress reporting. Requests to GitHub hosts carry the run's token.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    github_token: Option<String>,
    token_hosts: Vec<String>,
}

impl Downloader {
    pub fn new(github_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            github_token,
            token_hosts: Vec::new(),
        })
    }

    /// Also sends the token to `host`, e.g. a GitHub Enterprise API host.
    pub fn with_token_host(mut self, host: impl Into<String>) -> Self {
        self.token_hosts.push(host.into());
        self
    }

    /// Starts a GET request, attaching a bearer credential when the host requires one.
    pub fn get(&self, url: &Url) -> RequestBuilder {
        let request = self.client.get(url.clone());
        match self.github_token.as_deref() {
            Some(token) if self.requires_token(url) => {
                request.header(AUTHORIZATION, format!("Bearer {token}"))
            }
            _ => request,
        }
    }

    /// Streams `url` into `dir`, naming the file after the last URL path segment. Returns the
    /// path of the written file.
    pub async fn download_to(&self, url: &Url, dir: &Path) -> Result<PathBuf> {
        let dest = dir.join(file_name_for(url));
        self.download_file(url, &dest).await?;
        Ok(dest)
    }

    /// Streams `url` into `dest`, logging progress in 5% steps of the declared content length.
    pub async fn download_file(&self, url: &Url, dest: &Path) -> Result<()> {
        info_message!("Downloading {}", url);

        let response = self
            .get(url)
            .send()
            .await
            .context("Failed to initiate download")?
            .error_for_status()
            .context("Download request failed")?;

        let mut progress = DownloadProgress::new(response.content_length());
        let mut file = File::create(dest)
            .await
            .with_context(|| format!("Failed to create {:?}", dest))?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Failed to read response body")?;
            file.write_all(&chunk).await?;
            if let Some(percent) = progress.advance(chunk.len() as u64) {
                info_message!("Downloading: {}%", percent);
            }
        }
        file.flush().await?;

        debug!(%url, bytes = progress.downloaded(), dest = ?dest, "download complete");
        Ok(())
    }

    /// Fetches and deserializes a JSON document.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        debug!(%url, "fetching json");
        let body = self
            .get(url)
            .send()
            .await
            .context("Failed to send request")?
            .error_for_status()
            .context("Request failed")?
            .text()
            .await
            .context("Failed to read response body")?;

        serde_json::from_str(&body).with_context(|| format!("Invalid JSON returned by {url}"))
    }
}

impl Downloader {
    fn requires_token(&self, url: &Url) -> bool {
        requires_github_token(url)
            || url
                .host_str()
                .is_some_and(|host| self.token_hosts.iter().any(|h| h == host))
    }
}

fn requires_github_token(url: &Url) -> bool {
    url.host_str().is_some_and(|host| {
        host == "github.com"
            || host.ends_with(".github.com")
            || host.ends_with(".githubusercontent.com")
    })
}

fn file_name_for(url: &Url) -> String {
    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    sanitize_component(name)
}
