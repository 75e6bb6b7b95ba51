use crate::acquire::{ArtifactAcquirer, Bucket, GitHubArtifactStore, PublicReleases};
use crate::config::{ConfigLoader, SetupConfig};
use crate::download::Downloader;
use crate::error::{Result, SetupError};
use crate::installer::{BinaryInstaller, Installation, PathPublisher};
use crate::orchestrator::FallbackOrchestrator;
use crate::platform::PlatformKey;
use crate::specifier::ChannelSet;
use crate::types::SetupFluenceCli;
use tracing::debug;
use url::Url;

pub use colored::Colorize;

pub mod acquire;
pub mod archive;
pub mod config;
pub mod constants;
pub mod download;
pub mod error;
pub mod fs;
pub mod installer;
pub mod logging;
pub mod message;
pub mod orchestrator;
pub mod platform;
pub mod specifier;
pub mod types;

/// Validates the inputs and the host, then installs fluence as the inputs ask.
pub async fn run(cli: &SetupFluenceCli) -> Result<Installation> {
    cli.policy()?;
    let platform = PlatformKey::detect()?;
    let config = ConfigLoader::load().map_err(SetupError::Config)?;
    run_with_config(cli, platform, &config).await
}

/// Same as [`run`] with the platform and configuration already decided.
pub async fn run_with_config(
    cli: &SetupFluenceCli,
    platform: PlatformKey,
    config: &SetupConfig,
) -> Result<Installation> {
    let policy = cli.policy()?;
    debug!(%platform, %policy, "starting setup");

    let downloader = build_downloader(config).map_err(SetupError::Config)?;
    let channels = load_channels(&downloader, config).await;

    let store = GitHubArtifactStore::new(
        downloader.clone(),
        config.github_api_url.as_str(),
        config.github_repository.clone(),
        config.github_run_id.clone(),
    );
    let artifacts = ArtifactAcquirer::new(downloader.clone(), store, &config.temp_root);
    let releases = PublicReleases::new(
        Bucket::new(downloader, config.bucket_url(), platform, &config.temp_root),
        channels.clone(),
    );
    let installer = BinaryInstaller::new(
        config.bin_dir(),
        config.smoke_test_args.clone(),
        PathPublisher::new(config.github_path.clone()),
    );

    FallbackOrchestrator::new(artifacts, releases, installer, channels, policy)
        .run(cli.artifact(), cli.version())
        .await
}

fn build_downloader(config: &SetupConfig) -> anyhow::Result<Downloader> {
    let downloader = Downloader::new(config.github_token.clone())?;
    let api_host = Url::parse(&config.github_api_url)?
        .host_str()
        .map(str::to_string);

    Ok(match api_host {
        Some(host) => downloader.with_token_host(host),
        None => downloader,
    })
}

/// The configured channel list, replaced by the live listing when one is configured and
/// reachable.
async fn load_channels(downloader: &Downloader, config: &SetupConfig) -> ChannelSet {
    let channels = ChannelSet::new(config.channels.clone());
    let Some(channels_url) = config.channels_url.as_deref() else {
        return channels;
    };

    let live = match Url::parse(channels_url) {
        Ok(url) => downloader.fetch_json::<Vec<String>>(&url).await,
        Err(e) => Err(e.into()),
    };
    match live {
        Ok(live) => channels.refine(live),
        Err(e) => {
            crate::debug_message!("Channel listing unavailable, using the built-in list: {:#}", e);
            channels
        }
    }
}
