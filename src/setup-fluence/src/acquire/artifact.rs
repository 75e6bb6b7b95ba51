use super::{AcquiredTree, Acquire, ArtifactStore};
use crate::archive::{self, ArchiveKind};
use crate::download::Downloader;
use crate::error::{Result, SetupError};
use crate::fs::{create_unique_dir, ensure_dir};
use crate::info_message;
use crate::specifier::VersionSpecifier;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// How many zip layers are peeled off before giving up on finding a tarball.
const MAX_ZIP_DEPTH: usize = 3;

const DOWNLOAD_DIR: &str = "download";

/// Fetches prebuilt packages from a direct URL or from the CI artifact store and unpacks them.
///
/// The payload is either a tarball or a zip wrapping one (possibly inside another zip, the way
/// artifact stores re-wrap uploads). Exactly one tarball must be found; it is unpacked into the
/// root of the acquisition directory.
pub struct ArtifactAcquirer<S> {
    downloader: Downloader,
    store: S,
    temp_root: PathBuf,
}

impl<S: ArtifactStore> ArtifactAcquirer<S> {
    pub fn new(downloader: Downloader, store: S, temp_root: impl Into<PathBuf>) -> Self {
        Self {
            downloader,
            store,
            temp_root: temp_root.into(),
        }
    }

    async fn download_url(&self, url: &Url, root: &Path) -> anyhow::Result<PathBuf> {
        let dir = root.join(DOWNLOAD_DIR);
        ensure_dir(&dir)?;
        self.downloader.download_to(url, &dir).await?;
        Ok(dir)
    }

    async fn fetch(&self, specifier: &VersionSpecifier) -> anyhow::Result<PathBuf> {
        let root = create_unique_dir(&self.temp_root, &specifier.dir_prefix())?;

        let download_dir = match specifier {
            VersionSpecifier::Url(url) => self.download_url(url, &root).await?,
            VersionSpecifier::ArtifactRef(name) => {
                self.store.download(name, &root.join(DOWNLOAD_DIR)).await?
            }
            other => return Err(anyhow!("{other} is not an artifact reference or URL")),
        };
        debug!(dir = ?download_dir, "artifact downloaded");

        let unpack_root = root.clone();
        tokio::task::spawn_blocking(move || unpack_payload(&download_dir, &unpack_root))
            .await
            .context("Archive extraction task failed")??;

        Ok(root)
    }
}

#[async_trait]
impl<S: ArtifactStore> Acquire for ArtifactAcquirer<S> {
    async fn acquire(&self, specifier: &VersionSpecifier) -> Result<AcquiredTree> {
        let artifact = match specifier {
            VersionSpecifier::Url(url) => url.to_string(),
            VersionSpecifier::ArtifactRef(name) => name.clone(),
            other => other.to_string(),
        };
        info_message!("Attempting to download artifact: {}", artifact);

        match self.fetch(specifier).await {
            Ok(root) => Ok(AcquiredTree {
                root,
                source: format!("artifact {artifact}"),
            }),
            Err(err) => Err(match err.downcast::<SetupError>() {
                Ok(setup_error) => setup_error,
                Err(source) => SetupError::ArtifactFailed { artifact, source },
            }),
        }
    }
}

/// Finds the single tarball in `download_dir`, unzipping wrapper layers on the way, and unpacks
/// it into `root`.
fn unpack_payload(download_dir: &Path, root: &Path) -> anyhow::Result<()> {
    let mut dir = download_dir.to_path_buf();

    for depth in 0..=MAX_ZIP_DEPTH {
        let (tarballs, zips) = scan_archives(&dir, depth == 0)?;

        match tarballs.as_slice() {
            [tarball] => {
                debug!(?tarball, "unpacking tarball");
                return archive::unpack_tar_gz(tarball, root);
            }
            [] => {}
            many => {
                return Err(SetupError::NoArchiveFound(format!(
                    "expected a single .tar.gz in {:?}, found {}",
                    dir,
                    many.len()
                ))
                .into())
            }
        }

        match zips.as_slice() {
            [zip] if depth < MAX_ZIP_DEPTH => {
                let extracted = match depth {
                    0 => root.join("extracted"),
                    n => root.join(format!("extracted-{n}")),
                };
                debug!(?zip, dest = ?extracted, "unzipping");
                archive::unzip(zip, &extracted)?;
                dir = extracted;
            }
            _ => break,
        }
    }

    Err(SetupError::NoArchiveFound(format!("no .tar.gz archive found in {:?}", dir)).into())
}

/// Splits the files under `dir` into tarballs and zips by name. Only the downloaded payload itself
/// may be unnamed (artifact stores serve zips from extensionless URLs), so at the top level a
/// directory with no named archive falls back to sniffing each file's leading bytes.
fn scan_archives(dir: &Path, top_level: bool) -> anyhow::Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let tarballs = archive::find_tarballs(dir);
    let zips = archive::find_zips(dir);
    if !top_level || !tarballs.is_empty() || !zips.is_empty() {
        return Ok((tarballs, zips));
    }

    let mut tarballs = Vec::new();
    let mut zips = Vec::new();
    for path in archive::find_files(dir, |_| true) {
        match ArchiveKind::detect(&path)? {
            Some(ArchiveKind::TarGz) => tarballs.push(path),
            Some(ArchiveKind::Zip) => zips.push(path),
            None => {}
        }
    }
    Ok((tarballs, zips))
}
