//! Archive decoding for downloaded payloads: tar+gzip tarballs and the zip wrappers artifact
//! stores put around them.
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tar::Archive;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// Detects the archive format from its leading bytes, falling back to the file extension.
    pub fn detect(path: &Path) -> Result<Option<Self>> {
        let mut magic = [0u8; 4];
        let read = File::open(path)
            .and_then(|mut file| read_prefix(&mut file, &mut magic))
            .with_context(|| format!("Failed to read {:?}", path))?;

        let kind = match &magic[..read] {
            [b'P', b'K', 3, 4] => Some(Self::Zip),
            [0x1f, 0x8b, ..] => Some(Self::TarGz),
            _ => Self::from_extension(path),
        };
        Ok(kind)
    }

    fn from_extension(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if is_tarball_name(name) {
            Some(Self::TarGz)
        } else {
            None
        }
    }
}

fn read_prefix(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

pub fn is_tarball_name(name: &str) -> bool {
    name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

/// Unpacks a tar+gzip archive into `dest`.
pub fn unpack_tar_gz(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).with_context(|| format!("Failed to open {:?}", archive))?;
    let mut tarball = Archive::new(GzDecoder::new(file));
    tarball.set_preserve_permissions(true);
    tarball
        .unpack(dest)
        .with_context(|| format!("Failed to extract {:?} into {:?}", archive, dest))
}

/// Extracts every entry of a zip archive into `dest`. Entries with names escaping `dest` are
/// skipped; unix permissions are restored when the archive records them.
pub fn unzip(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).with_context(|| format!("Failed to open {:?}", archive))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to open zip archive {:?}", archive))?;

    fs::create_dir_all(dest)?;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .with_context(|| format!("Failed to read zip entry {i} of {:?}", archive))?;

        let outpath = match entry.enclosed_name() {
            Some(path) => dest.join(path),
            None => continue,
        };

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&outpath)
            .with_context(|| format!("Failed to create {:?}", outpath))?;
        io::copy(&mut entry, &mut out)?;

        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
        }
    }
    Ok(())
}

/// Lists regular files under `dir` (recursively) whose name satisfies `matches`, sorted.
pub fn find_files(dir: &Path, matches: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_str().is_some_and(&matches))
        .map(|entry| entry.into_path())
        .collect();
    found.sort();
    found
}

pub fn find_tarballs(dir: &Path) -> Vec<PathBuf> {
    find_files(dir, is_tarball_name)
}

pub fn find_zips(dir: &Path) -> Vec<PathBuf> {
    find_files(dir, |name| name.ends_with(".zip"))
}
