//! Directory helpers for acquisition and install roots.
//!
//! Acquisition directories are namespaced by a sanitized prefix and a millisecond timestamp, so
//! two runs on the same host (or two attempts within one run) never share a directory.
use anyhow::{bail, Context, Result};
use std::fs::{self, DirBuilder, Permissions};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};

/// Creates `<root>/<prefix>-<unix millis>`, adding a numeric suffix if that name is taken.
pub fn create_unique_dir(root: &Path, prefix: &str) -> Result<PathBuf> {
    ensure_dir(root)?;

    let base = format!(
        "{}-{}",
        sanitize_component(prefix),
        chrono::Utc::now().timestamp_millis()
    );

    let mut candidate = root.join(&base);
    let mut attempt = 0u32;
    loop {
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                attempt += 1;
                candidate = root.join(format!("{base}-{attempt}"));
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create directory {:?}", candidate))
            }
        }
    }
}

/// Replaces anything outside `[A-Za-z0-9._-]` so the value is safe as a single path component.
pub fn sanitize_component(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match sanitized.trim_matches('.') {
        "" => "download".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Creates a directory (and its parents) if it doesn't exist. Fails if the path exists but is not
/// a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    ensure_dir_with_permissions(path, None)
}

/// Like [`ensure_dir`], but a newly created directory gets `mode`.
pub fn ensure_dir_with_permissions(path: &Path, mode: Option<u32>) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            bail!("path is not a directory: {:?}", path);
        }
        return Ok(());
    }

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    if let Some(mode) = mode {
        builder.mode(mode);
    }
    builder
        .create(path)
        .with_context(|| format!("Failed to create directory: {:?}", path))
}

/// Makes sure the owner, group and others can execute `path`.
pub fn ensure_executable(path: &Path) -> Result<()> {
    let metadata =
        fs::metadata(path).with_context(|| format!("Cannot read metadata of {:?}", path))?;
    let mode = metadata.permissions().mode();
    if mode & 0o111 != 0o111 {
        fs::set_permissions(path, Permissions::from_mode(mode | 0o755))
            .with_context(|| format!("Failed to make {:?} executable", path))?;
    }
    Ok(())
}
