use anyhow::{Context, Result};
use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Makes a directory visible on `PATH`, both for this process and, through the runner's path
/// file, for the remaining steps of the job. The two halves are separate so the path file is only
/// written for a binary that passed its smoke test.
#[derive(Debug, Clone, Default)]
pub struct PathPublisher {
    path_file: Option<PathBuf>,
}

impl PathPublisher {
    pub fn new(path_file: Option<PathBuf>) -> Self {
        Self { path_file }
    }

    /// Puts `dir` first on the process `PATH`. A no-op when it already is first.
    pub fn prepend_to_process_path(&self, dir: &Path) -> Result<()> {
        prepend_to_process_path(dir)
    }

    /// Appends `dir` to the runner's path file, if one is configured.
    pub fn append_to_path_file(&self, dir: &Path) -> Result<()> {
        let Some(path_file) = &self.path_file else {
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path_file)
            .with_context(|| format!("Failed to open path file {:?}", path_file))?;
        writeln!(file, "{}", dir.display())
            .with_context(|| format!("Failed to write path file {:?}", path_file))?;
        debug!(?path_file, ?dir, "appended to runner path file");
        Ok(())
    }
}

fn prepend_to_process_path(dir: &Path) -> Result<()> {
    let current = env::var_os("PATH").unwrap_or_default();
    let mut entries: Vec<PathBuf> = env::split_paths(&current).collect();

    if entries.first().is_some_and(|first| first == dir) {
        return Ok(());
    }
    entries.retain(|entry| entry != dir);
    entries.insert(0, dir.to_path_buf());

    let joined = env::join_paths(entries).context("Failed to build PATH")?;
    env::set_var("PATH", joined);
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::env;
    use std::ffi::OsString;

    /// Puts the process `PATH` back when dropped, even if the test panicked.
    pub struct RestorePath(Option<OsString>);

    impl RestorePath {
        pub fn save() -> Self {
            Self(env::var_os("PATH"))
        }
    }

    impl Drop for RestorePath {
        fn drop(&mut self) {
            match self.0.take() {
                Some(path) => env::set_var("PATH", path),
                None => env::remove_var("PATH"),
            }
        }
    }
}
