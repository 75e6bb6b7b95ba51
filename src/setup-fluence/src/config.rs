use crate::constants::{
    BUCKET_URL, CHANNELS, ENV_PREFIX, GITHUB_API_URL, GITHUB_API_URL_ENV_VAR,
    GITHUB_PATH_ENV_VAR, GITHUB_REPOSITORY_ENV_VAR, GITHUB_RUN_ID_ENV_VAR, GITHUB_TOKEN_ENV_VAR,
    INSTALL_DIR_NAME, RUNNER_TEMP_ENV_VAR, SMOKE_TEST_ARGS,
};
use anyhow::{Context, Result};
use config::{Config as RConfig, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize)]
pub struct SetupConfig {
    pub bucket_url: String,
    pub temp_root: PathBuf,
    pub install_root: PathBuf,
    pub smoke_test_args: Vec<String>,
    pub channels: Vec<String>,
    pub channels_url: Option<String>,

    pub github_api_url: String,
    pub github_repository: Option<String>,
    pub github_run_id: Option<String>,
    pub github_token: Option<String>,
    pub github_path: Option<PathBuf>,
}

impl SetupConfig {
    pub fn bucket_url(&self) -> &str {
        self.bucket_url.trim_end_matches('/')
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.install_root.join("bin")
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the configuration from the process environment.
    pub fn load() -> Result<SetupConfig> {
        Self::load_from(&std::env::vars().collect())
    }

    /// Loads the configuration from an explicit set of environment variables. Precedence, lowest
    /// to highest: built-in defaults, runner-provided variables, `FLUENCE_SETUP_*` overrides.
    pub fn load_from(vars: &HashMap<String, String>) -> Result<SetupConfig> {
        let var = |name: &str| {
            vars.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let temp_root = var(RUNNER_TEMP_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        let install_root = temp_root.join(INSTALL_DIR_NAME);

        let mut builder = RConfig::builder()
            .set_default("bucket_url", BUCKET_URL)?
            .set_default("temp_root", path_value(&temp_root)?)?
            .set_default("install_root", path_value(&install_root)?)?
            .set_default("smoke_test_args", SMOKE_TEST_ARGS.to_vec())?
            .set_default("channels", CHANNELS.to_vec())?
            .set_default(
                "github_api_url",
                var(GITHUB_API_URL_ENV_VAR).unwrap_or_else(|| GITHUB_API_URL.to_string()),
            )?;

        for (key, env_var) in [
            ("github_repository", GITHUB_REPOSITORY_ENV_VAR),
            ("github_run_id", GITHUB_RUN_ID_ENV_VAR),
            ("github_token", GITHUB_TOKEN_ENV_VAR),
            ("github_path", GITHUB_PATH_ENV_VAR),
        ] {
            builder = builder.set_default(key, var(env_var))?;
        }

        let overrides: HashMap<String, String> = vars
            .iter()
            .filter(|(key, value)| key.starts_with(ENV_PREFIX) && !value.trim().is_empty())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("smoke_test_args")
                .with_list_parse_key("channels")
                .try_parsing(true)
                .source(Some(overrides)),
        );

        builder
            .build()?
            .try_deserialize()
            .context("failed to parse setup configuration")
    }
}

fn path_value(path: &std::path::Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .with_context(|| format!("path is not valid UTF-8: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = ConfigLoader::load_from(&vars(&[("RUNNER_TEMP", "/runner/temp")]))?;

        assert_eq!(config.bucket_url(), BUCKET_URL);
        assert_eq!(config.temp_root, PathBuf::from("/runner/temp"));
        assert_eq!(config.bin_dir(), PathBuf::from("/runner/temp/setup-fluence/bin"));
        assert_eq!(config.smoke_test_args, vec!["dep", "versions"]);
        assert_eq!(config.channels.len(), CHANNELS.len());
        assert_eq!(config.github_api_url, GITHUB_API_URL);
        assert!(config.github_token.is_none());
        assert!(config.github_path.is_none());
        assert!(config.channels_url.is_none());
        Ok(())
    }

    #[test]
    fn test_runner_variables() -> Result<()> {
        let config = ConfigLoader::load_from(&vars(&[
            ("RUNNER_TEMP", "/runner/temp"),
            ("GITHUB_TOKEN", "secret"),
            ("GITHUB_REPOSITORY", "fluencelabs/cli"),
            ("GITHUB_RUN_ID", "42"),
            ("GITHUB_PATH", "/runner/path_file"),
            ("GITHUB_API_URL", "https://ghe.example.com/api/v3"),
        ]))?;

        assert_eq!(config.github_token.as_deref(), Some("secret"));
        assert_eq!(config.github_repository.as_deref(), Some("fluencelabs/cli"));
        assert_eq!(config.github_run_id.as_deref(), Some("42"));
        assert_eq!(config.github_path, Some(PathBuf::from("/runner/path_file")));
        assert_eq!(config.github_api_url, "https://ghe.example.com/api/v3");
        Ok(())
    }

    #[test]
    fn test_prefixed_overrides() -> Result<()> {
        let config = ConfigLoader::load_from(&vars(&[
            ("RUNNER_TEMP", "/runner/temp"),
            ("FLUENCE_SETUP_BUCKET_URL", "http://127.0.0.1:8080/"),
            ("FLUENCE_SETUP_INSTALL_ROOT", "/opt/fluence"),
            ("FLUENCE_SETUP_SMOKE_TEST_ARGS", "--version"),
            ("FLUENCE_SETUP_CHANNELS", "stable,nightly"),
            ("FLUENCE_SETUP_CHANNELS_URL", "http://127.0.0.1:8080/channels.json"),
        ]))?;

        assert_eq!(config.bucket_url(), "http://127.0.0.1:8080");
        assert_eq!(config.bin_dir(), PathBuf::from("/opt/fluence/bin"));
        assert_eq!(config.smoke_test_args, vec!["--version"]);
        assert_eq!(config.channels, vec!["stable", "nightly"]);
        assert_eq!(
            config.channels_url.as_deref(),
            Some("http://127.0.0.1:8080/channels.json")
        );
        Ok(())
    }
}
