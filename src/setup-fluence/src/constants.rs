pub const BUCKET_URL: &str = "https://fcli-binaries.s3.eu-west-1.amazonaws.com";
pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const USER_AGENT: &str = concat!("setup-fluence/", env!("CARGO_PKG_VERSION"));

/// Release channels known without asking the bucket.
pub const CHANNELS: [&str; 7] = [
    "kras", "testnet", "stage", "latest", "stable", "main", "unstable",
];

pub const BINARY_NAME: &str = "fluence";
pub const INSTALL_DIR_NAME: &str = "setup-fluence";
pub const SMOKE_TEST_ARGS: [&str; 2] = ["dep", "versions"];

pub const ENV_PREFIX: &str = "FLUENCE_SETUP";
pub const RUNNER_TEMP_ENV_VAR: &str = "RUNNER_TEMP";
pub const RUNNER_DEBUG_ENV_VAR: &str = "RUNNER_DEBUG";
pub const GITHUB_PATH_ENV_VAR: &str = "GITHUB_PATH";
pub const GITHUB_TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";
pub const GITHUB_REPOSITORY_ENV_VAR: &str = "GITHUB_REPOSITORY";
pub const GITHUB_RUN_ID_ENV_VAR: &str = "GITHUB_RUN_ID";
pub const GITHUB_API_URL_ENV_VAR: &str = "GITHUB_API_URL";
