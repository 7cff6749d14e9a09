//! TOML configuration for the ssync client and server.
//!
//! A single file may carry a `[client]` section (known remote servers,
//! defaults for the `cp` command), a `[server]` section (spaces, users and
//! bind address), or both. Values can be overridden through `SSYNC_`
//! environment variables.

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Toml};

/// Per-request timeout applied when neither the CLI nor the config names one.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
/// Worker count per pipeline stage when neither the CLI nor the config names one.
pub const DEFAULT_WORKERS: usize = 10;

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    pub client: Option<ClientConfig>,
    pub server: Option<ServerConfig>,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct ClientConfig {
    /// Known remote servers, keyed by the name used in `server:path` expressions.
    pub servers: std::collections::HashMap<String, ClientServer>,
    /// Default per-request timeout in milliseconds.
    #[serde(default)]
    pub default_timeout_ms: Option<u64>,
    /// Default worker count per pipeline stage.
    #[serde(default)]
    pub default_workers: Option<usize>,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct ClientServer {
    /// Credential presented to the server.
    pub guid: String,
    /// Base URL of the server's transfer API.
    pub address: String,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "127.0.0.1:4070".
    pub address: String,
    /// Space name to physical root directory.
    pub spaces: std::collections::HashMap<String, std::path::PathBuf>,
    #[serde(default)]
    pub users: Vec<ServerUser>,
    /// Maximum recursion depth for the directory tree endpoint.
    pub max_tree_depth: usize,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct ServerUser {
    pub guid: String,
    #[serde(default)]
    pub spaces: Vec<String>,
}

impl Config {
    /// Cross-field validation run once at startup.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(server) = &self.server {
            for user in &server.users {
                for space in &user.spaces {
                    if !server.spaces.contains_key(space) {
                        anyhow::bail!("user '{}' references unknown space '{}'", user.guid, space);
                    }
                }
            }
            if server.max_tree_depth == 0 {
                anyhow::bail!("max_tree_depth must be at least 1");
            }
        }
        Ok(())
    }
}

/// Paths searched when no config file is given on the command line.
pub fn default_paths() -> Vec<std::path::PathBuf> {
    let mut paths = vec![std::path::PathBuf::from("/etc/ssync/config.toml")];
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(std::path::Path::new(&home).join(".config/ssync/config.toml"));
    }
    paths
}

/// Pick the configuration file to load: an explicit path must exist, the
/// default locations are searched in order otherwise.
pub fn find_config(explicit: Option<&std::path::Path>) -> anyhow::Result<std::path::PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            anyhow::bail!("configuration file '{}' does not exist", path.display());
        }
        return Ok(path.to_path_buf());
    }
    let candidates = default_paths();
    for candidate in &candidates {
        if candidate.is_file() {
            return Ok(candidate.clone());
        }
    }
    let searched = candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    anyhow::bail!("no configuration was found in:\n{searched}")
}

/// Load the configuration file, merging `SSYNC_`-prefixed environment
/// variables on top (`SSYNC_SERVER__ADDRESS=...`).
pub fn load(path: &std::path::Path) -> anyhow::Result<Config> {
    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("SSYNC_").split("__"))
        .extract()
        .with_context(|| format!("failed to load configuration from '{}'", path.display()))?;
    Ok(config)
}
