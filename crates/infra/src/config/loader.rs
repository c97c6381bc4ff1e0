//! Configuration loader
//!
//! Loads the process configuration from a file, then applies environment
//! overrides.
//!
//! ## Loading Strategy
//! 1. Use the explicit path when one is given, otherwise probe the standard
//!    locations
//! 2. Parse as TOML or JSON (detected by file extension)
//! 3. Fold legacy flat credential keys into their sections
//! 4. Apply `ISSUESYNC_*` environment overrides
//!
//! Validation is left to the caller so command-line flags can still be
//! applied on top.
//!
//! ## Environment Variables
//! - `ISSUESYNC_GITHUB_USERNAME`, `ISSUESYNC_GITHUB_PASSWORD`
//! - `ISSUESYNC_JIRA_BASE_URL`, `ISSUESYNC_JIRA_USERNAME`, `ISSUESYNC_JIRA_PASSWORD`
//! - `ISSUESYNC_LISTEN_PORT`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.toml` or `./config.json` (current working directory)
//! 2. `./issuesync.toml` or `./issuesync.json`
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use issuesync_domain::{Config, Result, SyncError};

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] =
    ["config.toml", "config.json", "issuesync.toml", "issuesync.json"];

/// Load configuration from `path` (or the first probed location) and apply
/// environment overrides.
///
/// # Errors
/// Returns `SyncError::Config` if the file is missing, unreadable or
/// malformed, or an override has an invalid value.
pub fn load(path: Option<PathBuf>) -> Result<Config> {
    let mut config = load_from_file(path)?;
    config.apply_legacy_keys();
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load configuration from a file without any overrides
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SyncError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SyncError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SyncError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => Ok(toml::from_str(contents).map_err(InfraError::from)?),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SyncError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(SyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard locations for a configuration file
///
/// Returns the first file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Overwrite credentials and the listen port from `ISSUESYNC_*` variables
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    override_string(&mut config.github.username, "ISSUESYNC_GITHUB_USERNAME");
    override_string(&mut config.github.password, "ISSUESYNC_GITHUB_PASSWORD");
    override_string(&mut config.jira.base_url, "ISSUESYNC_JIRA_BASE_URL");
    override_string(&mut config.jira.username, "ISSUESYNC_JIRA_USERNAME");
    override_string(&mut config.jira.password, "ISSUESYNC_JIRA_PASSWORD");

    if let Some(port) = env_var("ISSUESYNC_LISTEN_PORT") {
        config.listen_port = port
            .parse()
            .map_err(|e| SyncError::Config(format!("Invalid ISSUESYNC_LISTEN_PORT: {}", e)))?;
    }
    Ok(())
}

fn override_string(target: &mut String, key: &str) {
    if let Some(value) = env_var(key) {
        tracing::debug!(key, "configuration overridden from environment");
        *target = value;
    }
}

/// Non-empty environment variable
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}
