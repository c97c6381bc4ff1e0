//! Configuration loading
//!
//! Reads the TOML/JSON configuration file and applies environment overrides.

pub mod loader;

pub use loader::{apply_env_overrides, load, load_from_file, probe_config_paths};
