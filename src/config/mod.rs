// Configuration management module
// Handles TOML configuration loading, validation, and derived store paths

pub mod settings;

pub use settings::{ChunkingConfig, Config, ConfigError, OllamaConfig};

/// Get the default configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::default_dir()
}
