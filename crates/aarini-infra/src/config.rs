//! Relay configuration loader for Aarini.
//!
//! Reads `config.toml` and deserializes it into [`RelayConfig`]. Falls back
//! to defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use aarini_types::config::{RelayConfig, default_system_instruction};
use aarini_types::error::ConfigError;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "AARINI_CONFIG";

/// `<platform config dir>/aarini/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("aarini").join("config.toml"))
}

/// Pick the config file: explicit path, then `AARINI_CONFIG`, then the platform default.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .or_else(default_config_path)
}

/// Load relay configuration from `path`.
///
/// - If no path is known or the file does not exist, returns [`RelayConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and returns the default.
pub async fn load_relay_config(path: Option<&Path>) -> RelayConfig {
    let Some(config_path) = path else {
        tracing::debug!("No config path available, using defaults");
        return RelayConfig::default();
    };

    match read_relay_config(config_path).await {
        Ok(Some(config)) => config,
        Ok(None) => {
            tracing::debug!("No config found at {}, using defaults", config_path.display());
            RelayConfig::default()
        }
        Err(err) => {
            tracing::warn!("{err}, using defaults");
            RelayConfig::default()
        }
    }
}

/// Strict variant of [`load_relay_config`]: `Ok(None)` when the file is absent.
pub async fn read_relay_config(path: &Path) -> Result<Option<RelayConfig>, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let config: RelayConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if config.models.is_empty() {
        return Err(ConfigError::NoModels);
    }
    Ok(Some(config))
}

/// The system instruction to send upstream.
///
/// Inline text wins over `system_instruction_file`; an unreadable file logs a
/// warning and falls back to the built-in instruction.
pub async fn resolve_system_instruction(config: &RelayConfig) -> String {
    if let Some(text) = config.system_instruction.as_deref().filter(|t| !t.trim().is_empty()) {
        return text.to_string();
    }
    if let Some(path) = &config.system_instruction_file {
        match tokio::fs::read_to_string(path).await {
            Ok(text) if !text.trim().is_empty() => return text,
            Ok(_) => tracing::warn!("System instruction file {} is empty, using default", path.display()),
            Err(err) => tracing::warn!(
                "Failed to read system instruction file {}: {err}, using default",
                path.display()
            ),
        }
    }
    default_system_instruction()
}
