//! Configuration loader for Brandmind.
//!
//! Reads `config.toml` from the data directory (`~/.brandmind/` in production)
//! and deserializes it into [`BrandmindConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use brandmind_types::config::BrandmindConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "BRANDMIND_DATA_DIR";

/// Environment variables checked, in order, for the embedding API key.
pub const API_KEY_ENVS: [&str; 2] = ["BRANDMIND_EMBEDDING_API_KEY", "OPENAI_API_KEY"];

/// Resolve the data directory from `BRANDMIND_DATA_DIR`, falling back to
/// `~/.brandmind`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".brandmind"),
    }
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`BrandmindConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
/// - Otherwise returns the parsed config; omitted sections keep their defaults.
pub async fn load_config(data_dir: &Path) -> BrandmindConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return BrandmindConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return BrandmindConfig::default();
        }
    };

    match toml::from_str::<BrandmindConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            BrandmindConfig::default()
        }
    }
}

/// Read the embedding API key from the environment.
///
/// Returns `None` when no variable is set (local OpenAI-compatible servers
/// often need no key).
pub fn embedding_api_key() -> Option<SecretString> {
    API_KEY_ENVS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
        .map(SecretString::from)
}
