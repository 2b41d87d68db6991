//! Configuration loader for Scanflow.
//!
//! Reads `config.toml` from the data directory (`~/.scanflow/` in
//! production) and deserializes it into [`OrchestratorConfig`]. Falls
//! back to defaults when the file is missing or malformed.

use std::path::Path;

use scanflow_types::config::OrchestratorConfig;

/// Load orchestrator configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`OrchestratorConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config
///   with providers sorted by ascending priority.
pub async fn load_config(data_dir: &Path) -> OrchestratorConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return OrchestratorConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return OrchestratorConfig::default();
        }
    };

    match toml::from_str::<OrchestratorConfig>(&content) {
        Ok(mut config) => {
            config.providers.sort_by_key(|p| p.priority);
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            OrchestratorConfig::default()
        }
    }
}

/// Resolve the data directory from `SCANFLOW_DATA_DIR`, falling back to
/// `~/.scanflow`.
pub fn data_dir() -> std::path::PathBuf {
    std::env::var("SCANFLOW_DATA_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            std::path::PathBuf::from(home).join(".scanflow")
        })
}
