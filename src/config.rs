/// Config Module - Settings
///
/// Loaded from an optional `txdecode.toml` plus `TXDECODE_*` environment
/// variables. Nested keys use a double underscore, e.g.
/// `TXDECODE_SERVER__BIND=0.0.0.0:3005`.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::codec::Network;

pub const DEFAULT_CONFIG_FILE: &str = "txdecode.toml";
pub const DEFAULT_BIND: &str = "127.0.0.1:3005";

static GLOBAL_CONFIG: OnceCell<Settings> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: DEFAULT_BIND.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub network: Network,
    /// Default filter when RUST_LOG is unset
    pub log_level: String,
    pub log_format: LogFormat,
    /// Write logs here instead of stdout
    pub log_file: Option<String>,
    pub server: ServerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            log_file: None,
            server: ServerSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings. An explicit path must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("TXDECODE").prefix_separator("_").separator("__"))
            .build()?
            .try_deserialize()
    }
}

/// Load settings once for the whole process
pub fn init_global_config(path: Option<&Path>) -> Result<&'static Settings, ConfigError> {
    let settings = Settings::load(path)?;
    Ok(GLOBAL_CONFIG.get_or_init(|| settings))
}

/// Global settings, defaults if never initialized
pub fn get_global_config() -> &'static Settings {
    GLOBAL_CONFIG.get_or_init(Settings::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.network, Network::Mainnet);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert_eq!(settings.log_file, None);
        assert_eq!(settings.server.bind, "127.0.0.1:3005");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("txdecode.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "network = \"testnet\"\nlog_format = \"json\"\n\n[server]\nbind = \"0.0.0.0:8080\""
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.network, Network::Testnet);
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.server.bind, "0.0.0.0:8080");
        // Unset keys keep their defaults
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_bad_network_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("txdecode.toml");
        std::fs::write(&path, "network = \"litecoin\"\n").unwrap();
        assert!(Settings::load(Some(&path)).is_err());
    }
}
