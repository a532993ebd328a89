//! Application Configuration
//!
//! Settings shared by the droidctl crates: SDK location, install timeouts
//! and license handling. Persisted as TOML in the platform config
//! directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Cannot determine config path")]
    NoConfigDir,
}

/// Android SDK location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SdkConfig {
    /// Path to the SDK root; when unset, resolution falls back to the
    /// environment and then the conventional per-user location
    pub sdk_root: Option<PathBuf>,
}

impl SdkConfig {
    /// Resolve the SDK root: explicit setting, then `ANDROID_HOME`,
    /// then `ANDROID_SDK_ROOT`, then `~/Android/sdk`.
    pub fn resolved_sdk_root(&self) -> Option<PathBuf> {
        self.sdk_root
            .clone()
            .or_else(|| std::env::var_os("ANDROID_HOME").map(PathBuf::from))
            .or_else(|| std::env::var_os("ANDROID_SDK_ROOT").map(PathBuf::from))
            .or_else(default_sdk_path)
    }
}

/// SDK component installation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Per-component timeout in seconds; system images are large
    pub component_timeout_secs: u64,
    /// Upper bound of "y" answers piped to `sdkmanager --licenses`.
    /// Writing stops early once the tool stops reading, so this only
    /// needs to be at least the number of license prompts.
    pub license_answer_limit: usize,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            component_timeout_secs: 30 * 60,
            license_answer_limit: 20,
        }
    }
}

/// Timeouts for the avdmanager invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmulatorTimeouts {
    /// Timeout for `avdmanager create avd`, in seconds
    pub create_timeout_secs: u64,
    /// Timeout for `avdmanager list avd` and `delete avd`, in seconds
    pub list_timeout_secs: u64,
}

impl Default for EmulatorTimeouts {
    fn default() -> Self {
        Self {
            create_timeout_secs: 10 * 60,
            list_timeout_secs: 5 * 60,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// SDK location
    #[serde(default)]
    pub sdk: SdkConfig,
    /// Install settings
    #[serde(default)]
    pub install: InstallConfig,
    /// AVD tool timeouts
    #[serde(default)]
    pub emulator: EmulatorTimeouts,
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("droidctl"))
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from file, creating defaults when absent
    pub async fn load() -> Result<Self, ConfigError> {
        let config_file = Self::config_file().ok_or(ConfigError::NoConfigDir)?;

        if config_file.exists() {
            debug!("Loading config from {:?}", config_file);
            let contents = tokio::fs::read_to_string(&config_file).await?;
            let config: AppConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            info!("Config file not found, using defaults");
            let config = AppConfig::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<(), ConfigError> {
        let config_file = Self::config_file().ok_or(ConfigError::NoConfigDir)?;

        if let Some(parent) = config_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(&config_file, contents).await?;

        debug!("Config saved to {:?}", config_file);
        Ok(())
    }
}

/// Conventional per-user SDK location, `~/Android/sdk`
pub fn default_sdk_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("Android").join("sdk"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.sdk.sdk_root.is_none());
        assert_eq!(config.install.license_answer_limit, 20);
        assert_eq!(config.install.component_timeout_secs, 1800);
        assert_eq!(config.emulator.create_timeout_secs, 600);
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = AppConfig::default();
        config.sdk.sdk_root = Some(PathBuf::from("/opt/android-sdk"));
        config.install.license_answer_limit = 5;

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml).unwrap();

        assert_eq!(parsed.sdk.sdk_root, Some(PathBuf::from("/opt/android-sdk")));
        assert_eq!(parsed.install.license_answer_limit, 5);
    }

    #[test]
    fn test_explicit_sdk_root_wins() {
        let config = SdkConfig {
            sdk_root: Some(PathBuf::from("/explicit/sdk")),
        };
        assert_eq!(
            config.resolved_sdk_root(),
            Some(PathBuf::from("/explicit/sdk"))
        );
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig = toml::from_str("[sdk]\nsdk_root = \"/sdk\"\n").unwrap();
        assert_eq!(parsed.sdk.sdk_root, Some(PathBuf::from("/sdk")));
        assert_eq!(parsed.install.license_answer_limit, 20);
    }
}
