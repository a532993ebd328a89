//! CLI commands for droidctl
//!
//! AVD and SDK subcommands, each dispatching into the workspace crates.

use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use droidctl_core::AppConfig;

/// AVD management actions
#[derive(Subcommand)]
pub enum AvdAction {
    /// List configured AVDs
    List,
    /// Create a new AVD
    Create {
        /// AVD name (letters, digits, underscores and hyphens)
        name: String,
        /// Android API level
        #[arg(short, long, default_value = "34")]
        api: String,
        /// Device profile, e.g. pixel_7
        #[arg(short, long, default_value = "pixel_7")]
        device: String,
    },
    /// Delete an AVD
    Delete {
        /// AVD name
        name: String,
    },
    /// Start the emulator for an AVD
    Start {
        /// AVD name
        name: String,
    },
}

/// AVD management command
pub struct AvdCommand {
    pub action: AvdAction,
}

impl AvdCommand {
    /// Execute the AVD command
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        use droidctl_emulator_bridge::{
            android_version_name, api_level_from_target, format_device_name, EmulatorManager,
        };

        let sdk_root = config.sdk.resolved_sdk_root().unwrap_or_default();
        let manager = EmulatorManager::new(&sdk_root).with_timeouts(
            Duration::from_secs(config.emulator.create_timeout_secs),
            Duration::from_secs(config.emulator.list_timeout_secs),
        );

        match &self.action {
            AvdAction::List => {
                let avds = manager.list_avds().await?;
                if avds.is_empty() {
                    println!("No AVDs configured");
                } else {
                    println!("Available AVDs:");
                    for avd in avds {
                        let version = api_level_from_target(&avd.target)
                            .map(|api| android_version_name(&api))
                            .unwrap_or_else(|| "Android (Unknown)".to_string());
                        println!("  {} - {} ({})", avd.name, version, avd.path.display());
                    }
                }
            }
            AvdAction::Create { name, api, device } => {
                if manager.create_avd(name, api, device).await? {
                    println!("Created AVD: {} ({})", name, format_device_name(device));
                } else {
                    anyhow::bail!("Failed to create AVD: {}", name);
                }
            }
            AvdAction::Delete { name } => {
                if manager.delete_avd(name).await? {
                    println!("Deleted AVD: {}", name);
                } else {
                    anyhow::bail!("Failed to delete AVD: {}", name);
                }
            }
            AvdAction::Start { name } => {
                let handle = manager.start_emulator(name).await?;
                match handle.pid {
                    Some(pid) => println!("Started emulator: {} (pid {})", name, pid),
                    None => println!("Started emulator: {}", name),
                }
            }
        }

        Ok(())
    }
}

/// SDK management actions
#[derive(Subcommand)]
pub enum SdkAction {
    /// Show toolchain status and installed API levels
    Check,
    /// Install SDK components (the stock set when none are given)
    Install {
        /// sdkmanager package identifiers, e.g. "platforms;android-35"
        components: Vec<String>,
    },
    /// Accept SDK licenses non-interactively
    Licenses,
}

/// SDK management command
pub struct SdkCommand {
    pub action: SdkAction,
}

impl SdkCommand {
    /// Execute the SDK command
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        use droidctl_android_toolchain::{
            default_components, ProgressSink, SdkInstaller, SUPPORTED_API_LEVELS,
        };

        let sdk_root = config.sdk.resolved_sdk_root().unwrap_or_default();
        let installer = SdkInstaller::new(&sdk_root)
            .with_component_timeout(Duration::from_secs(config.install.component_timeout_secs))
            .with_license_answer_limit(config.install.license_answer_limit);

        match &self.action {
            SdkAction::Check => {
                println!("Android SDK status: {}", sdk_root.display());
                println!("========================================");

                if installer.is_available() {
                    println!("✓ sdkmanager");
                } else {
                    println!("✗ sdkmanager not found");
                }

                for api in SUPPORTED_API_LEVELS {
                    let api = api.to_string();
                    let marker = if installer.is_api_level_installed(&api) {
                        '✓'
                    } else {
                        '✗'
                    };
                    println!("{} API {}", marker, api);
                }
            }
            SdkAction::Install { components } => {
                let components = if components.is_empty() {
                    default_components()
                } else {
                    components.clone()
                };

                let progress: ProgressSink = Box::new(|percent, message| {
                    println!("[{:3}%] {}", percent, message);
                });

                let statuses = installer
                    .install_components(&components, Some(progress))
                    .await?;

                let failed: Vec<_> = statuses.iter().filter(|s| !s.success).collect();
                if failed.is_empty() {
                    println!("Installed {} component(s)", statuses.len());
                } else {
                    println!(
                        "Installed {} of {} component(s)",
                        statuses.len() - failed.len(),
                        statuses.len()
                    );
                    for status in failed {
                        println!("  failed: {}", status.component);
                    }
                }
            }
            SdkAction::Licenses => {
                installer.accept_licenses().await?;
                println!("License acceptance finished");
            }
        }

        Ok(())
    }
}
