//! Emulator Manager
//!
//! Creates, lists, starts, stops and deletes Android Virtual Devices by
//! driving the SDK's `avdmanager` and `emulator` tools.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use droidctl_core::process::{self, ExecutionSpec, ProcessError, StdinScript};
use tracing::{debug, error, info, warn};

use crate::avd::{self, AvdRecord};
use crate::registry::{AvdRegistry, EmulatorHandle};
use crate::{DEFAULT_SYSTEM_IMAGE_ABI, DEFAULT_SYSTEM_IMAGE_TAG};

/// Emulator manager errors
#[derive(Debug, thiserror::Error)]
pub enum EmulatorError {
    #[error("avdmanager not found in SDK: {0}")]
    AvdManagerNotFound(PathBuf),
    #[error("Emulator executable not found in SDK: {0}")]
    EmulatorNotFound(PathBuf),
    #[error("Invalid AVD name: {0}")]
    InvalidAvdName(String),
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),
}

/// Manages AVDs and their emulator processes for one SDK installation.
pub struct EmulatorManager {
    sdk_root: PathBuf,
    registry: Arc<AvdRegistry>,
    create_timeout: Duration,
    list_timeout: Duration,
}

impl EmulatorManager {
    /// Create a manager with its own registry
    pub fn new(sdk_root: impl Into<PathBuf>) -> Self {
        Self::with_registry(sdk_root, Arc::new(AvdRegistry::new()))
    }

    /// Create a manager sharing an externally owned registry
    pub fn with_registry(sdk_root: impl Into<PathBuf>, registry: Arc<AvdRegistry>) -> Self {
        Self {
            sdk_root: sdk_root.into(),
            registry,
            create_timeout: Duration::from_secs(10 * 60),
            list_timeout: Duration::from_secs(5 * 60),
        }
    }

    /// Override the avdmanager timeouts
    pub fn with_timeouts(mut self, create: Duration, list: Duration) -> Self {
        self.create_timeout = create;
        self.list_timeout = list;
        self
    }

    /// The registry backing this manager
    pub fn registry(&self) -> Arc<AvdRegistry> {
        Arc::clone(&self.registry)
    }

    /// Create a new AVD.
    ///
    /// Returns `Ok(false)` when `avdmanager` ran but reported failure;
    /// only tool absence, an invalid name, or I/O faults are errors.
    pub async fn create_avd(
        &self,
        name: &str,
        api_level: &str,
        device_type: &str,
    ) -> Result<bool, EmulatorError> {
        if !avd::is_valid_avd_name(name) {
            return Err(EmulatorError::InvalidAvdName(name.to_string()));
        }

        info!(
            "Creating AVD: name={}, api={}, device={}",
            name, api_level, device_type
        );

        let avdmanager = self.avdmanager_path();
        if !avdmanager.exists() {
            return Err(EmulatorError::AvdManagerNotFound(self.sdk_root.clone()));
        }

        let system_image = format!(
            "system-images;android-{};{};{}",
            api_level, DEFAULT_SYSTEM_IMAGE_TAG, DEFAULT_SYSTEM_IMAGE_ABI
        );

        let spec = self
            .tool_spec(&avdmanager)
            .args([
                "create",
                "avd",
                "-n",
                name,
                "-k",
                system_image.as_str(),
                "-d",
                device_type,
            ])
            .timeout(self.create_timeout)
            // Decline the custom hardware profile prompt
            .stdin_script(StdinScript::AnswerOnce("no".to_string()));

        let result = process::execute(&spec).await?;

        if result.success() {
            info!("AVD created successfully: {}", name);
            Ok(true)
        } else {
            error!("Failed to create AVD: {}", name);
            error!("Errors: {:?}", result.stderr);
            Ok(false)
        }
    }

    /// List all available AVDs.
    ///
    /// Best-effort: an unset SDK path or a missing `avdmanager` yields an
    /// empty list, never an error.
    pub async fn list_avds(&self) -> Result<Vec<AvdRecord>, EmulatorError> {
        debug!("Listing available AVDs");

        if self.sdk_root.as_os_str().is_empty() {
            debug!("SDK path not configured, returning empty AVD list");
            return Ok(Vec::new());
        }

        let avdmanager = self.avdmanager_path();
        if !avdmanager.exists() {
            warn!("avdmanager not found, returning empty list");
            return Ok(Vec::new());
        }

        let spec = self
            .tool_spec(&avdmanager)
            .args(["list", "avd"])
            .timeout(self.list_timeout);

        let result = process::execute(&spec).await?;
        let avds = avd::parse_avd_list(&result.stdout);

        debug!("Found {} AVDs", avds.len());
        Ok(avds)
    }

    /// Start the emulator for an AVD.
    ///
    /// Idempotent: when the AVD is already running, the existing handle is
    /// returned and no second process is spawned. The launch does not wait
    /// for the emulator to boot.
    pub async fn start_emulator(&self, name: &str) -> Result<EmulatorHandle, EmulatorError> {
        info!("Starting emulator: {}", name);

        if let Some(existing) = self.registry.get(name) {
            warn!("Emulator {} is already running", name);
            return Ok(existing);
        }

        let emulator = self.emulator_path();
        if !emulator.exists() {
            return Err(EmulatorError::EmulatorNotFound(self.sdk_root.clone()));
        }

        let spec = self.tool_spec(&emulator).args(["-avd", name]);
        let child = process::spawn_detached(&spec)?;
        let handle = self.registry.register(name, child);

        info!("Emulator {} started (pid {:?})", name, handle.pid);
        Ok(handle)
    }

    /// Stop a running emulator.
    ///
    /// The entry is unregistered regardless of kill outcome; a no-op when
    /// nothing is running for that name.
    pub async fn stop_emulator(&self, name: &str) {
        info!("Stopping emulator: {}", name);

        match self.registry.unregister(name) {
            Some(mut child) => {
                if let Err(e) = process::kill(&mut child).await {
                    warn!("Failed to kill emulator {}: {}", name, e);
                }
                info!("Emulator {} stopped", name);
            }
            None => {
                warn!("No running emulator found for: {}", name);
            }
        }
    }

    /// Stop every running emulator.
    pub async fn stop_all_emulators(&self) {
        info!("Stopping all running emulators");
        for name in self.registry.names() {
            self.stop_emulator(&name).await;
        }
    }

    /// Delete an AVD, stopping its emulator first so no orphaned process
    /// survives the delete.
    ///
    /// Returns `Ok(false)` when `avdmanager` ran but reported failure.
    pub async fn delete_avd(&self, name: &str) -> Result<bool, EmulatorError> {
        info!("Deleting AVD: {}", name);

        self.stop_emulator(name).await;

        let avdmanager = self.avdmanager_path();
        if !avdmanager.exists() {
            return Err(EmulatorError::AvdManagerNotFound(self.sdk_root.clone()));
        }

        let spec = self
            .tool_spec(&avdmanager)
            .args(["delete", "avd", "-n", name])
            .timeout(self.list_timeout);

        let result = process::execute(&spec).await?;

        if result.success() {
            info!("AVD deleted successfully: {}", name);
            Ok(true)
        } else {
            error!("Failed to delete AVD: {}", name);
            error!("Errors: {:?}", result.stderr);
            Ok(false)
        }
    }

    /// True when the AVD has a live emulator process.
    pub fn is_running(&self, name: &str) -> bool {
        self.registry.is_running(name)
    }

    /// Handles for all live emulator processes.
    pub fn running_emulators(&self) -> Vec<EmulatorHandle> {
        self.registry.all_running()
    }

    /// Base spec for an SDK tool invocation: SDK root as working
    /// directory, `ANDROID_HOME` and `ANDROID_SDK_ROOT` merged over the
    /// inherited environment.
    fn tool_spec(&self, program: &std::path::Path) -> ExecutionSpec {
        let sdk = self.sdk_root.display().to_string();
        ExecutionSpec::new(program)
            .current_dir(&self.sdk_root)
            .env("ANDROID_HOME", &sdk)
            .env("ANDROID_SDK_ROOT", &sdk)
    }

    /// Path to `avdmanager` under the SDK's command-line tools
    fn avdmanager_path(&self) -> PathBuf {
        let bin = self
            .sdk_root
            .join("cmdline-tools")
            .join("latest")
            .join("bin");
        if cfg!(windows) {
            bin.join("avdmanager.bat")
        } else {
            bin.join("avdmanager")
        }
    }

    /// Path to the emulator binary
    fn emulator_path(&self) -> PathBuf {
        let dir = self.sdk_root.join("emulator");
        if cfg!(windows) {
            dir.join("emulator.exe")
        } else {
            dir.join("emulator")
        }
    }
}
