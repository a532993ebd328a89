//! SDK Installer
//!
//! Drives `sdkmanager` to accept licenses and install SDK components
//! sequentially, reporting incremental progress. Batches are best-effort:
//! one failing component never aborts the rest.

use std::path::PathBuf;
use std::time::Duration;

use droidctl_core::process::{
    self, ExecutionResult, ExecutionSpec, OutputEvent, ProcessError, StdinScript,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Installer errors
#[derive(Debug, thiserror::Error)]
pub enum InstallerError {
    #[error("sdkmanager not found in SDK: {0}")]
    SdkManagerNotFound(PathBuf),
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),
}

/// Progress callback: percentage 0-100 plus a status message
pub type ProgressSink = Box<dyn Fn(u8, &str) + Send + Sync>;

/// Outcome of one component install within a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentStatus {
    pub component: String,
    pub success: bool,
}

/// Installs SDK components into one SDK root via sdkmanager.
pub struct SdkInstaller {
    sdk_root: PathBuf,
    component_timeout: Duration,
    license_answer_limit: usize,
}

impl SdkInstaller {
    pub fn new(sdk_root: impl Into<PathBuf>) -> Self {
        Self {
            sdk_root: sdk_root.into(),
            component_timeout: Duration::from_secs(30 * 60),
            license_answer_limit: 20,
        }
    }

    /// Override the per-component timeout
    pub fn with_component_timeout(mut self, timeout: Duration) -> Self {
        self.component_timeout = timeout;
        self
    }

    /// Override the license answer upper bound
    pub fn with_license_answer_limit(mut self, limit: usize) -> Self {
        self.license_answer_limit = limit;
        self
    }

    /// Install the given components in order, reporting progress after
    /// each step.
    ///
    /// Fails fast when `sdkmanager` is absent; afterwards each component
    /// succeeds or fails independently and the batch always runs to the
    /// end, with per-component outcomes collected in the result.
    pub async fn install_components(
        &self,
        components: &[String],
        progress: Option<ProgressSink>,
    ) -> Result<Vec<ComponentStatus>, InstallerError> {
        let sdkmanager = self.sdkmanager_path();
        if !sdkmanager.exists() {
            return Err(InstallerError::SdkManagerNotFound(self.sdk_root.clone()));
        }

        info!("Installing {} SDK component(s)", components.len());
        report(&progress, 5, "Accepting SDK licenses...");

        if let Err(e) = self.accept_licenses().await {
            warn!("License acceptance failed, continuing anyway: {}", e);
        }

        let mut statuses = Vec::with_capacity(components.len());
        for (index, component) in components.iter().enumerate() {
            info!("Installing component: {}", component);
            report(
                &progress,
                interpolate(index, components.len()),
                &format!("Installing {}...", component),
            );

            let success = match self.run_sdkmanager(&[component.as_str()]).await {
                Ok(result) => {
                    if result.success() {
                        info!("Successfully installed: {}", component);
                    } else {
                        error!("Failed to install component: {}", component);
                        error!("Errors: {:?}", result.stderr);
                    }
                    result.success()
                }
                Err(e) => {
                    error!("Failed to install component {}: {}", component, e);
                    false
                }
            };

            statuses.push(ComponentStatus {
                component: component.clone(),
                success,
            });
        }

        report(&progress, 100, "SDK component installation completed");
        info!("SDK components installation completed");
        Ok(statuses)
    }

    /// Install a single component on demand.
    ///
    /// Returns `Ok(false)` when sdkmanager ran but reported failure.
    pub async fn install_component(&self, component: &str) -> Result<bool, InstallerError> {
        let sdkmanager = self.sdkmanager_path();
        if !sdkmanager.exists() {
            return Err(InstallerError::SdkManagerNotFound(self.sdk_root.clone()));
        }

        info!("Installing single component: {}", component);
        let result = self.run_sdkmanager(&[component]).await?;

        if result.success() {
            info!("Successfully installed: {}", component);
            Ok(true)
        } else {
            error!("Failed to install component: {}", component);
            error!("Errors: {:?}", result.stderr);
            Ok(false)
        }
    }

    /// Accept SDK licenses non-interactively by answering "y" up to the
    /// configured limit; writing stops early once the tool stops reading.
    ///
    /// A non-zero exit is logged, not fatal: some environments pre-accept
    /// licenses.
    pub async fn accept_licenses(&self) -> Result<(), InstallerError> {
        info!("Accepting SDK licenses...");

        let spec = self
            .tool_spec()
            .arg("--licenses")
            .stdin_script(StdinScript::RepeatLine {
                line: "y".to_string(),
                times: self.license_answer_limit,
            });

        let result = process::execute(&spec).await?;
        if !result.success() {
            warn!("License acceptance may have failed: {:?}", result.stderr);
        } else {
            info!("Licenses accepted");
        }

        Ok(())
    }

    /// Check whether an API level is fully installed: both the platform
    /// and its google_apis x86_64 system image are present.
    pub fn is_api_level_installed(&self, api_level: &str) -> bool {
        let platform = self
            .sdk_root
            .join("platforms")
            .join(format!("android-{}", api_level));
        let system_image = self
            .sdk_root
            .join("system-images")
            .join(format!("android-{}", api_level))
            .join("google_apis")
            .join("x86_64");

        let platform_exists = platform.exists();
        let image_exists = system_image.exists();
        debug!(
            "API {} - Platform: {}, System Image: {}",
            api_level, platform_exists, image_exists
        );

        platform_exists && image_exists
    }

    /// True when `sdkmanager` is present at its canonical location
    pub fn is_available(&self) -> bool {
        self.sdkmanager_path().exists()
    }

    /// Run sdkmanager with the given args, streaming its output to the
    /// debug log as it arrives.
    async fn run_sdkmanager(&self, args: &[&str]) -> Result<ExecutionResult, ProcessError> {
        let spec = self.tool_spec().args(args.iter().copied());

        let (tx, mut rx) = mpsc::channel(64);
        let logger = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    OutputEvent::Stdout(line) => debug!("sdkmanager: {}", line),
                    OutputEvent::Stderr(line) => debug!("sdkmanager! {}", line),
                }
            }
        });

        let result = process::execute_streaming(&spec, tx).await;
        let _ = logger.await;
        result
    }

    /// Base spec for an sdkmanager invocation: SDK root as working
    /// directory, `ANDROID_HOME` and `ANDROID_SDK_ROOT` merged over the
    /// inherited environment.
    fn tool_spec(&self) -> ExecutionSpec {
        let sdk = self.sdk_root.display().to_string();
        ExecutionSpec::new(self.sdkmanager_path())
            .current_dir(&self.sdk_root)
            .env("ANDROID_HOME", &sdk)
            .env("ANDROID_SDK_ROOT", &sdk)
            .timeout(self.component_timeout)
    }

    /// Path to `sdkmanager` under the SDK's command-line tools
    fn sdkmanager_path(&self) -> PathBuf {
        let bin = self
            .sdk_root
            .join("cmdline-tools")
            .join("latest")
            .join("bin");
        if cfg!(windows) {
            bin.join("sdkmanager.bat")
        } else {
            bin.join("sdkmanager")
        }
    }
}

/// Percentage for the step starting at `index` of `total`, interpolated
/// across the 5-100 range left after license acceptance.
fn interpolate(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (5 + index * 95 / total) as u8
}

fn report(progress: &Option<ProgressSink>, percent: u8, message: &str) {
    if let Some(callback) = progress {
        callback(percent, message);
    }
}
