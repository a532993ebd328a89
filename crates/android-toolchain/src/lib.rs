//! Android Toolchain Management
//!
//! Installs and inspects Android SDK components by driving the SDK's
//! `sdkmanager` tool.

pub mod components;
pub mod installer;

pub use components::{default_components, SdkComponent};
pub use installer::{ComponentStatus, InstallerError, ProgressSink, SdkInstaller};

/// API levels covered by the stock component set
pub const SUPPORTED_API_LEVELS: &[u32] = &[30, 31, 32, 33, 34, 35, 36];

/// Build-tools release installed by default
pub const DEFAULT_BUILD_TOOLS_VERSION: &str = "35.0.0";
