//! Android Emulator Bridge
//!
//! Manages Android Virtual Devices (AVDs) and their emulator processes.

pub mod avd;
pub mod emulator;
pub mod registry;

pub use avd::{
    android_version_name, api_level_from_target, format_device_name, is_valid_avd_name,
    parse_avd_list, AvdRecord,
};
pub use emulator::{EmulatorError, EmulatorManager};
pub use registry::{AvdRegistry, EmulatorHandle};

/// System image tag used for new AVDs
pub const DEFAULT_SYSTEM_IMAGE_TAG: &str = "google_apis";

/// System image ABI used for new AVDs
pub const DEFAULT_SYSTEM_IMAGE_ABI: &str = "x86_64";
