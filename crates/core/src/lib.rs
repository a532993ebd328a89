//! droidctl Core
//!
//! Shared infrastructure for the droidctl crates: external process
//! execution and application configuration.

pub mod config;
pub mod process;

pub use config::{
    default_sdk_path, AppConfig, ConfigError, EmulatorTimeouts, InstallConfig, SdkConfig,
};
pub use process::{
    execute, execute_streaming, kill, spawn_detached, ExecutionResult, ExecutionSpec, OutputEvent,
    ProcessError, StdinScript, DEFAULT_TIMEOUT,
};
