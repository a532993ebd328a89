//! AVD Records
//!
//! Parsing of `avdmanager list avd` output plus the display helpers for
//! AVD and device names.

use std::path::PathBuf;

/// One Android Virtual Device, as reported by `avdmanager list avd`.
///
/// Ephemeral: recreated on every listing call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvdRecord {
    pub name: String,
    pub target: String,
    pub path: PathBuf,
}

/// Parse the stanza output of `avdmanager list avd`.
///
/// The tool emits repeating `Name:` / `Target:` / `Path:` groups; `Path:`
/// terminates a stanza. Stanzas without a name are dropped.
pub fn parse_avd_list<S: AsRef<str>>(lines: &[S]) -> Vec<AvdRecord> {
    let mut avds = Vec::new();
    let mut name: Option<String> = None;
    let mut target: Option<String> = None;

    for line in lines {
        let line = line.as_ref().trim();

        if let Some(value) = line.strip_prefix("Name:") {
            name = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Target:") {
            target = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Path:") {
            if let Some(name) = name.take() {
                avds.push(AvdRecord {
                    name,
                    target: target.take().unwrap_or_default(),
                    path: PathBuf::from(value.trim()),
                });
            }
            target = None;
        }
    }

    avds
}

/// Validate an AVD name: letters, digits, underscores and hyphens only,
/// no spaces, non-empty.
pub fn is_valid_avd_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Map an API level to its Android version name, e.g. `"35"` to
/// `"Android 15"`.
pub fn android_version_name(api_level: &str) -> String {
    match api_level {
        "36" => "Android 16".to_string(),
        "35" => "Android 15".to_string(),
        "34" => "Android 14".to_string(),
        "33" => "Android 13".to_string(),
        "32" => "Android 12L".to_string(),
        "31" => "Android 12".to_string(),
        "30" => "Android 11".to_string(),
        "29" => "Android 10".to_string(),
        "28" => "Android 9".to_string(),
        "27" => "Android 8.1".to_string(),
        "26" => "Android 8.0".to_string(),
        "25" => "Android 7.1".to_string(),
        "24" => "Android 7.0".to_string(),
        "23" => "Android 6.0".to_string(),
        "22" => "Android 5.1".to_string(),
        "21" => "Android 5.0".to_string(),
        other => format!("Android API {}", other),
    }
}

/// Extract the API level from a target descriptor such as
/// `"Android 14 (API level 34)"`. Falls back to the first bare number.
pub fn api_level_from_target(target: &str) -> Option<String> {
    if let Some(start) = target.find("API level") {
        let rest = &target[start + "API level".len()..];
        let end = rest.find(')').unwrap_or(rest.len());
        let level = rest[..end].trim();
        if !level.is_empty() {
            return Some(level.to_string());
        }
    }

    target
        .split_whitespace()
        .find(|part| part.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

/// Format a device identifier for display, e.g. `"pixel_7"` to
/// `"Pixel 7"`.
pub fn format_device_name(device: &str) -> String {
    device
        .split(['_', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
