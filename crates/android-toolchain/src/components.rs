//! SDK Components
//!
//! Typed builders for sdkmanager package identifiers and the stock
//! component set for a fresh installation.

/// SDK component types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkComponent {
    /// platforms;android-XX
    Platform(u32),
    /// system-images;android-XX;tag;abi
    SystemImage {
        api: u32,
        tag: String,
        abi: String,
    },
    /// platform-tools
    PlatformTools,
    /// build-tools;XX.X.X
    BuildTools(String),
    /// emulator
    Emulator,
}

impl SdkComponent {
    /// Default google_apis/x86_64 system image for an API level
    pub fn google_apis_image(api: u32) -> Self {
        SdkComponent::SystemImage {
            api,
            tag: "google_apis".to_string(),
            abi: "x86_64".to_string(),
        }
    }

    /// The sdkmanager package identifier
    pub fn package_name(&self) -> String {
        match self {
            SdkComponent::Platform(api) => format!("platforms;android-{}", api),
            SdkComponent::SystemImage { api, tag, abi } => {
                format!("system-images;android-{};{};{}", api, tag, abi)
            }
            SdkComponent::PlatformTools => "platform-tools".to_string(),
            SdkComponent::BuildTools(version) => format!("build-tools;{}", version),
            SdkComponent::Emulator => "emulator".to_string(),
        }
    }
}

/// The stock component set for a fresh SDK: platform-tools, platforms and
/// google_apis/x86_64 system images for every supported API level, the
/// emulator, and one build-tools release.
pub fn default_components() -> Vec<String> {
    let mut components = vec![SdkComponent::PlatformTools.package_name()];

    components.extend(
        crate::SUPPORTED_API_LEVELS
            .iter()
            .map(|&api| SdkComponent::Platform(api).package_name()),
    );
    components.extend(
        crate::SUPPORTED_API_LEVELS
            .iter()
            .map(|&api| SdkComponent::google_apis_image(api).package_name()),
    );

    components.push(SdkComponent::Emulator.package_name());
    components.push(
        SdkComponent::BuildTools(crate::DEFAULT_BUILD_TOOLS_VERSION.to_string()).package_name(),
    );

    components
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_package_name() {
        assert_eq!(
            SdkComponent::Platform(34).package_name(),
            "platforms;android-34"
        );
        assert_eq!(
            SdkComponent::BuildTools("35.0.0".into()).package_name(),
            "build-tools;35.0.0"
        );
        assert_eq!(
            SdkComponent::google_apis_image(34).package_name(),
            "system-images;android-34;google_apis;x86_64"
        );
    }

    #[test]
    fn test_default_components() {
        let components = default_components();

        assert_eq!(components.first().map(String::as_str), Some("platform-tools"));
        assert_eq!(
            components.last().map(String::as_str),
            Some("build-tools;35.0.0")
        );
        assert!(components.contains(&"platforms;android-36".to_string()));
        assert!(components.contains(&"system-images;android-30;google_apis;x86_64".to_string()));
        // platform-tools + 7 platforms + 7 images + emulator + build-tools
        assert_eq!(components.len(), 17);
    }
}
