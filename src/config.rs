use crate::filter::{self, ActiveEnvironment};
use crate::vendor::DEFAULT_VENDOR_NAME;

/// Environment variable that overrides the vendor directory name.
pub const VENDOR_NAME_ENV: &str = "GOM_VENDOR_NAME";

/// Settings for one invocation, passed explicitly to every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Vendor directory, relative to the directory holding the Gomfile
    pub vendor_name: String,
    /// Environment groups this run is active for
    pub environment: ActiveEnvironment,
    /// Target platform in `GOOS` spelling
    pub platform: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vendor_name: DEFAULT_VENDOR_NAME.to_string(),
            environment: ActiveEnvironment::default(),
            platform: filter::current_platform().to_string(),
        }
    }
}

impl Config {
    pub fn new(vendor_name: Option<String>, environment: ActiveEnvironment) -> Self {
        Self {
            vendor_name: vendor_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_VENDOR_NAME.to_string()),
            environment,
            ..Self::default()
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }
}
