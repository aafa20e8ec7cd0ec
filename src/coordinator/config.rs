//! Coordinator configuration

use serde::{Deserialize, Serialize};

/// First platform level with the runtime permission model
pub const RUNTIME_PERMISSIONS_LEVEL: u32 = 23;

/// Platform API level the coordinator runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformVersion(pub u32);

impl PlatformVersion {
    pub fn new(level: u32) -> Self {
        Self(level)
    }

    pub fn level(&self) -> u32 {
        self.0
    }

    /// Whether permissions are granted at runtime rather than at install time
    pub fn supports_runtime_grants(&self) -> bool {
        self.0 >= RUNTIME_PERMISSIONS_LEVEL
    }
}

impl Default for PlatformVersion {
    fn default() -> Self {
        Self(RUNTIME_PERMISSIONS_LEVEL)
    }
}

/// Settings for a `RequestCoordinator`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Platform level, decides which grant oracle is used
    pub platform: PlatformVersion,
    /// Emit per-permission debug traces
    pub logging: bool,
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the platform level
    pub fn with_platform(mut self, platform: PlatformVersion) -> Self {
        self.platform = platform;
        self
    }

    /// Enable or disable per-permission debug traces
    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    /// Load a configuration from JSON, missing fields take their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
