use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source platforms a sync pass can pull contacts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    ActEssential,
    Freshdesk,
    #[serde(rename = "salesforcecrm")]
    SalesforceCrm,
    Solve360,
    #[serde(rename = "tactilecrm")]
    TactileCrm,
}

pub const SUPPORTED_PLATFORMS: [Platform; 5] = [
    Platform::ActEssential,
    Platform::Freshdesk,
    Platform::SalesforceCrm,
    Platform::Solve360,
    Platform::TactileCrm,
];

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::ActEssential => "actessential",
            Platform::Freshdesk => "freshdesk",
            Platform::SalesforceCrm => "salesforcecrm",
            Platform::Solve360 => "solve360",
            Platform::TactileCrm => "tactilecrm",
        }
    }

    /// Validates a caller-supplied platform id. Matching is exact, so
    /// `"Freshdesk"` is rejected the same way `"bogus"` is.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        SUPPORTED_PLATFORMS
            .iter()
            .copied()
            .find(|platform| platform.as_str() == raw)
            .ok_or_else(|| CoreError::UnsupportedPlatform {
                given: raw.to_string(),
                supported: supported_platform_names(),
            })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::parse(s)
    }
}

pub fn is_supported(raw: &str) -> bool {
    Platform::parse(raw).is_ok()
}

pub fn supported_platform_names() -> String {
    SUPPORTED_PLATFORMS
        .iter()
        .map(Platform::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
