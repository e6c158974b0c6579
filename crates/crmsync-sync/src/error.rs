use crmsync_core::{CoreError, Platform};
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("invalid configuration for {platform}: {reason}")]
    InvalidConfiguration { platform: Platform, reason: String },
    #[error("platform {0} is not configured")]
    NotConfigured(Platform),
    #[error("{service}: {step}: authentication failed: {message}")]
    Auth {
        service: String,
        step: &'static str,
        message: String,
    },
    #[error("{service}: {step}: {message}")]
    Upstream {
        service: String,
        step: &'static str,
        message: String,
    },
    #[error("{0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorKind {
    UnsupportedPlatform,
    InvalidConfiguration,
    NotConfigured,
    Auth,
    Upstream,
    Configuration,
    Unavailable,
}

impl SyncError {
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            SyncError::Core(CoreError::UnsupportedPlatform { .. }) => {
                SyncErrorKind::UnsupportedPlatform
            }
            SyncError::Core(CoreError::EmptyRuleSet | CoreError::InvalidRule(_)) => {
                SyncErrorKind::Configuration
            }
            SyncError::InvalidConfiguration { .. } => SyncErrorKind::InvalidConfiguration,
            SyncError::NotConfigured(_) => SyncErrorKind::NotConfigured,
            SyncError::Auth { .. } => SyncErrorKind::Auth,
            SyncError::Upstream { .. } => SyncErrorKind::Upstream,
            SyncError::Unavailable(_) => SyncErrorKind::Unavailable,
        }
    }

    pub fn invalid_configuration(platform: Platform, reason: impl Into<String>) -> Self {
        SyncError::InvalidConfiguration {
            platform,
            reason: reason.into(),
        }
    }

    pub fn auth(service: impl Display, step: &'static str, message: impl Display) -> Self {
        SyncError::Auth {
            service: service.to_string(),
            step,
            message: message.to_string(),
        }
    }

    pub fn upstream(service: impl Display, step: &'static str, message: impl Display) -> Self {
        SyncError::Upstream {
            service: service.to_string(),
            step,
            message: message.to_string(),
        }
    }
}
