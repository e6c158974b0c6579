use crate::credentials::PlatformConfig;
use crate::registry::{AdapterHandle, SourceFactory};
use crate::Result;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-request deadline and identification shared by every HTTP client.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }
}

/// Builds the HTTP-backed adapter matching each configured platform.
#[derive(Debug, Clone, Default)]
pub struct HttpSourceFactory {
    settings: HttpSettings,
}

impl HttpSourceFactory {
    pub fn new(settings: HttpSettings) -> Self {
        Self { settings }
    }
}

#[cfg(feature = "http")]
impl SourceFactory for HttpSourceFactory {
    fn build(&self, config: PlatformConfig) -> Result<AdapterHandle> {
        use crate::platforms::{
            ActEssentialSource, FreshdeskSource, SalesforceSource, Solve360Source, TactileSource,
        };
        use crmsync_core::Platform;
        use std::sync::Arc;

        let settings = &self.settings;
        let source: AdapterHandle = match config.platform {
            Platform::ActEssential => Arc::new(ActEssentialSource::new(config, settings)?),
            Platform::Freshdesk => Arc::new(FreshdeskSource::new(config, settings)?),
            Platform::SalesforceCrm => Arc::new(SalesforceSource::new(config, settings)?),
            Platform::Solve360 => Arc::new(Solve360Source::new(config, settings)?),
            Platform::TactileCrm => Arc::new(TactileSource::new(config, settings)?),
        };
        Ok(source)
    }
}

#[cfg(not(feature = "http"))]
impl SourceFactory for HttpSourceFactory {
    fn build(&self, config: PlatformConfig) -> Result<AdapterHandle> {
        let _ = &self.settings;
        Err(crate::SyncError::Unavailable(format!(
            "{} import requires the http feature",
            config.platform
        )))
    }
}
