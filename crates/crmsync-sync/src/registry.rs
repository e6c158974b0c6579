use crate::credentials::{self, PlatformConfig, PlatformParams};
use crate::source::ContactSource;
use crate::Result;
use crmsync_core::Platform;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub type AdapterHandle = Arc<dyn ContactSource>;

/// Turns a validated platform configuration into a live adapter.
pub trait SourceFactory: Send + Sync {
    fn build(&self, config: PlatformConfig) -> Result<AdapterHandle>;
}

/// Holds at most one configured adapter per platform.
///
/// Calls for different platforms never interfere. Two `configure` calls racing
/// on the same platform both succeed and whichever insert lands second is the
/// one kept; nothing is merged.
pub struct AdapterRegistry {
    factory: Box<dyn SourceFactory>,
    sources: RwLock<HashMap<Platform, AdapterHandle>>,
}

impl AdapterRegistry {
    pub fn new(factory: impl SourceFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            sources: RwLock::new(HashMap::new()),
        }
    }

    pub fn configure(&self, platform_id: &str, params: &PlatformParams) -> Result<AdapterHandle> {
        let platform = Platform::parse(platform_id)?;
        let config = credentials::validate(platform, params)?;
        let source = self.factory.build(config)?;
        let replaced = self
            .sources
            .write()
            .insert(platform, Arc::clone(&source))
            .is_some();
        debug!(platform = %platform, replaced, "platform configured");
        Ok(source)
    }

    /// Never fails: unknown ids and unconfigured platforms are both absent.
    pub fn get(&self, platform_id: &str) -> Option<AdapterHandle> {
        let platform = Platform::parse(platform_id).ok()?;
        self.lookup(platform)
    }

    pub fn lookup(&self, platform: Platform) -> Option<AdapterHandle> {
        self.sources.read().get(&platform).cloned()
    }

    pub fn configured(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.sources.read().keys().copied().collect();
        platforms.sort();
        platforms
    }
}
