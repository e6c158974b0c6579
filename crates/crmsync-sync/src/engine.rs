use crate::credentials::PlatformParams;
use crate::destination::ContactListService;
use crate::registry::AdapterRegistry;
use crate::{Result, SyncError};
use crmsync_core::{Normalizer, Platform, SyncList, SyncReceipt, SUPPORTED_PLATFORMS};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs one-way sync passes: fetch, normalize, resolve the destination list,
/// submit.
pub struct SyncEngine {
    registry: AdapterRegistry,
    normalizer: Normalizer,
    destination: Box<dyn ContactListService>,
    list_guards: Mutex<HashMap<Platform, Arc<Mutex<()>>>>,
}

impl SyncEngine {
    pub fn new(
        registry: AdapterRegistry,
        normalizer: Normalizer,
        destination: impl ContactListService + 'static,
    ) -> Self {
        Self {
            registry,
            normalizer,
            destination: Box::new(destination),
            list_guards: Mutex::new(HashMap::new()),
        }
    }

    pub fn supported_platforms() -> &'static [Platform] {
        &SUPPORTED_PLATFORMS
    }

    pub fn is_supported(platform_id: &str) -> bool {
        crmsync_core::is_supported(platform_id)
    }

    pub fn configure_platform(&self, platform_id: &str, params: &PlatformParams) -> Result<()> {
        self.registry.configure(platform_id, params).map(|_| ())
    }

    pub fn sync_from(&self, platform_id: &str) -> Result<SyncReceipt> {
        let platform = Platform::parse(platform_id)?;
        let source = self
            .registry
            .lookup(platform)
            .ok_or(SyncError::NotConfigured(platform))?;

        let contacts = source.fetch_all_contacts()?;
        let normalized = self.normalizer.normalize(&contacts)?;
        let list = self.resolve_list(platform)?;
        let receipt = self
            .destination
            .submit_contact_batch(&normalized, None, &list.id)?;

        info!(
            platform = %platform,
            list_id = %list.id,
            contacts = normalized.len(),
            "sync pass submitted"
        );
        Ok(receipt)
    }

    /// Syncs every configured platform in platform order. A failing platform
    /// does not stop the others.
    pub fn sync_all(&self) -> Vec<(Platform, Result<SyncReceipt>)> {
        self.registry
            .configured()
            .into_iter()
            .map(|platform| (platform, self.sync_from(platform.as_str())))
            .collect()
    }

    /// Find-or-create is serialised per platform inside this process only;
    /// two processes syncing a new platform at once can still both create a
    /// list with the same name.
    fn resolve_list(&self, platform: Platform) -> Result<SyncList> {
        let guard = Arc::clone(self.list_guards.lock().entry(platform).or_default());
        let _held = guard.lock();

        let name = platform.as_str();
        if let Some(list) = self.destination.find_list_by_name(name)? {
            debug!(platform = %platform, list_id = %list.id, "destination list found");
            return Ok(list);
        }
        let list = self.destination.create_list(name)?;
        info!(platform = %platform, list_id = %list.id, "destination list created");
        Ok(list)
    }
}
