#![allow(dead_code)]

use crmsync_core::{NormalizedContact, Platform, RawContact, SyncList, SyncReceipt};
use crmsync_sync::{
    AdapterHandle, ContactListService, ContactSource, PlatformConfig, PlatformParams, Result,
    SourceFactory, SyncError,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

pub fn params(pairs: &[(&str, &str)]) -> PlatformParams {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn freshdesk_params(api_key: &str) -> PlatformParams {
    params(&[("domain", "acme.freshdesk.com"), ("api_key", api_key)])
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Auth,
    Upstream,
}

/// Builds sources that hand back canned contacts and remember the
/// configuration each fetch ran with.
#[derive(Clone, Default)]
pub struct MockFactory {
    pub built: Arc<Mutex<Vec<PlatformConfig>>>,
    pub fetched: Arc<Mutex<Vec<PlatformConfig>>>,
    contacts: Arc<Vec<RawContact>>,
    failures: Arc<HashMap<Platform, Failure>>,
}

impl MockFactory {
    pub fn with_contacts(contacts: Vec<RawContact>) -> Self {
        Self {
            contacts: Arc::new(contacts),
            ..Self::default()
        }
    }

    pub fn failing(platform: Platform, failure: Failure) -> Self {
        Self {
            failures: Arc::new(HashMap::from([(platform, failure)])),
            ..Self::default()
        }
    }
}

impl SourceFactory for MockFactory {
    fn build(&self, config: PlatformConfig) -> Result<AdapterHandle> {
        self.built.lock().push(config.clone());
        Ok(Arc::new(MockSource {
            failure: self.failures.get(&config.platform).copied(),
            config,
            contacts: Arc::clone(&self.contacts),
            fetched: Arc::clone(&self.fetched),
        }))
    }
}

pub struct MockSource {
    config: PlatformConfig,
    contacts: Arc<Vec<RawContact>>,
    failure: Option<Failure>,
    fetched: Arc<Mutex<Vec<PlatformConfig>>>,
}

impl ContactSource for MockSource {
    fn platform(&self) -> Platform {
        self.config.platform
    }

    fn fetch_all_contacts(&self) -> Result<Vec<RawContact>> {
        self.fetched.lock().push(self.config.clone());
        match self.failure {
            Some(Failure::Auth) => Err(SyncError::auth(
                self.config.platform,
                "fetch contacts",
                "HTTP 401 Unauthorized",
            )),
            Some(Failure::Upstream) => Err(SyncError::upstream(
                self.config.platform,
                "fetch contacts",
                "HTTP 502 Bad Gateway",
            )),
            None => Ok(self.contacts.as_ref().clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Batch {
    pub contacts: Vec<NormalizedContact>,
    pub merge_field_id: Option<String>,
    pub list_id: String,
}

/// In-memory destination; receipts echo the batch size and list id.
#[derive(Clone, Default)]
pub struct MockDestination {
    pub lists: Arc<Mutex<Vec<SyncList>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub batches: Arc<Mutex<Vec<Batch>>>,
}

impl MockDestination {
    pub fn with_list(id: &str, name: &str) -> Self {
        let destination = Self::default();
        destination.lists.lock().push(SyncList {
            id: id.to_string(),
            name: name.to_string(),
        });
        destination
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl ContactListService for MockDestination {
    fn find_list_by_name(&self, name: &str) -> Result<Option<SyncList>> {
        self.calls.lock().push(format!("find {name}"));
        Ok(self
            .lists
            .lock()
            .iter()
            .find(|list| list.name == name)
            .cloned())
    }

    fn create_list(&self, name: &str) -> Result<SyncList> {
        self.calls.lock().push(format!("create {name}"));
        let mut lists = self.lists.lock();
        let list = SyncList {
            id: format!("list-{}", lists.len() + 1),
            name: name.to_string(),
        };
        lists.push(list.clone());
        Ok(list)
    }

    fn submit_contact_batch(
        &self,
        contacts: &[NormalizedContact],
        merge_field_id: Option<&str>,
        list_id: &str,
    ) -> Result<SyncReceipt> {
        self.calls.lock().push(format!("submit {list_id}"));
        self.batches.lock().push(Batch {
            contacts: contacts.to_vec(),
            merge_field_id: merge_field_id.map(str::to_string),
            list_id: list_id.to_string(),
        });
        Ok(SyncReceipt::new(json!({
            "submitted": contacts.len(),
            "list": list_id,
        })))
    }
}
