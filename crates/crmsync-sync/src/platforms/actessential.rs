use super::{unexpected_credentials, FETCH};
use crate::credentials::{ApiKeyCredentials, PlatformConfig, PlatformCredentials};
use crate::factory::HttpSettings;
use crate::http::{build_client, contacts_from, send_json};
use crate::source::ContactSource;
use crate::{Result, SyncError};
use crmsync_core::{Platform, RawContact};
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

const PAGE_SIZE: usize = 100;

/// Act! Essentials, authenticated with the API key / developer key pair.
pub struct ActEssentialSource {
    endpoint: String,
    api_key: String,
    dev_key: String,
    client: Client,
}

impl ActEssentialSource {
    pub fn new(config: PlatformConfig, settings: &HttpSettings) -> Result<Self> {
        let PlatformCredentials::ApiKey(ApiKeyCredentials {
            api_key,
            secret: Some(dev_key),
        }) = config.credentials
        else {
            return Err(unexpected_credentials(Platform::ActEssential));
        };
        Ok(Self {
            client: build_client(settings, config.secure)?,
            endpoint: config.endpoint,
            api_key,
            dev_key,
        })
    }
}

impl ContactSource for ActEssentialSource {
    fn platform(&self) -> Platform {
        Platform::ActEssential
    }

    fn fetch_all_contacts(&self) -> Result<Vec<RawContact>> {
        let url = format!("{}/api/contacts", self.endpoint);
        let mut contacts = Vec::new();
        let mut skip = 0usize;
        loop {
            let request = self
                .client
                .get(&url)
                .basic_auth(&self.api_key, Some(&self.dev_key))
                .query(&[("$top", PAGE_SIZE), ("$skip", skip)]);
            let body = send_json(self.platform().as_str(), FETCH, request)?;
            let records = page_records(&body).ok_or_else(|| {
                SyncError::upstream(self.platform(), FETCH, "response is not a contact list")
            })?;
            debug!(skip, count = records.len(), "act! essentials page");
            contacts.extend(contacts_from(records));
            if records.len() < PAGE_SIZE {
                break;
            }
            skip += records.len();
        }
        Ok(contacts)
    }
}

/// Pages come back either as a bare array or wrapped OData-style in `value`.
fn page_records(body: &Value) -> Option<&[Value]> {
    match body {
        Value::Array(items) => Some(items.as_slice()),
        Value::Object(map) => map.get("value").and_then(Value::as_array).map(Vec::as_slice),
        Value::Null => Some(&[][..]),
        _ => None,
    }
}
