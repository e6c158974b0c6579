use super::{unexpected_credentials, FETCH};
use crate::credentials::{ApiKeyCredentials, LoginCredentials, PlatformConfig, PlatformCredentials};
use crate::factory::HttpSettings;
use crate::http::{build_client, contacts_from, send_json};
use crate::source::ContactSource;
use crate::{Result, SyncError};
use crmsync_core::{Platform, RawContact};
use reqwest::blocking::Client;
use tracing::debug;

const PER_PAGE: usize = 100;

#[derive(Debug, Clone)]
enum Auth {
    ApiKey(String),
    Login { login: String, password: String },
}

/// Freshdesk v2 contacts API.
pub struct FreshdeskSource {
    endpoint: String,
    auth: Auth,
    client: Client,
}

impl FreshdeskSource {
    pub fn new(config: PlatformConfig, settings: &HttpSettings) -> Result<Self> {
        let auth = match config.credentials {
            PlatformCredentials::ApiKey(ApiKeyCredentials { api_key, .. }) => Auth::ApiKey(api_key),
            PlatformCredentials::Login(LoginCredentials { login, password }) => {
                Auth::Login { login, password }
            }
            _ => return Err(unexpected_credentials(Platform::Freshdesk)),
        };
        Ok(Self {
            client: build_client(settings, config.secure)?,
            endpoint: config.endpoint,
            auth,
        })
    }
}

impl ContactSource for FreshdeskSource {
    fn platform(&self) -> Platform {
        Platform::Freshdesk
    }

    fn fetch_all_contacts(&self) -> Result<Vec<RawContact>> {
        let url = format!("{}/contacts", self.endpoint);
        let mut contacts = Vec::new();
        let mut page = 1usize;
        loop {
            let request = self
                .client
                .get(&url)
                .query(&[("page", page), ("per_page", PER_PAGE)]);
            // The API key goes in as the username with a throwaway password.
            let request = match &self.auth {
                Auth::ApiKey(api_key) => request.basic_auth(api_key, Some("X")),
                Auth::Login { login, password } => request.basic_auth(login, Some(password)),
            };
            let body = send_json(self.platform().as_str(), FETCH, request)?;
            let records = body.as_array().ok_or_else(|| {
                SyncError::upstream(self.platform(), FETCH, "response is not a contact list")
            })?;
            debug!(page, count = records.len(), "freshdesk page");
            contacts.extend(contacts_from(records));
            if records.len() < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(contacts)
    }
}
