use super::{unexpected_credentials, FETCH};
use crate::credentials::{
    authorization_url, PlatformConfig, PlatformCredentials, SalesforceOptions,
    SALESFORCE_API_VERSION, SALESFORCE_DEFAULT_FIELDS,
};
use crate::factory::HttpSettings;
use crate::http::{build_client, contacts_from, send_json, send_json_as};
use crate::source::ContactSource;
use crate::{Result, SyncError};
use crmsync_core::{Platform, RawContact};
use parking_lot::Mutex;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

const TOKEN: &str = "oauth token";
const SERVICE: &str = "salesforcecrm";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Session {
    access_token: String,
    instance_url: String,
}

/// Salesforce REST API. The access token is fetched on first use and kept
/// until Salesforce rejects it.
pub struct SalesforceSource {
    login_url: String,
    credentials: PlatformCredentials,
    options: SalesforceOptions,
    client: Client,
    session: Mutex<Option<Session>>,
}

impl SalesforceSource {
    pub fn new(config: PlatformConfig, settings: &HttpSettings) -> Result<Self> {
        if !matches!(
            config.credentials,
            PlatformCredentials::OAuthCode(_) | PlatformCredentials::OAuthPassword(_)
        ) {
            return Err(unexpected_credentials(Platform::SalesforceCrm));
        }
        let options = config.salesforce.unwrap_or_else(|| SalesforceOptions {
            fields: SALESFORCE_DEFAULT_FIELDS
                .iter()
                .map(|field| field.to_string())
                .collect(),
            api_version: SALESFORCE_API_VERSION.to_string(),
        });
        Ok(Self {
            client: build_client(settings, config.secure)?,
            login_url: config.endpoint,
            credentials: config.credentials,
            options,
            session: Mutex::new(None),
        })
    }

    fn session(&self) -> Result<Session> {
        let mut cached = self.session.lock();
        if let Some(session) = cached.as_ref() {
            return Ok(session.clone());
        }
        let session = self.request_token()?;
        *cached = Some(session.clone());
        Ok(session)
    }

    fn request_token(&self) -> Result<Session> {
        let form: Vec<(&str, String)> = match &self.credentials {
            PlatformCredentials::OAuthCode(creds) => {
                let Some(code) = &creds.code else {
                    let url =
                        authorization_url(&self.login_url, &creds.client_id, &creds.redirect_uri)?;
                    return Err(SyncError::auth(
                        SERVICE,
                        TOKEN,
                        format!("authorization code required; authorize at {url} and set code"),
                    ));
                };
                vec![
                    ("grant_type", "authorization_code".to_string()),
                    ("code", code.clone()),
                    ("client_id", creds.client_id.clone()),
                    ("client_secret", creds.client_secret.clone()),
                    ("redirect_uri", creds.redirect_uri.clone()),
                ]
            }
            PlatformCredentials::OAuthPassword(creds) => vec![
                ("grant_type", "password".to_string()),
                ("client_id", creds.client_id.clone()),
                ("client_secret", creds.client_secret.clone()),
                ("username", creds.username.clone()),
                (
                    "password",
                    format!(
                        "{}{}",
                        creds.password,
                        creds.security_token.as_deref().unwrap_or_default()
                    ),
                ),
            ],
            _ => return Err(unexpected_credentials(Platform::SalesforceCrm)),
        };

        let request = self
            .client
            .post(format!("{}/services/oauth2/token", self.login_url))
            .form(&form);
        // Rejected grants come back as 400 from the token endpoint.
        let body = send_json_as(SERVICE, TOKEN, request, |status| status.is_client_error())?;
        parse_token(&body)
    }
}

impl ContactSource for SalesforceSource {
    fn platform(&self) -> Platform {
        Platform::SalesforceCrm
    }

    fn fetch_all_contacts(&self) -> Result<Vec<RawContact>> {
        let session = self.session()?;
        let soql = format!("SELECT {} FROM Contact", self.options.fields.join(", "));
        let mut request = self
            .client
            .get(format!(
                "{}/services/data/{}/query",
                session.instance_url, self.options.api_version
            ))
            .query(&[("q", soql.as_str())]);

        let mut contacts = Vec::new();
        loop {
            let body = match send_json(SERVICE, FETCH, request.bearer_auth(&session.access_token)) {
                Err(err @ SyncError::Auth { .. }) => {
                    *self.session.lock() = None;
                    return Err(err);
                }
                other => other?,
            };
            let page = parse_query_page(&body)?;
            debug!(count = page.records.len(), more = page.next.is_some(), "salesforce page");
            contacts.extend(contacts_from(page.records));
            match page.next {
                Some(path) => {
                    request = self.client.get(format!("{}{}", session.instance_url, path));
                }
                None => break,
            }
        }
        Ok(contacts)
    }
}

fn parse_token(body: &Value) -> Result<Session> {
    let field = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_string);
    let detail = field("error_description")
        .map(|text| format!(": {text}"))
        .unwrap_or_default();
    let Some(access_token) = field("access_token") else {
        return Err(SyncError::auth(
            SERVICE,
            TOKEN,
            format!("failed to get access token{detail}"),
        ));
    };
    let Some(instance_url) = field("instance_url") else {
        return Err(SyncError::auth(
            SERVICE,
            TOKEN,
            format!("failed to get instance url{detail}"),
        ));
    };
    Ok(Session {
        access_token,
        instance_url: instance_url.trim_end_matches('/').to_string(),
    })
}

#[derive(Debug)]
struct QueryPage<'a> {
    records: &'a [Value],
    next: Option<&'a str>,
}

fn parse_query_page(body: &Value) -> Result<QueryPage<'_>> {
    let records = body
        .get("records")
        .and_then(Value::as_array)
        .ok_or_else(|| SyncError::upstream(SERVICE, FETCH, "records not found"))?;
    let done = body.get("done").and_then(Value::as_bool).unwrap_or(true);
    let next = if done {
        None
    } else {
        body.get("nextRecordsUrl").and_then(Value::as_str)
    };
    Ok(QueryPage { records, next })
}
