use crate::factory::HttpSettings;
use crate::{Result, SyncError};
use crmsync_core::RawContact;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const BODY_SNIPPET_CHARS: usize = 200;

pub(crate) fn build_client(settings: &HttpSettings, secure: bool) -> Result<Client> {
    Client::builder()
        .user_agent(settings.user_agent.as_deref().unwrap_or("crmsync"))
        .timeout(settings.timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .danger_accept_invalid_certs(!secure)
        .build()
        .map_err(|err| SyncError::Unavailable(format!("failed to build http client: {err}")))
}

/// Sends `request` and decodes a JSON body. 401/403 map to `Auth`, every
/// other failure to `Upstream`. An empty success body decodes as `null`.
pub(crate) fn send_json(
    service: &str,
    step: &'static str,
    request: RequestBuilder,
) -> Result<Value> {
    send_json_as(service, step, request, rejected_credentials)
}

pub(crate) fn rejected_credentials(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Like [`send_json`], with the caller deciding which failure statuses mean
/// the credentials were rejected.
pub(crate) fn send_json_as(
    service: &str,
    step: &'static str,
    request: RequestBuilder,
    is_auth_failure: fn(StatusCode) -> bool,
) -> Result<Value> {
    let response = request
        .header(ACCEPT, "application/json")
        .send()
        .map_err(|err| SyncError::upstream(service, step, err))?;
    let status = response.status();
    let body = response
        .text()
        .map_err(|err| SyncError::upstream(service, step, err))?;

    if !status.is_success() {
        let message = describe(status, &body);
        if is_auth_failure(status) {
            return Err(SyncError::auth(service, step, message));
        }
        return Err(SyncError::upstream(service, step, message));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body)
        .map_err(|err| SyncError::upstream(service, step, format!("invalid json body: {err}")))
}

fn describe(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("HTTP {status}");
    }
    let snippet: String = trimmed.chars().take(BODY_SNIPPET_CHARS).collect();
    format!("HTTP {status}: {snippet}")
}

pub(crate) fn contacts_from(records: &[Value]) -> Vec<RawContact> {
    records.iter().map(RawContact::from_json).collect()
}

/// Ids arrive as strings from some services and numbers from others.
pub(crate) fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub(crate) fn json_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
