use super::{unexpected_credentials, FETCH};
use crate::credentials::{LoginCredentials, PlatformConfig, PlatformCredentials};
use crate::factory::HttpSettings;
use crate::http::{build_client, json_id, send_json};
use crate::source::ContactSource;
use crate::{Result, SyncError};
use crmsync_core::{Platform, RawContact};
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

const SERVICE: &str = "solve360";
const LIST_LIMIT: usize = 500;

/// Solve360 contacts. The listing only carries ids, so each contact is read
/// individually for its full field set.
pub struct Solve360Source {
    endpoint: String,
    credentials: LoginCredentials,
    client: Client,
}

impl Solve360Source {
    pub fn new(config: PlatformConfig, settings: &HttpSettings) -> Result<Self> {
        let PlatformCredentials::Login(credentials) = config.credentials else {
            return Err(unexpected_credentials(Platform::Solve360));
        };
        Ok(Self {
            client: build_client(settings, config.secure)?,
            endpoint: config.endpoint,
            credentials,
        })
    }

    fn get(&self, path: &str) -> reqwest::blocking::RequestBuilder {
        self.client
            .get(format!("{}{}", self.endpoint, path))
            .basic_auth(&self.credentials.login, Some(&self.credentials.password))
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut start = 0usize;
        loop {
            let request = self
                .get("/contacts")
                .query(&[("limit", LIST_LIMIT), ("start", start)]);
            let body = send_json(SERVICE, FETCH, request)?;
            let page = listed_ids(&body)?;
            debug!(start, count = page.len(), "solve360 listing");
            let count = page.len();
            ids.extend(page);
            if count < LIST_LIMIT {
                break;
            }
            start += count;
        }
        Ok(ids)
    }
}

impl ContactSource for Solve360Source {
    fn platform(&self) -> Platform {
        Platform::Solve360
    }

    fn fetch_all_contacts(&self) -> Result<Vec<RawContact>> {
        let ids = self.list_ids()?;
        let mut contacts = Vec::with_capacity(ids.len());
        for id in ids {
            let body = send_json(SERVICE, FETCH, self.get(&format!("/contacts/{id}")))?;
            contacts.push(item_fields(&body)?);
        }
        Ok(contacts)
    }
}

fn check_status(body: &Value) -> Result<()> {
    if body.get("status").and_then(Value::as_str) == Some("failed") {
        let message = body
            .get("errors")
            .map(Value::to_string)
            .unwrap_or_else(|| "request failed".to_string());
        return Err(SyncError::upstream(SERVICE, FETCH, message));
    }
    Ok(())
}

/// The listing is an object mixing bookkeeping keys (`status`, `count`) with
/// one entry per contact keyed by its id.
fn listed_ids(body: &Value) -> Result<Vec<String>> {
    check_status(body)?;
    let Some(map) = body.as_object() else {
        return Err(SyncError::upstream(SERVICE, FETCH, "unexpected listing shape"));
    };
    Ok(map
        .values()
        .filter_map(|entry| entry.as_object()?.get("id").and_then(json_id))
        .collect())
}

fn item_fields(body: &Value) -> Result<RawContact> {
    check_status(body)?;
    body.get("item")
        .and_then(|item| item.get("fields"))
        .map(RawContact::from_json)
        .ok_or_else(|| SyncError::upstream(SERVICE, FETCH, "contact item without fields"))
}

#[cfg(test)]
mod tests {
    use super::{item_fields, listed_ids, Solve360Source, LIST_LIMIT};
    use crate::credentials::validate;
    use crate::factory::HttpSettings;
    use crate::source::ContactSource;
    use crate::test_support::{params, StubServer};
    use crate::SyncErrorKind;
    use crmsync_core::{Platform, RawValue};
    use serde_json::{json, Map, Value};

    #[test]
    fn listing_skips_bookkeeping_keys() {
        let body = json!({
            "status": "success",
            "count": 2,
            "101": { "id": 101, "name": "Ada" },
            "102": { "id": "102", "name": "Grace" }
        });
        assert_eq!(listed_ids(&body).expect("ids"), vec!["101", "102"]);
    }

    #[test]
    fn failed_status_is_upstream_error() {
        let err = listed_ids(&json!({ "status": "failed", "errors": ["bad token"] })).unwrap_err();
        assert_eq!(err.kind(), SyncErrorKind::Upstream);
        assert!(err.to_string().contains("bad token"));
    }

    #[test]
    fn item_fields_become_the_raw_contact() {
        let body = json!({
            "status": "success",
            "item": { "id": 101, "fields": { "firstname": "Ada", "lastname": "Lovelace" } }
        });
        let contact = item_fields(&body).expect("contact");
        assert_eq!(contact.get("firstname"), Some(&RawValue::text("Ada")));
        assert_eq!(contact.len(), 2);
    }

    #[test]
    fn listing_pages_then_reads_each_contact() {
        let mut first = Map::new();
        first.insert("status".to_string(), json!("success"));
        for idx in 0..LIST_LIMIT {
            first.insert(format!("{idx}"), json!({ "id": idx }));
        }
        let mut replies = vec![
            (200, Value::Object(first)),
            (200, json!({ "status": "success", "900": { "id": 900 } })),
        ];
        for idx in 0..=LIST_LIMIT {
            replies.push((
                200,
                json!({ "status": "success", "item": { "fields": { "firstname": format!("c{idx}") } } }),
            ));
        }
        let server = StubServer::start(replies);
        let config = validate(
            Platform::Solve360,
            &params(&[
                ("email", "ops@example.com"),
                ("token", "t"),
                ("endpoint", server.base()),
                ("secure", "false"),
            ]),
        )
        .expect("config");
        let source = Solve360Source::new(config, &HttpSettings::default()).expect("source");

        let contacts = source.fetch_all_contacts().expect("fetch");
        assert_eq!(contacts.len(), LIST_LIMIT + 1);

        let requests = server.requests();
        assert!(requests[0].line.contains("start=0"));
        assert!(requests[1].line.contains("start=500"));
        assert!(requests[2].line.starts_with("GET /contacts/0 "));
        assert!(requests[LIST_LIMIT + 2].line.starts_with("GET /contacts/900 "));
    }
}
