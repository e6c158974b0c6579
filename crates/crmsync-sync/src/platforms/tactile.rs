use super::{unexpected_credentials, FETCH};
use crate::credentials::{ApiKeyCredentials, PlatformConfig, PlatformCredentials};
use crate::factory::HttpSettings;
use crate::http::{build_client, contacts_from, json_u64, send_json};
use crate::source::ContactSource;
use crate::{Result, SyncError};
use crmsync_core::{Platform, RawContact};
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

const SERVICE: &str = "tactilecrm";
const PAGE_LIMIT: usize = 30;

/// Tactile CRM people, authenticated by an API token query parameter.
pub struct TactileSource {
    endpoint: String,
    token: String,
    client: Client,
}

impl TactileSource {
    pub fn new(config: PlatformConfig, settings: &HttpSettings) -> Result<Self> {
        let PlatformCredentials::ApiKey(ApiKeyCredentials { api_key, .. }) = config.credentials
        else {
            return Err(unexpected_credentials(Platform::TactileCrm));
        };
        Ok(Self {
            client: build_client(settings, config.secure)?,
            endpoint: config.endpoint,
            token: api_key,
        })
    }
}

impl ContactSource for TactileSource {
    fn platform(&self) -> Platform {
        Platform::TactileCrm
    }

    fn fetch_all_contacts(&self) -> Result<Vec<RawContact>> {
        let url = format!("{}/people", self.endpoint);
        let limit = PAGE_LIMIT.to_string();
        let mut contacts = Vec::new();
        let mut page_num = 1u64;
        loop {
            let page_param = page_num.to_string();
            let request = self.client.get(&url).query(&[
                ("api_token", self.token.as_str()),
                ("limit", limit.as_str()),
                ("page", page_param.as_str()),
            ]);
            let body = send_json(SERVICE, FETCH, request)?;
            let page = parse_page(&body)?;
            debug!(page = page.cur_page, pages = page.num_pages, "tactile page");
            contacts.extend(contacts_from(page.people));
            if page.cur_page >= page.num_pages || page_num >= page.num_pages {
                break;
            }
            page_num += 1;
        }
        Ok(contacts)
    }
}

#[derive(Debug)]
struct PeoplePage<'a> {
    people: &'a [Value],
    cur_page: u64,
    num_pages: u64,
}

fn parse_page(body: &Value) -> Result<PeoplePage<'_>> {
    if body.get("status").and_then(Value::as_str) == Some("error") {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("failed to get people");
        return Err(SyncError::upstream(SERVICE, FETCH, message));
    }
    let people = body
        .get("people")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let cur_page = body.get("cur_page").and_then(json_u64).unwrap_or(1);
    let num_pages = body.get("num_pages").and_then(json_u64).unwrap_or(cur_page);
    Ok(PeoplePage {
        people,
        cur_page,
        num_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_page, TactileSource};
    use crate::credentials::validate;
    use crate::factory::HttpSettings;
    use crate::source::ContactSource;
    use crate::test_support::{params, StubServer};
    use crate::SyncErrorKind;
    use crmsync_core::Platform;
    use serde_json::json;

    #[test]
    fn page_counters_accept_strings() {
        let body = json!({
            "status": "success",
            "cur_page": "1",
            "num_pages": "3",
            "people": [{ "firstname": "Ada" }]
        });
        let page = parse_page(&body).expect("page");
        assert_eq!(page.people.len(), 1);
        assert_eq!((page.cur_page, page.num_pages), (1, 3));
    }

    #[test]
    fn missing_counters_end_paging() {
        let body = json!({ "people": [] });
        let page = parse_page(&body).expect("page");
        assert!(page.cur_page >= page.num_pages);
    }

    #[test]
    fn error_status_is_upstream() {
        let err = parse_page(&json!({ "status": "error", "message": "Invalid token" })).unwrap_err();
        assert_eq!(err.kind(), SyncErrorKind::Upstream);
        assert!(err.to_string().contains("Invalid token"));
    }

    #[test]
    fn fetch_walks_pages_until_the_last() {
        let server = StubServer::start(vec![
            (200, json!({ "cur_page": 1, "num_pages": 2, "people": [{ "firstname": "Ada" }] })),
            (200, json!({ "cur_page": "2", "num_pages": "2", "people": [{ "firstname": "Grace" }] })),
        ]);
        let config = validate(
            Platform::TactileCrm,
            &params(&[("url", server.base()), ("token", "t0k"), ("secure", "false")]),
        )
        .expect("config");
        let source = TactileSource::new(config, &HttpSettings::default()).expect("source");

        let contacts = source.fetch_all_contacts().expect("fetch");
        assert_eq!(contacts.len(), 2);

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].line.starts_with("GET /people?api_token=t0k&limit=30&page=1 "));
        assert!(requests[1].line.contains("page=2"));
    }
}
