use crate::destination::ContactListService;
use crate::factory::HttpSettings;
use crate::{Result, SyncError};
use crmsync_core::{NormalizedContact, SyncList, SyncReceipt};

pub const SIMPLYCAST_ENDPOINT: &str = "https://api.simplycast.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSettings {
    pub endpoint: String,
    pub public_key: String,
    pub secret_key: String,
}

impl DestinationSettings {
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            endpoint: SIMPLYCAST_ENDPOINT.to_string(),
            public_key: public_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

#[cfg(feature = "http")]
mod imp {
    use super::{
        ContactListService, DestinationSettings, HttpSettings, NormalizedContact, Result,
        SyncError, SyncList, SyncReceipt,
    };
    use crate::http::{build_client, json_id, send_json};
    use reqwest::blocking::{Client, RequestBuilder};
    use serde_json::{json, Value};

    const SERVICE: &str = "simplycast";
    const FIND_LIST: &str = "find list";
    const CREATE_LIST: &str = "create list";

    /// SimplyCast contact manager, authenticated with the public/secret key pair.
    pub struct SimplyCastClient {
        settings: DestinationSettings,
        client: Client,
    }

    impl SimplyCastClient {
        pub fn new(settings: DestinationSettings, http: &HttpSettings) -> Result<Self> {
            Ok(Self {
                client: build_client(http, true)?,
                settings,
            })
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.settings.endpoint.trim_end_matches('/'), path)
        }

        fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
            request.basic_auth(&self.settings.public_key, Some(&self.settings.secret_key))
        }
    }

    impl ContactListService for SimplyCastClient {
        fn find_list_by_name(&self, name: &str) -> Result<Option<SyncList>> {
            let request = self
                .client
                .get(self.url("/contactmanager/lists"))
                .query(&[("query", format!("name:{name}"))]);
            let body = send_json(SERVICE, FIND_LIST, self.authorized(request))?;
            find_named(&body, name)
        }

        fn create_list(&self, name: &str) -> Result<SyncList> {
            let request = self
                .client
                .post(self.url("/contactmanager/lists"))
                .json(&json!({ "list": { "name": name } }));
            let body = send_json(SERVICE, CREATE_LIST, self.authorized(request))?;
            let list = body.get("list").unwrap_or(&body);
            parse_list(list, name, CREATE_LIST)?.ok_or_else(|| {
                SyncError::upstream(SERVICE, CREATE_LIST, "response carried no list")
            })
        }

        fn submit_contact_batch(
            &self,
            contacts: &[NormalizedContact],
            merge_field_id: Option<&str>,
            list_id: &str,
        ) -> Result<SyncReceipt> {
            let request = self
                .client
                .post(self.url("/contactmanager/contacts/batch"))
                .json(&batch_body(contacts, merge_field_id, list_id));
            let body = send_json(SERVICE, "submit batch", self.authorized(request))?;
            Ok(SyncReceipt::new(body))
        }
    }

    fn find_named(body: &Value, name: &str) -> Result<Option<SyncList>> {
        let Some(lists) = body.get("lists").and_then(Value::as_array) else {
            return Ok(None);
        };
        match lists
            .iter()
            .find(|list| list.get("name").and_then(Value::as_str) == Some(name))
        {
            Some(list) => parse_list(list, name, FIND_LIST),
            None => Ok(None),
        }
    }

    fn parse_list(list: &Value, name: &str, step: &'static str) -> Result<Option<SyncList>> {
        if list.is_null() {
            return Ok(None);
        }
        let id = list
            .get("id")
            .and_then(json_id)
            .ok_or_else(|| SyncError::upstream(SERVICE, step, "list without id"))?;
        let name = list
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(name)
            .to_string();
        Ok(Some(SyncList { id, name }))
    }

    fn batch_body(
        contacts: &[NormalizedContact],
        merge_field_id: Option<&str>,
        list_id: &str,
    ) -> Value {
        // Numeric list ids go out as numbers.
        let list = match list_id.parse::<u64>() {
            Ok(number) => json!(number),
            Err(_) => json!(list_id),
        };
        json!({
            "contacts": contacts
                .iter()
                .map(|contact| json!({ "fields": contact }))
                .collect::<Vec<_>>(),
            "mergeColumn": merge_field_id,
            "lists": [list],
        })
    }

    #[cfg(test)]
    mod tests {
        use super::{batch_body, find_named, parse_list, CREATE_LIST};
        use crate::SyncErrorKind;
        use crmsync_core::{NormalizedContact, NormalizedField};
        use serde_json::json;

        #[test]
        fn finds_list_with_matching_name() {
            let body = json!({ "lists": [
                { "id": 4, "name": "freshdesk-old" },
                { "id": 9, "name": "freshdesk" }
            ]});
            let list = find_named(&body, "freshdesk").expect("find").expect("list");
            assert_eq!(list.id, "9");
            assert!(find_named(&json!(null), "freshdesk").expect("find").is_none());
            assert!(find_named(&json!({ "lists": [{ "id": 4, "name": "solve360" }] }), "freshdesk")
                .expect("find")
                .is_none());
            assert!(find_named(&json!({ "lists": [] }), "freshdesk")
                .expect("find")
                .is_none());
        }

        #[test]
        fn unnamed_lists_never_match() {
            let body = json!({ "lists": [{ "id": 4 }, { "id": 9, "name": "freshdesk" }] });
            let list = find_named(&body, "freshdesk").expect("find").expect("list");
            assert_eq!(list.id, "9");
            assert_eq!(list.name, "freshdesk");
        }

        #[test]
        fn created_list_without_id_names_the_create_step() {
            let err = parse_list(&json!({ "name": "freshdesk" }), "freshdesk", CREATE_LIST)
                .unwrap_err();
            assert_eq!(err.kind(), SyncErrorKind::Upstream);
            assert!(err.to_string().starts_with("simplycast: create list: "));
        }

        #[test]
        fn batch_body_wraps_fields_and_numeric_list() {
            let contact = NormalizedContact::from(vec![NormalizedField {
                id: "23".to_string(),
                value: "ada@example.com".to_string(),
            }]);
            let body = batch_body(&[contact], None, "17");
            assert_eq!(
                body,
                json!({
                    "contacts": [{ "fields": [{ "id": "23", "value": "ada@example.com" }] }],
                    "mergeColumn": null,
                    "lists": [17]
                })
            );
        }
    }
}

#[cfg(not(feature = "http"))]
mod imp {
    use super::{
        ContactListService, DestinationSettings, HttpSettings, NormalizedContact, Result,
        SyncError, SyncList, SyncReceipt,
    };

    pub struct SimplyCastClient {
        settings: DestinationSettings,
    }

    impl SimplyCastClient {
        pub fn new(settings: DestinationSettings, _http: &HttpSettings) -> Result<Self> {
            Ok(Self { settings })
        }

        fn unavailable(&self) -> SyncError {
            let _ = &self.settings;
            SyncError::Unavailable("SimplyCast export requires the http feature".to_string())
        }
    }

    impl ContactListService for SimplyCastClient {
        fn find_list_by_name(&self, _name: &str) -> Result<Option<SyncList>> {
            Err(self.unavailable())
        }

        fn create_list(&self, _name: &str) -> Result<SyncList> {
            Err(self.unavailable())
        }

        fn submit_contact_batch(
            &self,
            _contacts: &[NormalizedContact],
            _merge_field_id: Option<&str>,
            _list_id: &str,
        ) -> Result<SyncReceipt> {
            Err(self.unavailable())
        }
    }
}

pub use imp::SimplyCastClient;
