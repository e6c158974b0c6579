use crate::{Result, SyncError};
use crmsync_core::Platform;
use std::collections::BTreeMap;
use url::Url;

/// Caller-supplied configuration for one platform, keyed by parameter name.
pub type PlatformParams = BTreeMap<String, String>;

pub const ACT_ESSENTIAL_ENDPOINT: &str = "https://mycloud.act.com/act";
pub const SOLVE360_ENDPOINT: &str = "https://secure.solve360.com";
pub const SALESFORCE_LOGIN_URL: &str = "https://login.salesforce.com";
pub const SALESFORCE_API_VERSION: &str = "v36.0";
pub const SALESFORCE_DEFAULT_FIELDS: [&str; 9] = [
    "Id",
    "Name",
    "FirstName",
    "LastName",
    "Email",
    "Phone",
    "MobilePhone",
    "Title",
    "MailingAddress",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyCredentials {
    pub api_key: String,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCodeCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthPasswordCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub security_token: Option<String>,
}

/// Which authentication scheme a platform was configured with. Selected from
/// the supplied parameter set, never from argument count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCredentials {
    ApiKey(ApiKeyCredentials),
    Login(LoginCredentials),
    OAuthCode(OAuthCodeCredentials),
    OAuthPassword(OAuthPasswordCredentials),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesforceOptions {
    pub fields: Vec<String>,
    pub api_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub platform: Platform,
    /// Base URL without a trailing slash. For Salesforce this is the login
    /// host used for OAuth.
    pub endpoint: String,
    pub secure: bool,
    pub credentials: PlatformCredentials,
    pub salesforce: Option<SalesforceOptions>,
}

/// URL the user visits to grant access in the authorization-code flow.
pub fn authorization_url(login_url: &str, client_id: &str, redirect_uri: &str) -> Result<String> {
    let base = format!("{}/services/oauth2/authorize", login_url.trim_end_matches('/'));
    let url = Url::parse_with_params(
        &base,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
        ],
    )
    .map_err(|err| {
        SyncError::invalid_configuration(Platform::SalesforceCrm, format!("invalid login url: {err}"))
    })?;
    Ok(url.to_string())
}

/// Checks that `params` carries one complete credential set for `platform`.
pub fn validate(platform: Platform, params: &PlatformParams) -> Result<PlatformConfig> {
    let params = Params { platform, params };
    match platform {
        Platform::ActEssential => {
            params.allow_only(&["api_key", "dev_key", "endpoint", "secure"])?;
            let secure = params.secure()?;
            let (Some(api_key), Some(dev_key)) = (params.get("api_key"), params.get("dev_key"))
            else {
                return Err(params.missing("api_key and dev_key"));
            };
            Ok(PlatformConfig {
                platform,
                endpoint: params.endpoint("endpoint", ACT_ESSENTIAL_ENDPOINT, secure)?,
                secure,
                credentials: PlatformCredentials::ApiKey(ApiKeyCredentials {
                    api_key,
                    secret: Some(dev_key),
                }),
                salesforce: None,
            })
        }
        Platform::Freshdesk => {
            params.allow_only(&["domain", "api_key", "login", "password", "secure"])?;
            let secure = params.secure()?;
            let Some(domain) = params.get("domain") else {
                return Err(params.missing("domain"));
            };
            let domain = if domain.contains("://") {
                domain
            } else {
                format!("https://{domain}")
            };
            let credentials = if let Some(api_key) = params.get("api_key") {
                PlatformCredentials::ApiKey(ApiKeyCredentials {
                    api_key,
                    secret: None,
                })
            } else if let (Some(login), Some(password)) =
                (params.get("login"), params.get("password"))
            {
                PlatformCredentials::Login(LoginCredentials { login, password })
            } else {
                return Err(params.missing("api_key, or login and password"));
            };
            let base = params.check_url(&domain, secure)?;
            Ok(PlatformConfig {
                platform,
                endpoint: format!("{base}/api/v2"),
                secure,
                credentials,
                salesforce: None,
            })
        }
        Platform::SalesforceCrm => {
            params.allow_only(&[
                "client_id",
                "client_secret",
                "redirect_uri",
                "code",
                "username",
                "password",
                "security_token",
                "login_url",
                "fields",
                "api_version",
            ])?;
            let (Some(client_id), Some(client_secret)) =
                (params.get("client_id"), params.get("client_secret"))
            else {
                return Err(params.missing(
                    "client_id and client_secret plus redirect_uri, or username and password",
                ));
            };
            let credentials = if let Some(redirect_uri) = params.get("redirect_uri") {
                params.check_url(&redirect_uri, false)?;
                PlatformCredentials::OAuthCode(OAuthCodeCredentials {
                    client_id,
                    client_secret,
                    redirect_uri,
                    code: params.get("code"),
                })
            } else if let (Some(username), Some(password)) =
                (params.get("username"), params.get("password"))
            {
                PlatformCredentials::OAuthPassword(OAuthPasswordCredentials {
                    client_id,
                    client_secret,
                    username,
                    password,
                    security_token: params.get("security_token"),
                })
            } else {
                return Err(params.missing("redirect_uri, or username and password"));
            };
            let fields = match params.get("fields") {
                Some(raw) => {
                    let fields: Vec<String> = raw
                        .split(',')
                        .map(str::trim)
                        .filter(|field| !field.is_empty())
                        .map(str::to_string)
                        .collect();
                    if fields.is_empty() {
                        return Err(params.invalid("fields must name at least one field"));
                    }
                    fields
                }
                None => SALESFORCE_DEFAULT_FIELDS
                    .iter()
                    .map(|field| field.to_string())
                    .collect(),
            };
            Ok(PlatformConfig {
                platform,
                endpoint: params.endpoint("login_url", SALESFORCE_LOGIN_URL, true)?,
                secure: true,
                credentials,
                salesforce: Some(SalesforceOptions {
                    fields,
                    api_version: params
                        .get("api_version")
                        .unwrap_or_else(|| SALESFORCE_API_VERSION.to_string()),
                }),
            })
        }
        Platform::Solve360 => {
            params.allow_only(&["email", "token", "endpoint", "secure"])?;
            let secure = params.secure()?;
            let (Some(login), Some(password)) = (params.get("email"), params.get("token")) else {
                return Err(params.missing("email and token"));
            };
            Ok(PlatformConfig {
                platform,
                endpoint: params.endpoint("endpoint", SOLVE360_ENDPOINT, secure)?,
                secure,
                credentials: PlatformCredentials::Login(LoginCredentials { login, password }),
                salesforce: None,
            })
        }
        Platform::TactileCrm => {
            params.allow_only(&["url", "token", "secure"])?;
            let secure = params.secure()?;
            let (Some(url), Some(token)) = (params.get("url"), params.get("token")) else {
                return Err(params.missing("url and token"));
            };
            Ok(PlatformConfig {
                platform,
                endpoint: params.check_url(&url, secure)?,
                secure,
                credentials: PlatformCredentials::ApiKey(ApiKeyCredentials {
                    api_key: token,
                    secret: None,
                }),
                salesforce: None,
            })
        }
    }
}

struct Params<'a> {
    platform: Platform,
    params: &'a PlatformParams,
}

impl Params<'_> {
    /// Blank values count as absent.
    fn get(&self, key: &str) -> Option<String> {
        self.params
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn allow_only(&self, allowed: &[&str]) -> Result<()> {
        match self
            .params
            .keys()
            .find(|key| !allowed.contains(&key.as_str()))
        {
            Some(key) => Err(self.invalid(format!(
                "unknown parameter {key} (expected one of {})",
                allowed.join(", ")
            ))),
            None => Ok(()),
        }
    }

    fn secure(&self) -> Result<bool> {
        match self.get("secure") {
            None => Ok(true),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(self.invalid(format!("invalid secure value: {raw}"))),
            },
        }
    }

    fn endpoint(&self, key: &str, default: &str, secure: bool) -> Result<String> {
        match self.get(key) {
            Some(raw) => self.check_url(&raw, secure),
            None => Ok(default.to_string()),
        }
    }

    fn check_url(&self, raw: &str, secure: bool) -> Result<String> {
        let url = Url::parse(raw).map_err(|err| self.invalid(format!("invalid url {raw}: {err}")))?;
        match url.scheme() {
            "https" => {}
            "http" if !secure => {}
            "http" => {
                return Err(self.invalid(format!("{raw} must use https when secure is enabled")))
            }
            other => return Err(self.invalid(format!("unsupported url scheme {other} in {raw}"))),
        }
        Ok(raw.trim_end_matches('/').to_string())
    }

    fn missing(&self, what: &str) -> SyncError {
        self.invalid(format!("requires {what}"))
    }

    fn invalid(&self, reason: impl Into<String>) -> SyncError {
        SyncError::invalid_configuration(self.platform, reason)
    }
}
