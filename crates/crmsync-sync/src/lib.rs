pub mod credentials;
pub mod destination;
pub mod engine;
pub mod error;
pub mod factory;
#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub mod platforms;
pub mod registry;
pub mod simplycast;
pub mod source;
#[cfg(all(test, feature = "http"))]
mod test_support;

pub use credentials::{
    authorization_url, ApiKeyCredentials, LoginCredentials, OAuthCodeCredentials,
    OAuthPasswordCredentials, PlatformConfig, PlatformCredentials, PlatformParams,
    SalesforceOptions,
};
pub use destination::ContactListService;
pub use engine::SyncEngine;
pub use error::{Result, SyncError, SyncErrorKind};
pub use factory::{HttpSettings, HttpSourceFactory};
pub use registry::{AdapterHandle, AdapterRegistry, SourceFactory};
pub use simplycast::{DestinationSettings, SimplyCastClient};
pub use source::ContactSource;
