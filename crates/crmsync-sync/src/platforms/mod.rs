mod actessential;
mod freshdesk;
mod salesforce;
mod solve360;
mod tactile;

pub use actessential::ActEssentialSource;
pub use freshdesk::FreshdeskSource;
pub use salesforce::SalesforceSource;
pub use solve360::Solve360Source;
pub use tactile::TactileSource;

use crate::SyncError;
use crmsync_core::Platform;

const FETCH: &str = "fetch contacts";

fn unexpected_credentials(platform: Platform) -> SyncError {
    SyncError::invalid_configuration(platform, "credential type not accepted by this platform")
}
