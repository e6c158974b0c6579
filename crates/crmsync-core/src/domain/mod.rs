pub mod contact;
pub mod list;
pub mod platform;

pub use contact::{NormalizedContact, NormalizedField, RawContact, RawValue};
pub use list::{SyncList, SyncReceipt};
pub use platform::{is_supported, supported_platform_names, Platform, SUPPORTED_PLATFORMS};
