use crate::Result;
use crmsync_core::{Platform, RawContact};

/// A source platform able to hand over its complete contact set.
///
/// Implementations hold their own authentication state and page through the
/// remote API internally; callers always get every contact from one call.
/// Credentials rejected upstream surface as [`crate::SyncError::Auth`], any
/// other non-success response as [`crate::SyncError::Upstream`].
pub trait ContactSource: Send + Sync {
    fn platform(&self) -> Platform;
    fn fetch_all_contacts(&self) -> Result<Vec<RawContact>>;
}
