use crate::Result;
use crmsync_core::{NormalizedContact, SyncList, SyncReceipt};

/// The contact-list service normalized contacts are pushed into.
pub trait ContactListService: Send + Sync {
    fn find_list_by_name(&self, name: &str) -> Result<Option<SyncList>>;
    fn create_list(&self, name: &str) -> Result<SyncList>;
    /// `merge_field_id` of `None` leaves de-duplication to the service defaults.
    fn submit_contact_batch(
        &self,
        contacts: &[NormalizedContact],
        merge_field_id: Option<&str>,
        list_id: &str,
    ) -> Result<SyncReceipt>;
}
