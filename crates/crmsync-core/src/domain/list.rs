use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Destination collection that receives one platform's contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncList {
    pub id: String,
    pub name: String,
}

/// Response of a batch submission, kept exactly as the destination returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncReceipt(Value);

impl SyncReceipt {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    pub fn body(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}
