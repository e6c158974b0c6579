use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single field value as a source platform reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Null,
    Scalar(String),
    /// Sub-object such as a mailing address. Arrays are kept here too, keyed
    /// by element index.
    Nested(Vec<(String, RawValue)>),
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Scalar(value.into())
    }

    pub fn nested<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, RawValue)>,
    {
        RawValue::Nested(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::String(text) => RawValue::Scalar(text.clone()),
            Value::Bool(flag) => RawValue::Scalar(flag.to_string()),
            Value::Number(number) => RawValue::Scalar(number.to_string()),
            Value::Object(map) => RawValue::Nested(
                map.iter()
                    .map(|(key, value)| (key.clone(), RawValue::from_json(value)))
                    .collect(),
            ),
            Value::Array(items) => RawValue::Nested(
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, value)| (idx.to_string(), RawValue::from_json(value)))
                    .collect(),
            ),
        }
    }
}

/// A contact record in its source platform's own field shape. Field order is
/// the order the platform returned them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawContact {
    fields: Vec<(String, RawValue)>,
}

impl RawContact {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: RawValue) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: RawValue) {
        self.fields.push((key.into(), value));
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds a contact from a decoded JSON record. Anything other than an
    /// object yields an empty contact so one bad record cannot shift the
    /// positions of the others.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| (key.clone(), RawValue::from_json(value)))
                .collect(),
            _ => RawContact::default(),
        }
    }
}

impl FromIterator<(String, RawValue)> for RawContact {
    fn from_iter<T: IntoIterator<Item = (String, RawValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedField {
    pub id: String,
    pub value: String,
}

/// A contact expressed as canonical `{id, value}` pairs, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedContact {
    fields: Vec<NormalizedField>,
}

impl NormalizedContact {
    pub fn fields(&self) -> &[NormalizedField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn values_for(&self, id: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.id == id)
            .map(|field| field.value.as_str())
            .collect()
    }

    pub(crate) fn push(&mut self, id: &str, value: &str) -> usize {
        self.fields.push(NormalizedField {
            id: id.to_string(),
            value: value.to_string(),
        });
        self.fields.len() - 1
    }

    pub(crate) fn value_mut(&mut self, index: usize) -> Option<&mut String> {
        self.fields.get_mut(index).map(|field| &mut field.value)
    }
}

impl From<Vec<NormalizedField>> for NormalizedContact {
    fn from(fields: Vec<NormalizedField>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::{RawContact, RawValue};
    use serde_json::json;

    #[test]
    fn from_json_keeps_field_order_and_stringifies_scalars() {
        let raw = RawContact::from_json(&json!({
            "LastName": "Doe",
            "FirstName": "Jane",
            "Age": 41,
            "Active": true,
            "Fax": null,
        }));
        let keys: Vec<&str> = raw.fields().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["LastName", "FirstName", "Age", "Active", "Fax"]);
        assert_eq!(raw.get("Age"), Some(&RawValue::text("41")));
        assert_eq!(raw.get("Active"), Some(&RawValue::text("true")));
        assert_eq!(raw.get("Fax"), Some(&RawValue::Null));
    }

    #[test]
    fn from_json_turns_arrays_into_indexed_mappings() {
        let raw = RawContact::from_json(&json!({ "emails": ["a@example.com", "b@example.com"] }));
        assert_eq!(
            raw.get("emails"),
            Some(&RawValue::nested([
                ("0", RawValue::text("a@example.com")),
                ("1", RawValue::text("b@example.com")),
            ]))
        );
    }

    #[test]
    fn from_json_maps_non_objects_to_empty_contacts() {
        assert!(RawContact::from_json(&json!("not a contact")).is_empty());
        assert!(RawContact::from_json(&json!(null)).is_empty());
    }
}
