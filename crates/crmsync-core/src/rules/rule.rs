use crate::error::CoreError;
use std::collections::BTreeSet;

/// A canonical field id plus the source key names recognised as aliases for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationRule {
    field_id: String,
    keywords: BTreeSet<String>,
}

impl NormalizationRule {
    pub fn new<I, S>(field_id: impl Into<String>, keywords: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let field_id = field_id.into();
        let trimmed = field_id.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidRule("field id cannot be empty".to_string()));
        }
        let keywords = keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        Ok(Self {
            field_id: trimmed.to_string(),
            keywords,
        })
    }

    pub fn field_id(&self) -> &str {
        &self.field_id
    }

    pub fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    /// `lowered_key` must already be lower-cased.
    pub fn matches(&self, lowered_key: &str) -> bool {
        self.keywords.contains(lowered_key)
    }
}
