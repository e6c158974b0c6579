use crate::domain::{NormalizedContact, RawContact, RawValue};
use crate::error::CoreError;
use crate::rules::NormalizationRule;

/// Source keys that take part in the single-name merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePart {
    Full,
    First,
    Last,
}

impl NamePart {
    pub fn classify(lowered_key: &str) -> Option<Self> {
        match lowered_key {
            "name" => Some(NamePart::Full),
            "firstname" => Some(NamePart::First),
            "lastname" => Some(NamePart::Last),
            _ => None,
        }
    }
}

/// Per-contact bookkeeping for the name-bearing output slot. At most one
/// output pair holds the name role at a time.
#[derive(Debug, Clone, Default)]
pub struct NameMergeState {
    slot: Option<usize>,
    full: bool,
    first: bool,
    last: bool,
}

impl NameMergeState {
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    pub fn has_recorded(&self, part: NamePart) -> bool {
        match part {
            NamePart::Full => self.full,
            NamePart::First => self.first,
            NamePart::Last => self.last,
        }
    }

    fn record(&mut self, part: NamePart) {
        match part {
            NamePart::Full => self.full = true,
            NamePart::First => self.first = true,
            NamePart::Last => self.last = true,
        }
    }

    fn apply(
        &mut self,
        out: &mut NormalizedContact,
        field_id: &str,
        part: Option<NamePart>,
        value: &str,
    ) {
        let Some(index) = self.slot else {
            let index = out.push(field_id, value);
            if let Some(part) = part {
                self.slot = Some(index);
                self.record(part);
            }
            return;
        };

        let Some(part) = part else {
            out.push(field_id, value);
            return;
        };

        match part {
            NamePart::First | NamePart::Last if self.full => {}
            NamePart::First => {
                if let Some(existing) = out.value_mut(index) {
                    *existing = format!("{value} {existing}");
                }
                self.record(part);
                // The merge is complete; a later part opens a fresh slot.
                self.slot = None;
            }
            NamePart::Last => {
                if let Some(existing) = out.value_mut(index) {
                    existing.push(' ');
                    existing.push_str(value);
                }
                self.record(part);
                self.slot = None;
            }
            NamePart::Full => {
                if let Some(existing) = out.value_mut(index) {
                    *existing = value.to_string();
                }
                self.record(part);
            }
        }
    }
}

/// Maps platform-shaped records onto the canonical field set.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    rules: Vec<NormalizationRule>,
}

impl Normalizer {
    pub fn new(rules: Vec<NormalizationRule>) -> Self {
        Self { rules }
    }

    /// Output is positional: contact `i` in yields contact `i` out, even when
    /// nothing in it matched.
    pub fn normalize(&self, contacts: &[RawContact]) -> Result<Vec<NormalizedContact>, CoreError> {
        if self.rules.is_empty() {
            return Err(CoreError::EmptyRuleSet);
        }
        Ok(contacts
            .iter()
            .map(|contact| self.normalize_contact(contact))
            .collect())
    }

    fn normalize_contact(&self, contact: &RawContact) -> NormalizedContact {
        let mut out = NormalizedContact::default();
        let mut names = NameMergeState::default();

        for (key, value) in contact.fields() {
            match value {
                RawValue::Null => {}
                RawValue::Nested(entries) => {
                    if let Some((rule, sub_value)) = self.first_nested_match(entries) {
                        out.push(rule.field_id(), sub_value);
                    }
                }
                RawValue::Scalar(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    let lowered = key.to_lowercase();
                    let Some(rule) = self.rule_for(&lowered) else {
                        continue;
                    };
                    names.apply(&mut out, rule.field_id(), NamePart::classify(&lowered), text);
                }
            }
        }

        out
    }

    fn rule_for(&self, lowered_key: &str) -> Option<&NormalizationRule> {
        self.rules.iter().find(|rule| rule.matches(lowered_key))
    }

    fn first_nested_match<'a>(
        &self,
        entries: &'a [(String, RawValue)],
    ) -> Option<(&NormalizationRule, &'a str)> {
        entries.iter().find_map(|(sub_key, sub_value)| {
            let RawValue::Scalar(text) = sub_value else {
                return None;
            };
            if text.is_empty() {
                return None;
            }
            self.rule_for(&sub_key.to_lowercase())
                .map(|rule| (rule, text.as_str()))
        })
    }
}
