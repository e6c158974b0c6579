use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("platform not supported: {given}. Supported platforms are {supported}.")]
    UnsupportedPlatform { given: String, supported: String },
    #[error("no normalization rules loaded")]
    EmptyRuleSet,
    #[error("invalid normalization rule: {0}")]
    InvalidRule(String),
}
