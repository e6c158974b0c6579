pub mod normalize;
pub mod rule;

pub use normalize::{NameMergeState, NamePart, Normalizer};
pub use rule::NormalizationRule;
