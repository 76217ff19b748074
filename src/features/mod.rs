//! Collocation feature vectors for classification

mod builder;
mod pos_rules;

pub use builder::{
    build_features, CollocationFeatures, ComponentIndex, FeatureVector, FEATURE_LEN,
    FEATURE_NAMES,
};
pub use pos_rules::{compress_pos_tag, PosRule, PosRules, TagPosition, OTHER, RULES_END, RULES_START};
