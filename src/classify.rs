//! Frozen collocation classifier
//!
//! Labels feature vectors with a pre-trained model. Models are loaded from
//! JSON; training happens elsewhere.

use crate::features::{FeatureVector, FEATURE_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors from loading or applying a classifier
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("model expects {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("model has non-finite parameters")]
    NonFinite,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Predicted class of a collocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Relevant,
    Irrelevant,
}

impl Label {
    pub fn as_i8(&self) -> i8 {
        match self {
            Label::Relevant => 1,
            Label::Irrelevant => 0,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Relevant => f.write_str("relevant"),
            Label::Irrelevant => f.write_str("irrelevant"),
        }
    }
}

/// A frozen model mapping feature vectors to labels
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<Label, ClassifierError>;
}

/// Linear decision function: relevant when `w · x + bias > 0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearModel {
    pub fn new(weights: Vec<f64>, bias: f64) -> Result<Self, ClassifierError> {
        let model = Self { weights, bias };
        model.validate()?;
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), ClassifierError> {
        if self.weights.len() != FEATURE_LEN {
            return Err(ClassifierError::ShapeMismatch {
                expected: FEATURE_LEN,
                actual: self.weights.len(),
            });
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(ClassifierError::NonFinite);
        }
        Ok(())
    }

    pub fn decision(&self, features: &FeatureVector) -> f64 {
        self.weights
            .iter()
            .zip(features.as_slice())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias
    }
}

impl Classifier for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<Label, ClassifierError> {
        if features.as_slice().len() != self.weights.len() {
            return Err(ClassifierError::ShapeMismatch {
                expected: self.weights.len(),
                actual: features.as_slice().len(),
            });
        }
        if self.decision(features) > 0.0 {
            Ok(Label::Relevant)
        } else {
            Ok(Label::Irrelevant)
        }
    }
}
