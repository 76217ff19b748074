//! Feature vectors of an article's collocations
//!
//! Every vector carries the nine features of [`FEATURE_NAMES`], in that
//! order: six part-of-speech start and end flags, then the dblp source flag,
//! dblp component membership and component size. This layout replaces the
//! older seven-feature order (NN_STARTS, dblp_source, dblp_component,
//! component_size, NN_ENDS, VB_ENDS, JJ_STARTS), which had no VB_STARTS or
//! JJ_ENDS flag. Models trained on the older layout must be retrained; a
//! [`LinearModel`](crate::classify::LinearModel) of any other length is
//! rejected when loaded.

use super::pos_rules::{compress_pos_tag, RULES_END, RULES_START};
use crate::corpus::{Article, ArticleCollocation, Collocation};
use crate::dbpedia::{is_category, CategoryGraph};
use crate::text::{dominant_pattern, tag_text};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::Index;

/// Number of features per collocation
pub const FEATURE_LEN: usize = 9;

/// Feature names, in vector order
pub const FEATURE_NAMES: [&str; FEATURE_LEN] = [
    "NN_STARTS",
    "VB_STARTS",
    "JJ_STARTS",
    "NN_ENDS",
    "VB_ENDS",
    "JJ_ENDS",
    "dblp_source",
    "dblp_component",
    "component_size",
];

/// Fixed-length feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_LEN]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_LEN]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value of a named feature
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES.iter().position(|n| *n == name).map(|i| self.0[i])
    }
}

impl Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

/// Features of one collocation of an article
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollocationFeatures {
    pub ngram: String,
    /// Dominant tag pattern in the article text
    pub pos_pattern: Option<String>,
    pub features: FeatureVector,
}

/// Component membership of graph nodes
#[derive(Debug, Clone, Default)]
pub struct ComponentIndex {
    sizes: HashMap<String, usize>,
    dblp_nodes: HashSet<String>,
}

impl ComponentIndex {
    /// Index the components of `graph`. A component is a DBLP component
    /// when one of its concept nodes is in `dblp_ngrams`.
    pub fn new(graph: &CategoryGraph, dblp_ngrams: &HashSet<String>) -> Self {
        let mut index = Self::default();

        for component in graph.connected_components() {
            let concepts: Vec<&String> = component.iter().filter(|n| !is_category(n)).collect();
            if concepts.iter().any(|n| dblp_ngrams.contains(*n)) {
                index.dblp_nodes.extend(concepts.iter().map(|n| n.to_string()));
            }
            for node in &component {
                index.sizes.insert(node.clone(), concepts.len());
            }
        }

        index
    }

    /// Number of concept nodes in the node's component, 0 when absent
    pub fn component_size(&self, node: &str) -> usize {
        self.sizes.get(node).copied().unwrap_or(0)
    }

    pub fn in_dblp_component(&self, node: &str) -> bool {
        self.dblp_nodes.contains(node)
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Build the feature vector of each of `rows`.
///
/// `aggregates` holds the cluster rows of the article's collocations and
/// `components` the component index of the article's category graph.
pub fn build_features(
    article: &Article,
    rows: &[ArticleCollocation],
    aggregates: &HashMap<String, Collocation>,
    components: &ComponentIndex,
) -> Vec<CollocationFeatures> {
    let segments = tag_text(&article.text, article.stem_method);

    rows.iter()
        .map(|row| {
            let pos_pattern = dominant_pattern(&segments, &row.ngram);
            let pattern = pos_pattern.as_deref().unwrap_or("");
            let start = compress_pos_tag(pattern, &RULES_START);
            let end = compress_pos_tag(pattern, &RULES_END);
            let dblp_source = aggregates
                .get(&row.ngram)
                .is_some_and(|c| c.has_source("dblp"));

            let features = FeatureVector::new([
                flag(start == "NN_STARTS"),
                flag(start == "VB_STARTS"),
                flag(start == "JJ_STARTS"),
                flag(end == "NN_ENDS"),
                flag(end == "VB_ENDS"),
                flag(end == "JJ_ENDS"),
                flag(dblp_source),
                flag(components.in_dblp_component(&row.ngram)),
                components.component_size(&row.ngram) as f64,
            ]);

            CollocationFeatures {
                ngram: row.ngram.clone(),
                pos_pattern,
                features,
            }
        })
        .collect()
}
