//! Versioned resource overrides for the crawler

use super::client::{Binding, RESOURCE_PREFIX};
use super::CrawlError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const BUNDLED: &str = include_str!("../../config/dbpedia_overrides.yaml");

/// Stop-list, URL overrides and fallback results of the crawler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceOverrides {
    /// Part of the graph cache key
    pub version: u32,
    /// Resources never expanded
    pub stop_uris: BTreeSet<String>,
    /// Concept name to resource path segment
    pub url_overrides: BTreeMap<String, String>,
    /// Concept name to subjects used when a query returns nothing
    pub fallbacks: BTreeMap<String, Vec<String>>,
}

impl ResourceOverrides {
    /// The overrides shipped with the crate
    pub fn bundled() -> Result<Self, CrawlError> {
        Self::from_yaml(BUNDLED)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, CrawlError> {
        let mut overrides: Self = serde_yaml::from_str(yaml)?;
        // Stop entries may be full URIs
        overrides.stop_uris = overrides
            .stop_uris
            .into_iter()
            .map(|uri| last_segment(&uri).to_string())
            .collect();
        Ok(overrides)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CrawlError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn is_stopped(&self, resource: &str) -> bool {
        self.stop_uris.contains(resource)
    }

    pub fn url_override(&self, resource: &str) -> Option<&str> {
        self.url_overrides.get(resource).map(String::as_str)
    }

    /// Substitute `subject` bindings for a resource, if configured
    pub fn fallback(&self, resource: &str) -> Option<Vec<Binding>> {
        let subjects = self.fallbacks.get(resource)?;
        Some(
            subjects
                .iter()
                .map(|s| {
                    Binding::from([("subject".to_string(), format!("{}{}", RESOURCE_PREFIX, s))])
                })
                .collect(),
        )
    }
}

/// Last path segment of a URI
pub fn last_segment(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_overrides_load() {
        let overrides = ResourceOverrides::bundled().unwrap();
        assert!(overrides.version >= 1);
        assert!(overrides.is_stopped("Category:Main_topic_classifications"));
        assert_eq!(
            overrides.url_override("named entity recognition"),
            Some("Named-entity_recognition")
        );
        assert_eq!(overrides.fallback("gradient boosting").map(|f| f.len()), Some(2));
        assert!(overrides.fallback("neural network").is_none());
    }

    #[test]
    fn stop_uris_are_normalized_to_segments() {
        let overrides = ResourceOverrides::from_yaml(
            "version: 2\nstop_uris:\n  - http://dbpedia.org/resource/Category:Concepts\n",
        )
        .unwrap();
        assert_eq!(overrides.version, 2);
        assert!(overrides.is_stopped("Category:Concepts"));
        assert!(overrides.url_overrides.is_empty());
    }

    #[test]
    fn last_segment_of_uri() {
        assert_eq!(last_segment("http://dbpedia.org/resource/Category:AI"), "Category:AI");
        assert_eq!(last_segment("Category:AI"), "Category:AI");
    }
}
