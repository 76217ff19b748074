//! Knowledge-graph query client
//!
//! Defines the client trait the crawler queries through. Two
//! implementations:
//! - `SparqlClient`: HTTP against a SPARQL endpoint (production)
//! - `MockClient`: canned bindings per resource (testing)

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// One solution of a SELECT query: variable name to bound value
pub type Binding = BTreeMap<String, String>;

/// Prefix of DBpedia resource URIs
pub const RESOURCE_PREFIX: &str = "http://dbpedia.org/resource/";

/// Errors from knowledge-graph queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Timeouts, connection failures, 5xx and rate limiting
    #[error("recoverable query failure: {0}")]
    Recoverable(String),
    /// Malformed query, 4xx or an unreadable response
    #[error("permanent query failure: {0}")]
    Permanent(String),
}

impl QueryError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, QueryError::Recoverable(_))
    }
}

/// Client trait for SELECT queries against a knowledge graph.
#[async_trait]
pub trait KnowledgeGraphClient: Send + Sync {
    /// Run a SELECT query and return its bindings.
    async fn select(&self, query: &str) -> Result<Vec<Binding>, QueryError>;
}

/// Mock client for testing: answers with the bindings registered for every
/// resource the query mentions, and records each query it receives.
#[derive(Debug, Default)]
pub struct MockClient {
    responses: HashMap<String, Vec<Binding>>,
    failures: HashMap<String, QueryError>,
    queries: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bindings of `variable` for a resource (URI path segment,
    /// e.g. `Machine_learning` or `Category:Machine_learning`).
    pub fn with_values(
        mut self,
        resource: impl Into<String>,
        variable: &str,
        values: &[&str],
    ) -> Self {
        let bindings = self.responses.entry(resource.into()).or_default();
        for value in values {
            bindings.push(Binding::from([(
                variable.to_string(),
                format!("{}{}", RESOURCE_PREFIX, value),
            )]));
        }
        self
    }

    /// Make every query mentioning `resource` fail.
    pub fn with_failure(mut self, resource: impl Into<String>, error: QueryError) -> Self {
        self.failures.insert(resource.into(), error);
        self
    }

    /// Queries received so far, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn mentions(query: &str, resource: &str) -> bool {
        query.contains(&format!("<{}{}>", RESOURCE_PREFIX, resource))
    }
}

#[async_trait]
impl KnowledgeGraphClient for MockClient {
    async fn select(&self, query: &str) -> Result<Vec<Binding>, QueryError> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.to_string());

        if let Some(error) = self
            .failures
            .iter()
            .find(|(resource, _)| Self::mentions(query, resource))
            .map(|(_, error)| error.clone())
        {
            return Err(error);
        }

        let mut resources: Vec<&String> = self
            .responses
            .keys()
            .filter(|resource| Self::mentions(query, resource))
            .collect();
        resources.sort();

        Ok(resources
            .into_iter()
            .flat_map(|resource| self.responses[resource].iter().cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_answers_mentioned_resources() {
        let client = MockClient::new()
            .with_values("Machine_learning", "subject", &["Category:Machine_learning"])
            .with_values("Decision_tree", "subject", &["Category:Decision_trees"]);

        let query = format!("SELECT ?subject WHERE {{ <{}Machine_learning> ?p ?subject }}", RESOURCE_PREFIX);
        let bindings = client.select(&query).await.unwrap();

        assert_eq!(bindings.len(), 1);
        assert_eq!(
            bindings[0]["subject"],
            "http://dbpedia.org/resource/Category:Machine_learning"
        );
        assert_eq!(client.query_count(), 1);
    }

    #[tokio::test]
    async fn mock_does_not_match_prefixes() {
        let client = MockClient::new().with_values("Machine", "subject", &["Category:Machines"]);
        let query = format!("<{}Machine_learning>", RESOURCE_PREFIX);
        assert!(client.select(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mock_failure() {
        let client = MockClient::new()
            .with_failure("Machine_learning", QueryError::Permanent("bad".to_string()));
        let query = format!("<{}Machine_learning>", RESOURCE_PREFIX);
        let err = client.select(&query).await.unwrap_err();
        assert!(!err.is_recoverable());
    }
}
