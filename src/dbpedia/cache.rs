//! Per-article cache of crawled category graphs
//!
//! Graphs are stored as node-link JSON files named `{article_id}.dbpedia.json`
//! and carry a content key derived from the crawl inputs.

use super::graph::{CategoryGraph, NodeLinkGraph};
use crate::corpus::ArticleId;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors from the graph cache
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What to do with a cached graph whose key no longer matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Keep serving the cached graph, logging a warning
    #[default]
    ReuseStale,
    /// Crawl again and replace the file
    Rebuild,
}

/// Content key of a crawl: seeds (order-insensitive), depth and overrides version
pub fn cache_key(seeds: &[String], depth: usize, overrides_version: u32) -> String {
    let mut sorted: Vec<&str> = seeds.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let material = format!(
        "depth={}\nversion={}\n{}",
        depth,
        overrides_version,
        sorted.join("\n")
    );
    Uuid::new_v5(&Uuid::NAMESPACE_OID, material.as_bytes()).to_string()
}

/// A graph read back from the cache
#[derive(Debug, Clone)]
pub struct CachedGraph {
    pub graph: CategoryGraph,
    /// Key stored with the graph; files written without one have `None`
    pub key: Option<String>,
}

/// Directory of cached graphs
#[derive(Debug, Clone)]
pub struct GraphCache {
    dir: PathBuf,
    policy: CachePolicy,
}

impl GraphCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            policy: CachePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn path(&self, article_id: ArticleId) -> PathBuf {
        self.dir.join(format!("{}.dbpedia.json", article_id))
    }

    pub fn load(&self, article_id: ArticleId) -> Result<Option<CachedGraph>, CacheError> {
        let path = self.path(article_id);
        if !path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path)?;
        let doc: NodeLinkGraph = serde_json::from_str(&json)?;
        Ok(Some(CachedGraph {
            graph: CategoryGraph::from_node_link(&doc),
            key: doc.key,
        }))
    }

    /// Write a graph through a temporary file and rename it into place.
    pub fn store(
        &self,
        article_id: ArticleId,
        graph: &CategoryGraph,
        key: &str,
    ) -> Result<PathBuf, CacheError> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.path(article_id);
        let tmp = self
            .dir
            .join(format!(".{}.dbpedia.json.{}", article_id, Uuid::new_v4()));

        let json = serde_json::to_string(&graph.to_node_link(Some(key.to_string())))?;
        let result = std::fs::File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(json.as_bytes())?;
                file.sync_all()
            })
            .and_then(|_| std::fs::rename(&tmp, &path));

        if let Err(e) = result {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(article_id, path = %path.display(), "Cached category graph");
        Ok(path)
    }

    /// Remove the cached graph of an article
    pub fn invalidate(&self, article_id: ArticleId) -> Result<bool, CacheError> {
        match std::fs::remove_file(self.path(article_id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// The cached graph of an article, building and storing it on a miss.
    ///
    /// A cached graph with a different key is handled by the cache policy.
    pub async fn get_or_build<F, Fut>(
        &self,
        article_id: ArticleId,
        key: &str,
        build: F,
    ) -> Result<CategoryGraph, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CategoryGraph>,
    {
        if let Some(cached) = self.load(article_id)? {
            if cached.key.as_deref() == Some(key) {
                return Ok(cached.graph);
            }
            match self.policy {
                CachePolicy::ReuseStale => {
                    warn!(
                        article_id,
                        cached_key = cached.key.as_deref().unwrap_or("-"),
                        key,
                        "Reusing stale category graph"
                    );
                    return Ok(cached.graph);
                }
                CachePolicy::Rebuild => {
                    debug!(article_id, "Rebuilding stale category graph");
                }
            }
        }

        let graph = build().await;
        self.store(article_id, &graph, key)?;
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbpedia::graph::Relation;
    use tempfile::TempDir;

    fn graph(target: &str) -> CategoryGraph {
        let mut graph = CategoryGraph::new();
        graph.add_edge("machine learning", target, Relation::Subject);
        graph
    }

    fn seeds(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_key_ignores_seed_order() {
        let a = cache_key(&seeds(&["b", "a"]), 2, 1);
        let b = cache_key(&seeds(&["a", "b"]), 2, 1);
        assert_eq!(a, b);
        assert_ne!(a, cache_key(&seeds(&["a", "b"]), 3, 1));
        assert_ne!(a, cache_key(&seeds(&["a", "b"]), 2, 2));
    }

    #[test]
    fn test_store_and_load() {
        let dir = TempDir::new().unwrap();
        let cache = GraphCache::new(dir.path());

        let path = cache.store(7, &graph("Category:Machine_learning"), "k1").unwrap();
        assert!(path.ends_with("7.dbpedia.json"));

        let cached = cache.load(7).unwrap().unwrap();
        assert_eq!(cached.key.as_deref(), Some("k1"));
        assert_eq!(cached.graph.node_count(), 2);

        // only the final file remains
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_invalidate() {
        let dir = TempDir::new().unwrap();
        let cache = GraphCache::new(dir.path());
        cache.store(1, &graph("Category:A"), "k").unwrap();

        assert!(cache.invalidate(1).unwrap());
        assert!(!cache.invalidate(1).unwrap());
        assert!(cache.load(1).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_graph_is_reused_by_default() {
        let dir = TempDir::new().unwrap();
        let cache = GraphCache::new(dir.path());
        cache.store(1, &graph("Category:Old"), "old-key").unwrap();

        let result = cache
            .get_or_build(1, "new-key", || async { graph("Category:New") })
            .await
            .unwrap();
        assert!(result.contains_node("Category:Old"));
    }

    #[tokio::test]
    async fn test_stale_graph_is_rebuilt_on_request() {
        let dir = TempDir::new().unwrap();
        let cache = GraphCache::new(dir.path()).with_policy(CachePolicy::Rebuild);
        cache.store(1, &graph("Category:Old"), "old-key").unwrap();

        let result = cache
            .get_or_build(1, "new-key", || async { graph("Category:New") })
            .await
            .unwrap();
        assert!(result.contains_node("Category:New"));
        assert_eq!(cache.load(1).unwrap().unwrap().key.as_deref(), Some("new-key"));
    }

    #[tokio::test]
    async fn test_matching_key_skips_build() {
        let dir = TempDir::new().unwrap();
        let cache = GraphCache::new(dir.path()).with_policy(CachePolicy::Rebuild);
        cache.store(1, &graph("Category:Old"), "key").unwrap();

        let result = cache
            .get_or_build(1, "key", || async { graph("Category:New") })
            .await
            .unwrap();
        assert!(result.contains_node("Category:Old"));
        assert!(!result.contains_node("Category:New"));
    }
}
