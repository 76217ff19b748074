//! Common test utilities for corpus service tests
//!
//! Builds services over in-memory stores, plus sample article texts.

#![allow(dead_code)]

use collocate::dbpedia::{CachePolicy, Crawler, GraphCache, MockClient, ResourceOverrides};
use collocate::{ClusterId, CorpusService, MemoryIndex, OpenStore, SqliteStore};
use std::path::Path;
use std::sync::Arc;

/// "neural network" five times, every other phrase at most once.
pub const NEURAL_NETWORKS: &str = "Neural network training is slow. \
    A neural network has layers. \
    The neural network weights are learned. \
    Each neural network is different. \
    Neural network models generalize.";

/// "neural network model" three times and "neural network" alone three times.
pub const NEURAL_NETWORK_MODELS: &str = "Neural network model works. \
    Neural network model scales. \
    Neural network model wins. \
    Neural network training. \
    Neural network layers. \
    Neural network weights.";

/// "deep learning" twice: below the extraction threshold on its own.
pub const DEEP_LEARNING_TWICE: &str = "Deep learning helps vision. \
    Speech also benefits from deep learning.";

/// "deep learning" three times.
pub const DEEP_LEARNING_THRICE: &str = "Deep learning is popular. \
    Deep learning needs data. \
    Many use deep learning today.";

/// Normalized form of a phrase as stored on computer science rows
pub fn stemmed(phrase: &str) -> String {
    ClusterId::ComputerScience.default_stem_method().stem_text(phrase)
}

/// Service over an in-memory store with no crawler
pub fn create_test_service() -> CorpusService {
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    CorpusService::new(Arc::new(store), Arc::new(MemoryIndex::new()))
}

/// Service with a crawler over `client` and a graph cache in `cache_dir`
pub fn create_crawling_service(
    client: Arc<MockClient>,
    cache_dir: &Path,
    policy: CachePolicy,
) -> CorpusService {
    let overrides = ResourceOverrides::bundled().expect("bundled overrides");
    create_test_service()
        .with_crawler(Crawler::new(client, overrides))
        .with_graph_cache(GraphCache::new(cache_dir).with_policy(policy))
}

/// Mock endpoint answering for "neural network" and "decision tree"
pub fn sample_client() -> MockClient {
    MockClient::new()
        .with_values(
            "Neural_network",
            "subject",
            &["Category:Machine_learning", "Category:Main_topic_classifications"],
        )
        .with_values(
            "Category:Machine_learning",
            "broader",
            &["Category:Artificial_intelligence"],
        )
        .with_values(
            "Category:Artificial_intelligence",
            "broader",
            &["Category:Computer_science"],
        )
        .with_values("Decision_tree", "subject", &["Category:Classification_algorithms"])
}
