//! DBpedia category graphs around an article's collocations
//!
//! - `client`: the query trait and a mock
//! - `sparql`: HTTP transport with retries
//! - `crawler`: depth-bounded expansion with stop-list and fallbacks
//! - `cache`: per-article node-link files keyed by crawl inputs

mod cache;
mod client;
mod crawler;
mod graph;
mod overrides;
mod sparql;

pub use cache::{cache_key, CacheError, CachePolicy, CachedGraph, GraphCache};
pub use client::{Binding, KnowledgeGraphClient, MockClient, QueryError, RESOURCE_PREFIX};
pub use crawler::{
    capitalized_form, category_query, concept_query, title_form, CrawlStats, Crawler,
    DEFAULT_DEPTH,
};
pub use graph::{is_category, CategoryGraph, GraphEdge, NodeLinkGraph, NodeLinkNode, Relation};
pub use overrides::{last_segment, ResourceOverrides};
pub use sparql::{parse_results, SparqlClient, SparqlConfig, DEFAULT_ENDPOINT};

use thiserror::Error;

/// Errors setting up a crawl
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Invalid overrides: {0}")]
    Overrides(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
