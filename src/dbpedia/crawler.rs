//! Depth-bounded crawl of the DBpedia category graph

use super::client::{Binding, KnowledgeGraphClient, RESOURCE_PREFIX};
use super::graph::{is_category, CategoryGraph, Relation};
use super::overrides::{last_segment, ResourceOverrides};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default crawl depth from each seed
pub const DEFAULT_DEPTH: usize = 2;

const PREFIXES: &str = "PREFIX skos: <http://www.w3.org/2004/02/skos/core#>\n\
                        PREFIX dcterms: <http://purl.org/dc/terms/>\n";

/// Characters that cannot appear inside an IRI reference
const IRI_FORBIDDEN: &[char] = &['<', '>', '"', '{', '}', '|', '^', '`', '\\'];

/// `Capitalized_form` of a concept: first letter upper, rest lower
pub fn capitalized_form(resource: &str) -> String {
    let mut chars = resource.chars();
    let form = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    form.replace(' ', "_")
}

/// `Title_Cased_Form` of a concept: every word capitalized
pub fn title_form(resource: &str) -> String {
    let mut form = String::with_capacity(resource.len());
    let mut prev_alpha = false;
    for c in resource.chars() {
        if prev_alpha {
            form.extend(c.to_lowercase());
        } else {
            form.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
    }
    form.replace(' ', "_")
}

/// Query for the broader, narrower and related categories of a category
pub fn category_query(resource: &str) -> String {
    let uri = format!("<{}{}>", RESOURCE_PREFIX, resource);
    format!(
        "{PREFIXES}SELECT ?broader ?related ?broaderof WHERE {{ \
         {{ {uri} skos:broader ?broader }} \
         UNION {{ ?broaderof skos:broader {uri} }} \
         UNION {{ ?related skos:related {uri} }} \
         UNION {{ {uri} skos:related ?related }} }}"
    )
}

/// Query for the subjects of a concept under both of its URL forms
pub fn concept_query(capitalized: &str, titled: &str) -> String {
    let first = format!("<{}{}>", RESOURCE_PREFIX, capitalized);
    let second = format!("<{}{}>", RESOURCE_PREFIX, titled);
    format!(
        "{PREFIXES}SELECT ?subject WHERE {{ \
         {{ {first} dcterms:subject ?subject }} \
         UNION {{ ?subject dcterms:subject {first} }} \
         UNION {{ {second} dcterms:subject ?subject }} }}"
    )
}

/// Counters of one crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Queries sent to the client
    pub queries: usize,
    /// Queries answered from this crawl's memo
    pub memo_hits: usize,
    /// Resources skipped after a failed query
    pub skipped: usize,
    /// Empty results replaced by configured fallbacks
    pub fallbacks: usize,
}

/// One pending visit: the resource, its remaining depth and the edge that
/// led to it
struct Visit {
    resource: String,
    depth: usize,
    via: Option<(String, Relation)>,
}

/// Builds category graphs around seed concepts
pub struct Crawler {
    client: Arc<dyn KnowledgeGraphClient>,
    overrides: ResourceOverrides,
    depth: usize,
}

impl Crawler {
    pub fn new(client: Arc<dyn KnowledgeGraphClient>, overrides: ResourceOverrides) -> Self {
        Self {
            client,
            overrides,
            depth: DEFAULT_DEPTH,
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn overrides(&self) -> &ResourceOverrides {
        &self.overrides
    }

    /// Query text for a resource, or `None` if it cannot be expressed as an IRI
    pub fn query_for(&self, resource: &str) -> Option<String> {
        if resource.is_empty() || resource.contains(IRI_FORBIDDEN) {
            return None;
        }
        if is_category(resource) {
            if resource.contains(char::is_whitespace) {
                return None;
            }
            return Some(category_query(resource));
        }

        let capitalized = self
            .overrides
            .url_override(resource)
            .map(str::to_string)
            .unwrap_or_else(|| capitalized_form(resource));
        Some(concept_query(&capitalized, &title_form(resource)))
    }

    /// Crawl from every seed and merge the results into one graph.
    pub async fn crawl(&self, seeds: &[String]) -> (CategoryGraph, CrawlStats) {
        let mut graph = CategoryGraph::new();
        let mut stats = CrawlStats::default();
        let mut memo: HashMap<String, Vec<Binding>> = HashMap::new();

        for seed in seeds {
            self.crawl_seed(seed, &mut graph, &mut memo, &mut stats).await;
        }

        info!(
            seeds = seeds.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            queries = stats.queries,
            skipped = stats.skipped,
            "Crawled category graph"
        );

        (graph, stats)
    }

    async fn crawl_seed(
        &self,
        seed: &str,
        graph: &mut CategoryGraph,
        memo: &mut HashMap<String, Vec<Binding>>,
        stats: &mut CrawlStats,
    ) {
        // Depth-first, visiting neighbors in result order
        let mut stack = vec![Visit {
            resource: seed.to_string(),
            depth: self.depth,
            via: None,
        }];

        while let Some(visit) = stack.pop() {
            if let Some((parent, relation)) = &visit.via {
                graph.add_edge(parent, &visit.resource, *relation);
            }
            if self.overrides.is_stopped(&visit.resource) || visit.depth == 0 {
                continue;
            }

            let Some(bindings) = self.resolve(&visit.resource, memo, stats).await else {
                continue;
            };

            let mut children = Vec::new();
            for binding in &bindings {
                for (variable, value) in binding {
                    let Some(relation) = Relation::from_variable(variable) else {
                        continue;
                    };
                    children.push(Visit {
                        resource: last_segment(value).to_string(),
                        depth: visit.depth - 1,
                        via: Some((visit.resource.clone(), relation)),
                    });
                }
            }
            stack.extend(children.into_iter().rev());
        }
    }

    /// Bindings for a resource, with fallbacks applied. `None` when the
    /// resource is skipped.
    async fn resolve(
        &self,
        resource: &str,
        memo: &mut HashMap<String, Vec<Binding>>,
        stats: &mut CrawlStats,
    ) -> Option<Vec<Binding>> {
        let Some(query) = self.query_for(resource) else {
            warn!(resource, "Skipping resource that is not a valid IRI");
            stats.skipped += 1;
            return None;
        };

        let bindings = match memo.get(&query) {
            Some(cached) => {
                stats.memo_hits += 1;
                cached.clone()
            }
            None => {
                stats.queries += 1;
                match self.client.select(&query).await {
                    Ok(bindings) => {
                        memo.insert(query, bindings.clone());
                        bindings
                    }
                    Err(e) => {
                        warn!(resource, error = %e, "Skipping resource after failed query");
                        stats.skipped += 1;
                        return None;
                    }
                }
            }
        };

        if bindings.is_empty() {
            if let Some(fallback) = self.overrides.fallback(resource) {
                debug!(resource, "Using fallback subjects");
                stats.fallbacks += 1;
                return Some(fallback);
            }
        }
        Some(bindings)
    }
}
