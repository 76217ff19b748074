//! Undirected category graph with labelled edges

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Relation carried by an edge of the category graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// `skos:broader`, from a category to its parent
    Broader,
    /// `skos:broader` seen from the parent's side
    BroaderOf,
    /// `skos:related`, either direction
    Related,
    /// `dcterms:subject`, either direction
    Subject,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Broader => "broader",
            Relation::BroaderOf => "broaderof",
            Relation::Related => "related",
            Relation::Subject => "subject",
        }
    }

    /// The relation named by a SPARQL result variable
    pub fn from_variable(name: &str) -> Option<Self> {
        match name {
            "broader" => Some(Relation::Broader),
            "broaderof" => Some(Relation::BroaderOf),
            "related" => Some(Relation::Related),
            "subject" => Some(Relation::Subject),
            _ => None,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An edge between two resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub relation: Relation,
}

/// Whether a node name is a category rather than a concept
pub fn is_category(node: &str) -> bool {
    node.contains("Category")
}

/// Undirected graph of DBpedia resources and categories.
///
/// Adding an edge that already exists (in either direction) replaces its
/// relation. Nodes and edges keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct CategoryGraph {
    nodes: Vec<String>,
    node_index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    edge_index: HashMap<(usize, usize), usize>,
}

impl CategoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: impl Into<String>) -> usize {
        let node = node.into();
        if let Some(&idx) = self.node_index.get(&node) {
            return idx;
        }
        let idx = self.nodes.len();
        self.node_index.insert(node.clone(), idx);
        self.nodes.push(node);
        idx
    }

    pub fn add_edge(&mut self, source: &str, target: &str, relation: Relation) {
        let a = self.add_node(source);
        let b = self.add_node(target);
        let key = (a.min(b), a.max(b));

        match self.edge_index.get(&key) {
            Some(&idx) => self.edges[idx].relation = relation,
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(GraphEdge {
                    source: source.to_string(),
                    target: target.to_string(),
                    relation,
                });
            }
        }
    }

    pub fn contains_node(&self, node: &str) -> bool {
        self.node_index.contains_key(node)
    }

    /// Relation of the edge between two nodes, in either direction
    pub fn relation(&self, a: &str, b: &str) -> Option<Relation> {
        let a = *self.node_index.get(a)?;
        let b = *self.node_index.get(b)?;
        let idx = *self.edge_index.get(&(a.min(b), a.max(b)))?;
        Some(self.edges[idx].relation)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Connected components, in order of their first node
    pub fn connected_components(&self) -> Vec<BTreeSet<String>> {
        let mut adj: Vec<HashSet<usize>> = vec![HashSet::new(); self.nodes.len()];
        for edge in &self.edges {
            let a = self.node_index[&edge.source];
            let b = self.node_index[&edge.target];
            adj[a].insert(b);
            adj[b].insert(a);
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut components = Vec::new();

        for start in 0..self.nodes.len() {
            if visited[start] {
                continue;
            }

            let mut component = BTreeSet::new();
            let mut stack = vec![start];

            while let Some(current) = stack.pop() {
                if visited[current] {
                    continue;
                }
                visited[current] = true;
                component.insert(self.nodes[current].clone());

                for &neighbor in &adj[current] {
                    if !visited[neighbor] {
                        stack.push(neighbor);
                    }
                }
            }

            components.push(component);
        }

        components
    }

    /// Node-link document of this graph
    pub fn to_node_link(&self, key: Option<String>) -> NodeLinkGraph {
        NodeLinkGraph {
            directed: false,
            multigraph: false,
            graph: serde_json::Map::new(),
            nodes: self.nodes.iter().map(|id| NodeLinkNode { id: id.clone() }).collect(),
            links: self.edges.clone(),
            key,
        }
    }

    /// Rebuild a graph from its node-link document
    pub fn from_node_link(doc: &NodeLinkGraph) -> Self {
        let mut graph = Self::new();
        for node in &doc.nodes {
            graph.add_node(node.id.clone());
        }
        for link in &doc.links {
            graph.add_edge(&link.source, &link.target, link.relation);
        }
        graph
    }
}

/// A node entry of the node-link layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLinkNode {
    pub id: String,
}

/// JSON node-link layout of a graph, as written to the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkGraph {
    pub directed: bool,
    pub multigraph: bool,
    #[serde(default)]
    pub graph: serde_json::Map<String, serde_json::Value>,
    pub nodes: Vec<NodeLinkNode>,
    pub links: Vec<GraphEdge>,
    /// Content key of the crawl that produced the graph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}
