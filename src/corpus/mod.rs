//! Corpus data model

mod cluster;
mod types;

pub use cluster::ClusterId;
pub use types::{Article, ArticleCollocation, ArticleId, Collocation, NewArticle, Relevance};
