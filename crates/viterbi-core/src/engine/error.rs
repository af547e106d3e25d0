use super::config::ConfigError;
use crate::core::models::ids::{NodeId, QueryId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Graph is not a forest: node {node} still has {unvisited} unvisited neighbors after scheduling")]
    NotAForest { node: NodeId, unvisited: usize },

    #[error("Malformed node {node}: {reason}")]
    MalformedNode { node: NodeId, reason: String },

    #[error("Variable node {node} uses query id {query_id}, but the query only has {query_size} slot(s)")]
    QueryOutOfRange {
        node: NodeId,
        query_id: QueryId,
        query_size: usize,
    },

    #[error("Invalid engine configuration: {0}")]
    Config(#[from] ConfigError),
}
