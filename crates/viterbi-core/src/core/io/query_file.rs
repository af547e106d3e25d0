use crate::core::models::graph::{FactorGraph, ProbabilityGraph};
use crate::core::models::query::{Evidence, GraphQuery, QueryError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
enum EvidenceValue {
    Flag(bool),
    Probability(f64),
    Keyword(String),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
struct QueryEntry {
    name: String,
    #[serde(default)]
    evidence: BTreeMap<String, EvidenceValue>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
struct QueryDocument {
    #[serde(default)]
    queries: Vec<QueryEntry>,
}

#[derive(Debug, Error)]
pub enum QueryFileError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Query '{query}' sets evidence on unknown variable '{variable}'")]
    UnknownVariable { query: String, variable: String },
    #[error("Query '{query}' has unrecognised evidence '{value}' for variable '{variable}'")]
    InvalidEvidence {
        query: String,
        variable: String,
        value: String,
    },
    #[error("Query '{query}': {source}")]
    Query { query: String, source: QueryError },
}

/// A query together with the label it was declared under.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedQuery {
    pub name: String,
    pub query: GraphQuery,
}

/// Loader for batches of queries against a named graph.
///
/// ```toml
/// [[queries]]
/// name = "baseline"
///
/// [queries.evidence]
/// a = true
/// b = 0.25         # partial evidence
/// c = "unknown"
/// ```
pub struct QueryFile;

impl QueryFile {
    pub fn load(path: &Path, graph: &FactorGraph) -> Result<Vec<NamedQuery>, QueryFileError> {
        let content = std::fs::read_to_string(path).map_err(|e| QueryFileError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let document: QueryDocument =
            toml::from_str(&content).map_err(|e| QueryFileError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
        Self::resolve(document, graph)
    }

    pub fn from_toml_str(
        content: &str,
        graph: &FactorGraph,
    ) -> Result<Vec<NamedQuery>, QueryFileError> {
        let document: QueryDocument =
            toml::from_str(content).map_err(|e| QueryFileError::Toml {
                path: "<inline>".to_string(),
                source: e,
            })?;
        Self::resolve(document, graph)
    }

    fn resolve(
        document: QueryDocument,
        graph: &FactorGraph,
    ) -> Result<Vec<NamedQuery>, QueryFileError> {
        document
            .queries
            .into_iter()
            .map(|entry| {
                let mut query = GraphQuery::new(graph.query_size());
                for (variable, value) in &entry.evidence {
                    let query_id = graph
                        .variable_by_name(variable)
                        .and_then(|node| node.query_id())
                        .ok_or_else(|| QueryFileError::UnknownVariable {
                            query: entry.name.clone(),
                            variable: variable.clone(),
                        })?;
                    let evidence = parse_evidence(value).ok_or_else(|| {
                        QueryFileError::InvalidEvidence {
                            query: entry.name.clone(),
                            variable: variable.clone(),
                            value: format!("{value:?}"),
                        }
                    })?;
                    query
                        .set(query_id, evidence)
                        .map_err(|source| QueryFileError::Query {
                            query: entry.name.clone(),
                            source,
                        })?;
                }
                Ok(NamedQuery {
                    name: entry.name,
                    query,
                })
            })
            .collect()
    }
}

fn parse_evidence(value: &EvidenceValue) -> Option<Evidence> {
    match value {
        EvidenceValue::Flag(true) => Some(Evidence::True),
        EvidenceValue::Flag(false) => Some(Evidence::False),
        EvidenceValue::Probability(p) => Some(Evidence::Partial(*p)),
        EvidenceValue::Keyword(word) => match word.to_ascii_lowercase().as_str() {
            "true" | "t" => Some(Evidence::True),
            "false" | "f" => Some(Evidence::False),
            "unknown" | "free" => Some(Evidence::Unknown),
            _ => None,
        },
    }
}
