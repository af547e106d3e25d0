use crate::core::models::graph::{FactorGraph, GraphError};
use crate::core::models::ids::{NodeId, QueryId};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const DEFAULT_PRIOR: [f64; 2] = [1.0, 1.0];

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct VariableEntry {
    name: String,
    query_id: Option<usize>,
    prior: Option<[f64; 2]>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FactorEntry {
    name: String,
    #[serde(default)]
    neighbors: Vec<String>,
    table: Vec<f64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
struct GraphDocument {
    #[serde(default)]
    variables: Vec<VariableEntry>,
    #[serde(default)]
    factors: Vec<FactorEntry>,
}

#[derive(Debug, Error)]
pub enum GraphFileError {
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
    #[error("Factor '{factor}' refers to unknown variable '{variable}'")]
    UnknownVariable { factor: String, variable: String },
    #[error("Invalid graph: {0}")]
    Graph(#[from] GraphError),
}

/// Loader for the TOML graph description format.
///
/// ```toml
/// [[variables]]
/// name = "a"
/// query-id = 0          # optional, defaults to the declaration position
/// prior = [1.0, 1.0]    # optional, weights for (false, true)
///
/// [[factors]]
/// name = "same"
/// neighbors = ["a", "b"]
/// table = [1.0, 0.0, 0.0, 1.0]
/// ```
///
/// Variables receive node ids in declaration order, followed by factors.
pub struct GraphFile;

impl GraphFile {
    pub fn load(path: &Path) -> Result<FactorGraph, GraphFileError> {
        let content = std::fs::read_to_string(path).map_err(|e| GraphFileError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let document: GraphDocument =
            toml::from_str(&content).map_err(|e| GraphFileError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
        Self::assemble(document)
    }

    pub fn from_toml_str(content: &str) -> Result<FactorGraph, GraphFileError> {
        let document: GraphDocument =
            toml::from_str(content).map_err(|e| GraphFileError::Toml {
                path: "<inline>".to_string(),
                source: e,
            })?;
        Self::assemble(document)
    }

    fn assemble(document: GraphDocument) -> Result<FactorGraph, GraphFileError> {
        let mut builder = FactorGraph::builder();

        for (position, variable) in document.variables.iter().enumerate() {
            let query_id = QueryId(variable.query_id.unwrap_or(position));
            builder.add_variable(
                &variable.name,
                query_id,
                variable.prior.unwrap_or(DEFAULT_PRIOR),
            )?;
        }

        // Variables occupy the leading node ids in declaration order.
        let lookup = |factor: &FactorEntry, variable: &str| {
            document
                .variables
                .iter()
                .position(|v| v.name == variable)
                .map(NodeId)
                .ok_or_else(|| GraphFileError::UnknownVariable {
                    factor: factor.name.clone(),
                    variable: variable.to_string(),
                })
        };

        for factor in &document.factors {
            let neighbors = factor
                .neighbors
                .iter()
                .map(|name| lookup(factor, name))
                .collect::<Result<Vec<_>, _>>()?;
            builder.add_factor(&factor.name, &neighbors, factor.table.clone())?;
        }

        let graph = builder.build();
        debug!(
            variables = document.variables.len(),
            factors = document.factors.len(),
            "Assembled factor graph from TOML description."
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::graph::ProbabilityGraph;
    use crate::core::models::node::NodeKind;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const CHAIN: &str = r#"
        [[variables]]
        name = "a"

        [[variables]]
        name = "b"
        query-id = 7
        prior = [0.5, 2.0]

        [[factors]]
        name = "same"
        neighbors = ["a", "b"]
        table = [1.0, 0.0, 0.0, 1.0]
    "#;

    #[test]
    fn from_toml_str_builds_graph_in_declaration_order() {
        let graph = GraphFile::from_toml_str(CHAIN).unwrap();

        assert_eq!(graph.node_count(), 3);
        let a = graph.variable_by_name("a").unwrap();
        let b = graph.variable_by_name("b").unwrap();
        let same = graph.node_by_name("same").unwrap();
        assert_eq!(a.id, NodeId(0));
        assert_eq!(b.id, NodeId(1));
        assert_eq!(same.id, NodeId(2));
        assert_eq!(same.neighbors, vec![NodeId(0), NodeId(1)]);
        assert_eq!(a.query_id(), Some(QueryId(0)));
        assert_eq!(b.query_id(), Some(QueryId(7)));
        assert_eq!(graph.query_size(), 8);
        assert_eq!(
            b.kind,
            NodeKind::Variable {
                query_id: QueryId(7),
                prior: [0.5, 2.0]
            }
        );
    }

    #[test]
    fn load_reads_graph_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.toml");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{}", CHAIN).unwrap();

        let graph = GraphFile::load(&path).unwrap();
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempdir().unwrap();
        let result = GraphFile::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(GraphFileError::Io { .. })));
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let result = GraphFile::from_toml_str(
            r#"
            [[variables]]
            name = "a"
            weight = 3.0
        "#,
        );
        assert!(matches!(result, Err(GraphFileError::Toml { .. })));
    }

    #[test]
    fn factor_naming_unknown_variable_is_rejected() {
        let result = GraphFile::from_toml_str(
            r#"
            [[variables]]
            name = "a"

            [[factors]]
            name = "f"
            neighbors = ["a", "ghost"]
            table = [1.0, 1.0, 1.0, 1.0]
        "#,
        );
        match result {
            Err(GraphFileError::UnknownVariable { factor, variable }) => {
                assert_eq!(factor, "f");
                assert_eq!(variable, "ghost");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn builder_validation_errors_are_propagated() {
        let result = GraphFile::from_toml_str(
            r#"
            [[variables]]
            name = "a"

            [[factors]]
            name = "f"
            neighbors = ["a"]
            table = [1.0, 1.0, 1.0]
        "#,
        );
        assert!(matches!(
            result,
            Err(GraphFileError::Graph(GraphError::TableSize { .. }))
        ));
    }
}
