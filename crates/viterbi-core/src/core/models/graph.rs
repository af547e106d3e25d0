use super::ids::{NodeId, QueryId};
use super::node::GraphNode;
use std::collections::HashMap;
use thiserror::Error;

/// Read-only view of a bipartite probability graph as consumed by the engine.
///
/// Implementors must hand out nodes whose ids are dense (`0..node_count()`)
/// and whose neighbor lists are symmetric: if `a` lists `b`, then `b` lists `a`.
/// The graph is never mutated during an evaluation, so a single instance can be
/// shared across threads that each own their own workspace.
pub trait ProbabilityGraph {
    /// Number of nodes (variables and factors) in the graph.
    fn node_count(&self) -> usize;

    /// Looks up a node by its dense id.
    fn node(&self, id: NodeId) -> Option<&GraphNode>;

    /// Extent of the query id space, used to size decision outputs.
    fn query_size(&self) -> usize;
}

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Duplicate node name '{0}'")]
    DuplicateName(String),

    #[error("Query id {query_id} is already bound to variable '{existing}'")]
    DuplicateQueryId { query_id: QueryId, existing: String },

    #[error("Invalid prior for variable '{name}': weights must be finite and non-negative")]
    InvalidPrior { name: String },

    #[error("Factor '{name}' references unknown node {neighbor}")]
    UnknownNeighbor { name: String, neighbor: NodeId },

    #[error("Factor '{name}' may only connect variables, but node {neighbor} is a factor")]
    NotBipartite { name: String, neighbor: NodeId },

    #[error("Factor '{name}' has {actual} table entries, expected {expected} for {edges} neighbor(s)")]
    TableSize {
        name: String,
        edges: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Factor '{name}' has an invalid weight at index {index}: weights must be finite and non-negative")]
    InvalidWeight { name: String, index: usize },
}

/// Arena-backed factor graph with name lookup.
///
/// Nodes are stored in insertion order; a node's position is its [`NodeId`].
#[derive(Debug, Clone, Default)]
pub struct FactorGraph {
    nodes: Vec<GraphNode>,
    names: HashMap<String, NodeId>,
    query_names: HashMap<QueryId, NodeId>,
    query_size: usize,
}

impl FactorGraph {
    pub fn builder() -> FactorGraphBuilder {
        FactorGraphBuilder::default()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Returns an iterator over all variable nodes in insertion order.
    pub fn variables(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(|node| node.is_variable())
    }

    /// Returns an iterator over all factor nodes in insertion order.
    pub fn factors(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(|node| node.is_factor())
    }

    /// Finds any node (variable or factor) by name.
    pub fn node_by_name(&self, name: &str) -> Option<&GraphNode> {
        self.names.get(name).map(|id| &self.nodes[id.index()])
    }

    /// Finds a variable by name, returning `None` for factors.
    pub fn variable_by_name(&self, name: &str) -> Option<&GraphNode> {
        self.node_by_name(name).filter(|node| node.is_variable())
    }

    /// Resolves a query id back to the name of the variable that owns it.
    pub fn query_id_name(&self, query_id: QueryId) -> Option<&str> {
        self.query_names
            .get(&query_id)
            .map(|id| self.nodes[id.index()].name.as_str())
    }
}

impl ProbabilityGraph for FactorGraph {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id.index())
    }

    fn query_size(&self) -> usize {
        self.query_size
    }
}

/// Incrementally assembles a [`FactorGraph`], validating every node as it is added.
#[derive(Debug, Default)]
pub struct FactorGraphBuilder {
    graph: FactorGraph,
}

impl FactorGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binary variable.
    ///
    /// # Arguments
    ///
    /// * `name` - Unique node name.
    /// * `query_id` - Slot of this variable in queries and decision outputs.
    /// * `prior` - Likelihood weights for the false and true states.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] when the name or query id is already taken, or when
    /// the prior contains a negative or non-finite weight.
    pub fn add_variable(
        &mut self,
        name: &str,
        query_id: QueryId,
        prior: [f64; 2],
    ) -> Result<NodeId, GraphError> {
        if self.graph.names.contains_key(name) {
            return Err(GraphError::DuplicateName(name.to_string()));
        }
        if let Some(existing) = self.graph.query_names.get(&query_id) {
            return Err(GraphError::DuplicateQueryId {
                query_id,
                existing: self.graph.nodes[existing.index()].name.clone(),
            });
        }
        if !prior.iter().all(|w| is_valid_weight(*w)) {
            return Err(GraphError::InvalidPrior {
                name: name.to_string(),
            });
        }

        let id = NodeId(self.graph.nodes.len());
        self.graph
            .nodes
            .push(GraphNode::new_variable(id, name, query_id, prior));
        self.graph.names.insert(name.to_string(), id);
        self.graph.query_names.insert(query_id, id);
        self.graph.query_size = self.graph.query_size.max(query_id.index() + 1);
        Ok(id)
    }

    /// Adds a factor connecting the given variables.
    ///
    /// The table is indexed with neighbor `i` on bit `i`, so it must hold exactly
    /// `2^neighbors.len()` weights. The factor is appended to each neighbor's edge
    /// list, which keeps edges symmetric.
    pub fn add_factor(
        &mut self,
        name: &str,
        neighbors: &[NodeId],
        table: Vec<f64>,
    ) -> Result<NodeId, GraphError> {
        if self.graph.names.contains_key(name) {
            return Err(GraphError::DuplicateName(name.to_string()));
        }

        let expected = 1usize
            .checked_shl(neighbors.len() as u32)
            .unwrap_or(usize::MAX);
        if table.len() != expected {
            return Err(GraphError::TableSize {
                name: name.to_string(),
                edges: neighbors.len(),
                expected,
                actual: table.len(),
            });
        }
        if let Some(index) = table.iter().position(|w| !is_valid_weight(*w)) {
            return Err(GraphError::InvalidWeight {
                name: name.to_string(),
                index,
            });
        }
        for &neighbor in neighbors {
            match self.graph.nodes.get(neighbor.index()) {
                None => {
                    return Err(GraphError::UnknownNeighbor {
                        name: name.to_string(),
                        neighbor,
                    });
                }
                Some(node) if !node.is_variable() => {
                    return Err(GraphError::NotBipartite {
                        name: name.to_string(),
                        neighbor,
                    });
                }
                Some(_) => {}
            }
        }

        let id = NodeId(self.graph.nodes.len());
        for &neighbor in neighbors {
            self.graph.nodes[neighbor.index()].neighbors.push(id);
        }
        self.graph
            .nodes
            .push(GraphNode::new_factor(id, name, neighbors.to_vec(), table));
        self.graph.names.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn build(self) -> FactorGraph {
        self.graph
    }
}

#[inline]
fn is_valid_weight(w: f64) -> bool {
    w.is_finite() && w >= 0.0
}
