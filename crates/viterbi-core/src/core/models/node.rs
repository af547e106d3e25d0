use super::ids::{NodeId, QueryId};

/// The two kinds of node in a bipartite probability graph.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A binary unknown. `prior[0]` weights the false state, `prior[1]` the true state.
    Variable { query_id: QueryId, prior: [f64; 2] },
    /// A non-negative weight table over the node's `k` neighbors.
    ///
    /// Bit `i` of a table index selects the state of neighbor edge `i`, with the
    /// first edge as the least-significant bit, so the table has `2^k` entries.
    Factor { table: Vec<f64> },
}

impl NodeKind {
    /// Number of table entries for a factor, or the two prior states for a variable.
    pub fn state_count(&self) -> usize {
        match self {
            NodeKind::Variable { .. } => 2,
            NodeKind::Factor { table } => table.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub name: String,
    pub neighbors: Vec<NodeId>,
    pub kind: NodeKind,
}

impl GraphNode {
    pub fn new_variable(id: NodeId, name: &str, query_id: QueryId, prior: [f64; 2]) -> Self {
        Self {
            id,
            name: name.to_string(),
            neighbors: Vec::new(),
            kind: NodeKind::Variable { query_id, prior },
        }
    }

    pub fn new_factor(id: NodeId, name: &str, neighbors: Vec<NodeId>, table: Vec<f64>) -> Self {
        Self {
            id,
            name: name.to_string(),
            neighbors,
            kind: NodeKind::Factor { table },
        }
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    pub fn is_variable(&self) -> bool {
        matches!(self.kind, NodeKind::Variable { .. })
    }

    #[inline]
    pub fn is_factor(&self) -> bool {
        matches!(self.kind, NodeKind::Factor { .. })
    }

    /// Returns the query id when this node is a variable.
    pub fn query_id(&self) -> Option<QueryId> {
        match self.kind {
            NodeKind::Variable { query_id, .. } => Some(query_id),
            NodeKind::Factor { .. } => None,
        }
    }
}
