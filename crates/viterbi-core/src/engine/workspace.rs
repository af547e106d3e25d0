use super::error::EngineError;
use crate::core::models::graph::ProbabilityGraph;
use crate::core::models::ids::NodeId;
use crate::core::models::node::{GraphNode, NodeKind};
use std::fmt;
use std::io::{self, Write};

/// Per-node evaluation state.
///
/// Index 0 of every two-element array refers to the false state, index 1 to the true state.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub(crate) unvisited_neighbors: usize,
    pub(crate) message_to: Option<NodeId>,
    pub(crate) queued: bool,

    pub(crate) message_forward: [f64; 2],
    pub(crate) message_reverse: [f64; 2],
    pub(crate) state_tracking: [usize; 2],
    pub(crate) best: usize,
    pub(crate) total: f64,
    pub(crate) ratio: Option<f64>,
    pub(crate) free_variable: bool,
}

impl Default for Datum {
    fn default() -> Self {
        Self {
            unvisited_neighbors: 0,
            message_to: None,
            queued: false,
            message_forward: [0.0, 0.0],
            // Roots never receive a reverse message; the identity keeps their products intact.
            message_reverse: [1.0, 1.0],
            state_tracking: [0, 1],
            best: 0,
            total: 0.0,
            ratio: None,
            free_variable: false,
        }
    }
}

impl Datum {
    /// The neighbor this node sends its forward message to, or `None` for a root.
    pub fn message_to(&self) -> Option<NodeId> {
        self.message_to
    }

    pub fn is_root(&self) -> bool {
        self.message_to.is_none()
    }

    pub fn unvisited_neighbors(&self) -> usize {
        self.unvisited_neighbors
    }

    pub fn message_forward(&self) -> [f64; 2] {
        self.message_forward
    }

    pub fn message_reverse(&self) -> [f64; 2] {
        self.message_reverse
    }

    /// Factor-table index achieving each outgoing state; `[0, 1]` for variables.
    pub fn state_tracking(&self) -> [usize; 2] {
        self.state_tracking
    }

    pub fn best(&self) -> usize {
        self.best
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// False/true likelihood ratio, populated only for free variables.
    pub fn ratio(&self) -> Option<f64> {
        self.ratio
    }

    pub fn is_free(&self) -> bool {
        self.free_variable
    }
}

/// Scratch state for one evaluation of a graph.
///
/// A workspace holds one [`Datum`] per graph node, addressed by [`NodeId`], plus the
/// leaf-to-root visitation order produced by the scheduler. It can be reused across
/// evaluations; every [`initialize`](Self::initialize) resets it for a new graph.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub(crate) data: Vec<Datum>,
    pub(crate) order: Vec<NodeId>,
    pub(crate) query_size: usize,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the workspace to hold one cleared datum per node of `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MalformedNode`] when a node is missing, reports an id
    /// other than its position, references a neighbor outside the graph, or is a
    /// factor whose table size is not `2^k` for its `k` neighbors.
    pub fn initialize<G>(&mut self, graph: &G) -> Result<(), EngineError>
    where
        G: ProbabilityGraph + ?Sized,
    {
        let num_nodes = graph.node_count();
        self.data.clear();
        self.order.clear();
        self.query_size = 0;
        self.data.reserve(num_nodes);

        for index in 0..num_nodes {
            let node = validated_node(graph, NodeId(index))?;
            self.data.push(Datum {
                unvisited_neighbors: node.num_edges(),
                ..Datum::default()
            });
        }
        Ok(())
    }

    /// Releases all per-node storage.
    pub fn dispose(&mut self) {
        self.data = Vec::new();
        self.order = Vec::new();
        self.query_size = 0;
    }

    /// Appends `id` to the visitation order unless it is already queued.
    pub fn enqueue(&mut self, id: NodeId) {
        let Some(datum) = self.data.get_mut(id.index()) else {
            return;
        };
        if datum.queued {
            return;
        }
        datum.queued = true;
        self.order.push(id);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn datum(&self, id: NodeId) -> Option<&Datum> {
        self.data.get(id.index())
    }

    /// Leaf-to-root visitation order; empty until the scheduler has run.
    pub fn visit_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Roots of each forest component, in visitation order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order
            .iter()
            .copied()
            .filter(|id| self.data[id.index()].is_root())
    }

    /// Whether `child` sends its forward message to `parent`.
    #[inline]
    pub(crate) fn is_child_of(&self, child: NodeId, parent: NodeId) -> bool {
        self.data[child.index()].message_to == Some(parent)
    }

    /// Writes the visitation order and every datum for debugging.
    pub fn dump(&self, writer: &mut impl Write) -> io::Result<()> {
        write!(writer, "{self}")
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Visit order (by NodeId)")?;
        for id in &self.order {
            write!(f, " {id}")?;
        }
        writeln!(f)?;

        for (index, datum) in self.data.iter().enumerate() {
            writeln!(f, "Node {index}")?;
            match datum.message_to {
                Some(to) => writeln!(f, "  message to: {to}")?,
                None => writeln!(f, "  message to: root")?,
            }
            writeln!(
                f,
                "  message[0]: {} state={}",
                datum.message_forward[0], datum.state_tracking[0]
            )?;
            writeln!(
                f,
                "  message[1]: {} state={}",
                datum.message_forward[1], datum.state_tracking[1]
            )?;
            writeln!(f, "  rmessage[0]: {}", datum.message_reverse[0])?;
            writeln!(f, "  rmessage[1]: {}", datum.message_reverse[1])?;
            writeln!(f, "  best: {}", datum.best)?;
            match datum.ratio {
                Some(ratio) => writeln!(f, "  ratio: {ratio}")?,
                None => writeln!(f, "  ratio: -")?,
            }
        }
        Ok(())
    }
}

/// Fetches a node and checks the structural contract the engine relies on.
pub(crate) fn validated_node<G>(graph: &G, id: NodeId) -> Result<&GraphNode, EngineError>
where
    G: ProbabilityGraph + ?Sized,
{
    let node = graph.node(id).ok_or_else(|| EngineError::MalformedNode {
        node: id,
        reason: "node is missing from the graph".to_string(),
    })?;
    if node.id != id {
        return Err(EngineError::MalformedNode {
            node: id,
            reason: format!("node reports id {} at position {}", node.id, id),
        });
    }
    if let Some(neighbor) = node
        .neighbors
        .iter()
        .find(|n| n.index() >= graph.node_count())
    {
        return Err(EngineError::MalformedNode {
            node: id,
            reason: format!("neighbor {neighbor} lies outside the graph"),
        });
    }
    if let NodeKind::Factor { table } = &node.kind {
        let expected = 1usize.checked_shl(node.num_edges() as u32);
        if expected != Some(table.len()) {
            return Err(EngineError::MalformedNode {
                node: id,
                reason: format!(
                    "factor table has {} entries for {} neighbor(s)",
                    table.len(),
                    node.num_edges()
                ),
            });
        }
    }
    Ok(node)
}

/// Looks up a node that [`Workspace::initialize`] has already validated.
pub(crate) fn node_at<G>(graph: &G, id: NodeId) -> Result<&GraphNode, EngineError>
where
    G: ProbabilityGraph + ?Sized,
{
    graph.node(id).ok_or_else(|| EngineError::MalformedNode {
        node: id,
        reason: "node disappeared from the graph during evaluation".to_string(),
    })
}
