use super::error::EngineError;
use super::forward::{apply_evidence, lookup_evidence};
use super::workspace::{Workspace, node_at};
use crate::core::models::graph::ProbabilityGraph;
use crate::core::models::ids::NodeId;
use crate::core::models::node::NodeKind;
use crate::core::models::query::{Evidence, GraphQuery};
use tracing::{debug, trace};

/// Sends a reverse message down every parent-to-child edge, roots first.
///
/// The message a child receives summarizes everything outside its own subtree, so the
/// product of a variable's forward and reverse messages is the best joint probability
/// with that variable pinned to each state. Sibling contributions are multiplied in
/// one edge at a time instead of dividing a shared product, which keeps zero-weight
/// siblings from producing 0/0.
pub(crate) fn distribute_evidence<G>(
    graph: &G,
    workspace: &mut Workspace,
    query: &GraphQuery,
) -> Result<(), EngineError>
where
    G: ProbabilityGraph + ?Sized,
{
    for position in (0..workspace.order.len()).rev() {
        let id = workspace.order[position];
        let node = node_at(graph, id)?;

        match &node.kind {
            NodeKind::Variable { query_id, prior } => {
                let evidence = lookup_evidence(query, id, *query_id)?;
                compose_reverse_variable(workspace, id, &node.neighbors, *prior, evidence);
            }
            NodeKind::Factor { table } => {
                compose_reverse_factor(workspace, id, &node.neighbors, table);
            }
        }
        trace!(node = %id, "Reverse messages composed.");
    }

    debug!(nodes = workspace.order.len(), "Evidence distributed.");
    Ok(())
}

fn compose_reverse_variable(
    workspace: &mut Workspace,
    id: NodeId,
    neighbors: &[NodeId],
    prior: [f64; 2],
    evidence: Evidence,
) {
    let inbound = workspace.data[id.index()].message_reverse;
    let base = apply_evidence([prior[0] * inbound[0], prior[1] * inbound[1]], evidence);

    for (target_edge, &target) in neighbors.iter().enumerate() {
        if !workspace.is_child_of(target, id) {
            continue;
        }
        let mut message = base;
        for (edge, &sibling) in neighbors.iter().enumerate() {
            if edge != target_edge && workspace.is_child_of(sibling, id) {
                let incoming = workspace.data[sibling.index()].message_forward;
                message[0] *= incoming[0];
                message[1] *= incoming[1];
            }
        }
        workspace.data[target.index()].message_reverse = message;
    }
}

fn compose_reverse_factor(
    workspace: &mut Workspace,
    id: NodeId,
    neighbors: &[NodeId],
    table: &[f64],
) {
    let inbound = workspace.data[id.index()].message_reverse;

    for (target_edge, &target) in neighbors.iter().enumerate() {
        if !workspace.is_child_of(target, id) {
            continue;
        }
        let mut message = [0.0, 0.0];
        for (entry, &weight) in table.iter().enumerate() {
            let mut product = weight;
            let mut state = 0;
            for (edge, &neighbor) in neighbors.iter().enumerate() {
                let bit = (entry >> edge) & 1;
                if edge == target_edge {
                    state = bit;
                } else if workspace.is_child_of(neighbor, id) {
                    product *= workspace.data[neighbor.index()].message_forward[bit];
                } else {
                    product *= inbound[bit];
                }
            }
            if message[state] < product {
                message[state] = product;
            }
        }
        workspace.data[target.index()].message_reverse = message;
    }
}
