use super::error::EngineError;
use super::workspace::{Workspace, node_at};
use crate::core::models::graph::ProbabilityGraph;
use crate::core::models::ids::NodeId;
use tracing::{debug, trace};

/// Builds the leaf-to-root visitation order by peeling nodes of degree zero or one.
///
/// Each dequeued node points its forward message at the first neighbor that has not
/// itself been scheduled yet. Nodes left without such a neighbor are the roots of their
/// forest components. Any node that still has two or more unvisited neighbors once
/// the queue drains sits on a cycle.
pub(crate) fn assign_order<G>(graph: &G, workspace: &mut Workspace) -> Result<(), EngineError>
where
    G: ProbabilityGraph + ?Sized,
{
    for index in 0..workspace.data.len() {
        if workspace.data[index].unvisited_neighbors < 2 {
            workspace.enqueue(NodeId(index));
        }
    }

    let mut cursor = 0;
    while cursor < workspace.order.len() {
        let current = workspace.order[cursor];
        let node = node_at(graph, current)?;

        // At most one neighbor is still unscheduled, so the first hit is the parent.
        for &neighbor in &node.neighbors {
            if neighbor == current {
                continue;
            }
            let datum = &mut workspace.data[neighbor.index()];
            if datum.message_to.is_some() {
                continue;
            }
            datum.unvisited_neighbors = datum.unvisited_neighbors.saturating_sub(1);
            let ready = datum.unvisited_neighbors < 2;
            workspace.data[current.index()].message_to = Some(neighbor);
            trace!(node = %current, parent = %neighbor, "Scheduled node.");
            if ready {
                workspace.enqueue(neighbor);
            }
            break;
        }

        cursor += 1;
    }

    if let Some((index, datum)) = workspace
        .data
        .iter()
        .enumerate()
        .find(|(_, datum)| datum.unvisited_neighbors > 1)
    {
        return Err(EngineError::NotAForest {
            node: NodeId(index),
            unvisited: datum.unvisited_neighbors,
        });
    }

    debug!(
        nodes = workspace.order.len(),
        roots = workspace.roots().count(),
        "Visitation order assigned."
    );
    Ok(())
}
