use super::error::EngineError;
use super::workspace::{Workspace, node_at};
use crate::core::models::graph::ProbabilityGraph;
use crate::core::models::node::NodeKind;
use crate::core::models::query::GraphQuery;
use tracing::debug;

/// Backtracks the best joint state from the roots to the leaves.
///
/// Roots keep the state chosen during the forward pass. Every other node receives its
/// state from its parent: variables hand their own bit to each child, factors decode
/// the winning table entry one edge bit at a time.
pub(crate) fn distribute_decisions<G>(
    graph: &G,
    workspace: &mut Workspace,
) -> Result<GraphQuery, EngineError>
where
    G: ProbabilityGraph + ?Sized,
{
    let mut state = GraphQuery::new(workspace.query_size);

    for position in (0..workspace.order.len()).rev() {
        let id = workspace.order[position];
        let node = node_at(graph, id)?;
        let datum = &workspace.data[id.index()];
        let best_state = datum.state_tracking[datum.best];

        match &node.kind {
            NodeKind::Variable { query_id, .. } => {
                for &neighbor in &node.neighbors {
                    if workspace.is_child_of(neighbor, id) {
                        workspace.data[neighbor.index()].best = best_state;
                    }
                }
                let decided = if workspace.data[id.index()].best == 1 {
                    state.set_true(*query_id)
                } else {
                    state.set_false(*query_id)
                };
                decided.map_err(|_| EngineError::QueryOutOfRange {
                    node: id,
                    query_id: *query_id,
                    query_size: workspace.query_size,
                })?;
            }
            NodeKind::Factor { .. } => {
                for (edge, &neighbor) in node.neighbors.iter().enumerate() {
                    if workspace.is_child_of(neighbor, id) {
                        workspace.data[neighbor.index()].best = (best_state >> edge) & 1;
                    }
                }
            }
        }
    }

    debug!(
        decided = state.size() - state.free_count(),
        "Decisions distributed."
    );
    Ok(state)
}
