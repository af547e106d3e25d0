use super::error::EngineError;
use super::output::Pivot;
use super::workspace::{Workspace, node_at};
use crate::core::models::graph::ProbabilityGraph;
use tracing::debug;

/// Computes the false/true odds of every free variable and picks the largest as pivot.
///
/// Free variables are visited in schedule order and a later variable only replaces the
/// current pivot when its ratio is strictly larger, so ties keep the earliest one.
/// A variable whose best-true probability is zero gets `infinite_ratio`. A NaN ratio,
/// left behind when overflowed products meet, never becomes the pivot.
pub(crate) fn calculate_state_ratios<G>(
    graph: &G,
    workspace: &mut Workspace,
    infinite_ratio: f64,
) -> Result<Option<Pivot>, EngineError>
where
    G: ProbabilityGraph + ?Sized,
{
    let mut pivot: Option<Pivot> = None;

    for position in 0..workspace.order.len() {
        let id = workspace.order[position];
        let datum = &mut workspace.data[id.index()];
        if !datum.free_variable {
            datum.ratio = None;
            continue;
        }

        let best_false = datum.message_forward[0] * datum.message_reverse[0];
        let best_true = datum.message_forward[1] * datum.message_reverse[1];
        let ratio = if best_true == 0.0 {
            infinite_ratio
        } else {
            best_false / best_true
        };
        datum.ratio = Some(ratio);

        let threshold = pivot.map_or(-1.0, |current| current.ratio);
        if ratio > threshold {
            let Some(query_id) = node_at(graph, id)?.query_id() else {
                return Err(EngineError::MalformedNode {
                    node: id,
                    reason: "free variable flag set on a factor node".to_string(),
                });
            };
            pivot = Some(Pivot { query_id, ratio });
        }
    }

    match pivot {
        Some(pivot) => debug!(pivot = %pivot.query_id, ratio = pivot.ratio, "Pivot selected."),
        None => debug!("No free variables, no pivot."),
    }
    Ok(pivot)
}
