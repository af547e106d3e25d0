use super::error::EngineError;
use super::workspace::{Workspace, node_at};
use crate::core::models::graph::ProbabilityGraph;
use crate::core::models::ids::{NodeId, QueryId};
use crate::core::models::node::NodeKind;
use crate::core::models::query::{Evidence, GraphQuery};
use tracing::{debug, trace, warn};

/// Probability of the best joint state and the combined per-component totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ForwardTotals {
    pub max_probability: f64,
    pub total_probability: f64,
}

/// Runs max-product message passing from the leaves to the roots.
///
/// Components of the forest are independent, so their root values are multiplied
/// together into the global maximum and total.
pub(crate) fn collect_evidence<G>(
    graph: &G,
    workspace: &mut Workspace,
    query: &GraphQuery,
) -> Result<ForwardTotals, EngineError>
where
    G: ProbabilityGraph + ?Sized,
{
    workspace.query_size = query.size();

    let mut max = 1.0;
    let mut total = 1.0;

    for position in 0..workspace.order.len() {
        let id = workspace.order[position];
        let node = node_at(graph, id)?;

        match &node.kind {
            NodeKind::Variable { query_id, prior } => {
                let evidence = lookup_evidence(query, id, *query_id)?;
                compose_forward_variable(workspace, id, &node.neighbors, *prior, evidence);
            }
            NodeKind::Factor { table } => {
                compose_forward_factor(workspace, id, &node.neighbors, table);
            }
        }

        let datum = &workspace.data[id.index()];
        trace!(
            node = %id,
            m0 = datum.message_forward[0],
            m1 = datum.message_forward[1],
            best = datum.best,
            "Forward message composed."
        );
        if datum.message_to.is_none() {
            max *= datum.message_forward[datum.best];
            total *= datum.total;
        }
    }

    if total == 0.0 {
        warn!("Evidence is infeasible: every joint state has zero probability.");
    }
    debug!(
        max_probability = max,
        total_probability = total,
        "Evidence collected."
    );
    Ok(ForwardTotals {
        max_probability: max,
        total_probability: total,
    })
}

pub(crate) fn lookup_evidence(
    query: &GraphQuery,
    node: NodeId,
    query_id: QueryId,
) -> Result<Evidence, EngineError> {
    query.get(query_id).ok_or(EngineError::QueryOutOfRange {
        node,
        query_id,
        query_size: query.size(),
    })
}

/// Scales the two prior weights of a variable by its evidence.
#[inline]
pub(crate) fn apply_evidence(mut message: [f64; 2], evidence: Evidence) -> [f64; 2] {
    match evidence {
        Evidence::Partial(p) => {
            message[0] *= 1.0 - p;
            message[1] *= p;
        }
        Evidence::True => message[0] = 0.0,
        Evidence::False => message[1] = 0.0,
        Evidence::Unknown => {}
    }
    message
}

#[inline]
fn argmax(message: [f64; 2]) -> usize {
    if message[0] < message[1] { 1 } else { 0 }
}

fn compose_forward_variable(
    workspace: &mut Workspace,
    id: NodeId,
    neighbors: &[NodeId],
    prior: [f64; 2],
    evidence: Evidence,
) {
    let mut message = apply_evidence(prior, evidence);
    for &neighbor in neighbors {
        if workspace.is_child_of(neighbor, id) {
            let incoming = workspace.data[neighbor.index()].message_forward;
            message[0] *= incoming[0];
            message[1] *= incoming[1];
        }
    }

    let datum = &mut workspace.data[id.index()];
    datum.free_variable = evidence == Evidence::Unknown;
    datum.state_tracking = [0, 1];
    datum.message_forward = message;
    datum.best = argmax(message);
    datum.total = message[0] + message[1];
}

fn compose_forward_factor(
    workspace: &mut Workspace,
    id: NodeId,
    neighbors: &[NodeId],
    table: &[f64],
) {
    let mut message = [-1.0, -1.0];
    let mut tracking = [0, 1];
    let mut total = 0.0;
    // A root factor has no outgoing edge, so every entry competes for state 0.
    let mut outgoing = 0;

    for (entry, &weight) in table.iter().enumerate() {
        let mut product = weight;
        for (edge, &neighbor) in neighbors.iter().enumerate() {
            let bit = (entry >> edge) & 1;
            if workspace.is_child_of(neighbor, id) {
                product *= workspace.data[neighbor.index()].message_forward[bit];
            } else {
                outgoing = bit;
            }
        }

        if message[outgoing] < product {
            message[outgoing] = product;
            tracking[outgoing] = entry;
        }
        total += product;
    }

    // States no table entry reached carry no probability.
    for value in &mut message {
        if *value < 0.0 {
            *value = 0.0;
        }
    }

    let datum = &mut workspace.data[id.index()];
    datum.free_variable = false;
    datum.state_tracking = tracking;
    datum.message_forward = message;
    datum.best = argmax(message);
    datum.total = total;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::graph::FactorGraph;
    use crate::engine::schedule::assign_order;

    fn collect(graph: &FactorGraph, query: &GraphQuery) -> (Workspace, ForwardTotals) {
        let mut workspace = Workspace::new();
        workspace.initialize(graph).unwrap();
        assign_order(graph, &mut workspace).unwrap();
        let collected = collect_evidence(graph, &mut workspace, query).unwrap();
        (workspace, collected)
    }

    #[test]
    fn apply_evidence_scales_prior() {
        assert_eq!(apply_evidence([2.0, 3.0], Evidence::Unknown), [2.0, 3.0]);
        assert_eq!(apply_evidence([2.0, 3.0], Evidence::True), [0.0, 3.0]);
        assert_eq!(apply_evidence([2.0, 3.0], Evidence::False), [2.0, 0.0]);
        assert_eq!(
            apply_evidence([2.0, 4.0], Evidence::Partial(0.25)),
            [1.5, 1.0]
        );
    }

    #[test]
    fn single_free_variable_into_root_factor() {
        let mut builder = FactorGraph::builder();
        let v = builder.add_variable("v", QueryId(0), [1.0, 1.0]).unwrap();
        let f = builder.add_factor("f", &[v], vec![1.0, 3.0]).unwrap();
        let graph = builder.build();

        let (workspace, collected) = collect(&graph, &GraphQuery::new(1));

        assert_eq!(collected.max_probability, 3.0);
        assert_eq!(collected.total_probability, 4.0);
        let variable = workspace.datum(v).unwrap();
        assert!(variable.is_free());
        assert_eq!(variable.message_forward(), [1.0, 1.0]);
        let factor = workspace.datum(f).unwrap();
        assert_eq!(factor.message_forward(), [3.0, 0.0]);
        assert_eq!(factor.state_tracking()[0], 1);
    }

    #[test]
    fn factor_into_root_variable_tracks_both_states() {
        let graph = crate::core::io::graph_file::GraphFile::from_toml_str(
            r#"
            [[variables]]
            name = "v"
            [[factors]]
            name = "f"
            neighbors = ["v"]
            table = [1.0, 3.0]
        "#,
        )
        .unwrap();
        let mut workspace = Workspace::new();
        workspace.initialize(&graph).unwrap();
        // Put the factor first so it is peeled before the variable.
        workspace.enqueue(NodeId(1));
        assign_order(&graph, &mut workspace).unwrap();
        let collected = collect_evidence(&graph, &mut workspace, &GraphQuery::new(1)).unwrap();

        assert!(workspace.datum(NodeId(0)).unwrap().is_root());
        let factor = workspace.datum(NodeId(1)).unwrap();
        assert_eq!(factor.message_forward(), [1.0, 3.0]);
        assert_eq!(factor.state_tracking(), [0, 1]);
        assert_eq!(collected.max_probability, 3.0);
        assert_eq!(collected.total_probability, 4.0);
    }

    #[test]
    fn hard_evidence_zeroes_opposing_state() {
        let mut builder = FactorGraph::builder();
        let v = builder.add_variable("v", QueryId(0), [1.0, 1.0]).unwrap();
        builder.add_factor("f", &[v], vec![1.0, 3.0]).unwrap();
        let graph = builder.build();

        let mut query = GraphQuery::new(1);
        query.set_false(QueryId(0)).unwrap();
        let (workspace, collected) = collect(&graph, &query);

        assert_eq!(collected.max_probability, 1.0);
        assert_eq!(collected.total_probability, 1.0);
        assert!(!workspace.datum(v).unwrap().is_free());
    }

    #[test]
    fn partial_evidence_weights_both_states() {
        let mut builder = FactorGraph::builder();
        builder.add_variable("v", QueryId(0), [1.0, 1.0]).unwrap();
        let graph = builder.build();

        let mut query = GraphQuery::new(1);
        query.set_partial(QueryId(0), 0.25).unwrap();
        let (_, collected) = collect(&graph, &query);

        assert_eq!(collected.max_probability, 0.75);
        assert_eq!(collected.total_probability, 1.0);
    }

    #[test]
    fn components_multiply() {
        let mut builder = FactorGraph::builder();
        let a = builder.add_variable("a", QueryId(0), [1.0, 1.0]).unwrap();
        let b = builder.add_variable("b", QueryId(1), [1.0, 1.0]).unwrap();
        builder.add_factor("fa", &[a], vec![1.0, 3.0]).unwrap();
        builder.add_factor("fb", &[b], vec![2.0, 1.0]).unwrap();
        let graph = builder.build();

        let (_, collected) = collect(&graph, &GraphQuery::new(2));

        assert_eq!(collected.max_probability, 6.0);
        assert_eq!(collected.total_probability, 12.0);
    }

    #[test]
    fn query_smaller_than_graph_is_rejected() {
        let mut builder = FactorGraph::builder();
        builder.add_variable("v", QueryId(3), [1.0, 1.0]).unwrap();
        let graph = builder.build();

        let mut workspace = Workspace::new();
        workspace.initialize(&graph).unwrap();
        assign_order(&graph, &mut workspace).unwrap();
        let result = collect_evidence(&graph, &mut workspace, &GraphQuery::new(2));

        assert_eq!(
            result,
            Err(EngineError::QueryOutOfRange {
                node: NodeId(0),
                query_id: QueryId(3),
                query_size: 2,
            })
        );
    }

    #[test]
    fn infeasible_evidence_yields_zero_probabilities() {
        let mut builder = FactorGraph::builder();
        let v = builder.add_variable("v", QueryId(0), [1.0, 1.0]).unwrap();
        builder.add_factor("only_false", &[v], vec![1.0, 0.0]).unwrap();
        let graph = builder.build();

        let mut query = GraphQuery::new(1);
        query.set_true(QueryId(0)).unwrap();
        let (_, collected) = collect(&graph, &query);

        assert_eq!(collected.max_probability, 0.0);
        assert_eq!(collected.total_probability, 0.0);
    }
}
