//! Stage-ordered evaluation over a borrowed graph and workspace.
//!
//! Every stage consumes the [`Evaluation`] and returns it in the next state, so a stage
//! can only run on a workspace that the stages before it have filled in:
//!
//! ```text
//! Initialized -> Scheduled -> Collected -> Decided -> Distributed -> Output
//! ```

use super::decision;
use super::error::EngineError;
use super::forward::{self, ForwardTotals};
use super::output::Output;
use super::ratio;
use super::reverse;
use super::schedule;
use super::workspace::Workspace;
use crate::core::models::graph::ProbabilityGraph;
use crate::core::models::query::GraphQuery;

/// The workspace holds one cleared datum per node.
#[derive(Debug)]
pub struct Initialized;

/// The visitation order and every forward message target are assigned.
#[derive(Debug)]
pub struct Scheduled;

/// Forward messages are composed for a query.
#[derive(Debug)]
pub struct Collected<'q> {
    query: &'q GraphQuery,
    totals: ForwardTotals,
}

/// The best joint state has been backtracked.
#[derive(Debug)]
pub struct Decided<'q> {
    query: &'q GraphQuery,
    totals: ForwardTotals,
    state: GraphQuery,
}

/// Reverse messages are composed; only the ratios remain.
#[derive(Debug)]
pub struct Distributed {
    totals: ForwardTotals,
    state: GraphQuery,
}

#[derive(Debug)]
pub struct Evaluation<'a, G: ?Sized, S> {
    graph: &'a G,
    workspace: &'a mut Workspace,
    stage: S,
}

impl<'a, G, S> Evaluation<'a, G, S>
where
    G: ProbabilityGraph + ?Sized,
{
    pub fn workspace(&self) -> &Workspace {
        &*self.workspace
    }

    fn advance<T>(self, stage: T) -> Evaluation<'a, G, T> {
        Evaluation {
            graph: self.graph,
            workspace: self.workspace,
            stage,
        }
    }
}

impl<'a, G> Evaluation<'a, G, Initialized>
where
    G: ProbabilityGraph + ?Sized,
{
    /// Prepares `workspace` for `graph`, discarding anything left from a previous run.
    pub fn new(graph: &'a G, workspace: &'a mut Workspace) -> Result<Self, EngineError> {
        workspace.initialize(graph)?;
        Ok(Self {
            graph,
            workspace,
            stage: Initialized,
        })
    }

    pub fn assign_order(self) -> Result<Evaluation<'a, G, Scheduled>, EngineError> {
        schedule::assign_order(self.graph, self.workspace)?;
        Ok(self.advance(Scheduled))
    }
}

impl<'a, G> Evaluation<'a, G, Scheduled>
where
    G: ProbabilityGraph + ?Sized,
{
    pub fn collect_evidence<'q>(
        self,
        query: &'q GraphQuery,
    ) -> Result<Evaluation<'a, G, Collected<'q>>, EngineError> {
        let totals = forward::collect_evidence(self.graph, self.workspace, query)?;
        Ok(self.advance(Collected { query, totals }))
    }
}

impl<'a, 'q, G> Evaluation<'a, G, Collected<'q>>
where
    G: ProbabilityGraph + ?Sized,
{
    pub fn max_probability(&self) -> f64 {
        self.stage.totals.max_probability
    }

    pub fn total_probability(&self) -> f64 {
        self.stage.totals.total_probability
    }

    pub fn distribute_decisions(self) -> Result<Evaluation<'a, G, Decided<'q>>, EngineError> {
        let state = decision::distribute_decisions(self.graph, self.workspace)?;
        let Collected { query, totals } = self.stage;
        Ok(Evaluation {
            graph: self.graph,
            workspace: self.workspace,
            stage: Decided {
                query,
                totals,
                state,
            },
        })
    }

    /// Ends the evaluation with the probabilities only.
    pub fn into_output(self) -> Output {
        Output::probabilities(
            self.stage.totals.max_probability,
            self.stage.totals.total_probability,
        )
    }
}

impl<'a, 'q, G> Evaluation<'a, G, Decided<'q>>
where
    G: ProbabilityGraph + ?Sized,
{
    pub fn decision(&self) -> &GraphQuery {
        &self.stage.state
    }

    pub fn distribute_evidence(self) -> Result<Evaluation<'a, G, Distributed>, EngineError> {
        reverse::distribute_evidence(self.graph, self.workspace, self.stage.query)?;
        let Decided { totals, state, .. } = self.stage;
        Ok(Evaluation {
            graph: self.graph,
            workspace: self.workspace,
            stage: Distributed { totals, state },
        })
    }

    /// Ends the evaluation with the probabilities and decided state, skipping the pivot.
    pub fn into_output(self) -> Output {
        Output {
            state: Some(self.stage.state),
            ..Output::probabilities(
                self.stage.totals.max_probability,
                self.stage.totals.total_probability,
            )
        }
    }
}

impl<G> Evaluation<'_, G, Distributed>
where
    G: ProbabilityGraph + ?Sized,
{
    pub fn calculate_state_ratios(self, infinite_ratio: f64) -> Result<Output, EngineError> {
        let pivot = ratio::calculate_state_ratios(self.graph, self.workspace, infinite_ratio)?;
        let Distributed { totals, state } = self.stage;
        Ok(Output {
            state: Some(state),
            max_probability: totals.max_probability,
            total_probability: totals.total_probability,
            pivot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::graph::FactorGraph;
    use crate::core::models::ids::QueryId;
    use crate::engine::config::DEFAULT_INFINITE_RATIO;

    fn chain() -> FactorGraph {
        let mut builder = FactorGraph::builder();
        let a = builder.add_variable("a", QueryId(0), [1.0, 1.0]).unwrap();
        let b = builder.add_variable("b", QueryId(1), [1.0, 1.0]).unwrap();
        builder
            .add_factor("same", &[a, b], vec![1.0, 0.0, 0.0, 1.0])
            .unwrap();
        builder.build()
    }

    #[test]
    fn stages_run_in_order_to_a_full_output() {
        let graph = chain();
        let mut workspace = Workspace::new();
        let mut query = GraphQuery::new(2);
        query.set_true(QueryId(0)).unwrap();

        let collected = Evaluation::new(&graph, &mut workspace)
            .unwrap()
            .assign_order()
            .unwrap()
            .collect_evidence(&query)
            .unwrap();
        assert_eq!(collected.max_probability(), 1.0);
        assert_eq!(collected.total_probability(), 1.0);

        let decided = collected.distribute_decisions().unwrap();
        assert!(decided.decision().is_true(QueryId(1)));

        let output = decided
            .distribute_evidence()
            .unwrap()
            .calculate_state_ratios(DEFAULT_INFINITE_RATIO)
            .unwrap();
        assert_eq!(output.pivot_id(), Some(QueryId(1)));
        assert_eq!(output.pivot_ratio(), Some(0.0));
        assert!(workspace.datum(graph.nodes()[1].id).unwrap().is_free());
    }

    #[test]
    fn early_exit_outputs_carry_what_was_computed() {
        let graph = chain();
        let mut workspace = Workspace::new();
        let query = GraphQuery::new(2);

        let lightweight = Evaluation::new(&graph, &mut workspace)
            .unwrap()
            .assign_order()
            .unwrap()
            .collect_evidence(&query)
            .unwrap()
            .into_output();
        assert_eq!(lightweight.max_probability, 1.0);
        assert_eq!(lightweight.total_probability, 2.0);
        assert!(lightweight.state.is_none());

        let decided = Evaluation::new(&graph, &mut workspace)
            .unwrap()
            .assign_order()
            .unwrap()
            .collect_evidence(&query)
            .unwrap()
            .distribute_decisions()
            .unwrap()
            .into_output();
        assert_eq!(decided.state.unwrap().free_count(), 0);
        assert!(decided.pivot.is_none());
    }

    #[test]
    fn cycle_stops_the_pipeline_at_scheduling() {
        let mut builder = FactorGraph::builder();
        let a = builder.add_variable("a", QueryId(0), [1.0, 1.0]).unwrap();
        let b = builder.add_variable("b", QueryId(1), [1.0, 1.0]).unwrap();
        builder.add_factor("f1", &[a, b], vec![1.0; 4]).unwrap();
        builder.add_factor("f2", &[a, b], vec![1.0; 4]).unwrap();
        let graph = builder.build();
        let mut workspace = Workspace::new();

        let result = Evaluation::new(&graph, &mut workspace)
            .unwrap()
            .assign_order();
        assert!(matches!(result, Err(EngineError::NotAForest { .. })));
    }
}
