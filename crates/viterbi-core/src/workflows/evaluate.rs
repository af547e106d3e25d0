use crate::core::models::graph::ProbabilityGraph;
use crate::core::models::query::GraphQuery;
use crate::engine::config::{EngineConfig, EvaluationMode};
use crate::engine::error::EngineError;
use crate::engine::output::Output;
use crate::engine::pipeline::Evaluation;
use crate::engine::progress::{ProgressReporter, Stage};
use crate::engine::workspace::Workspace;
use tracing::{info, instrument};

/// Lightweight evaluation: the best and total probability only.
///
/// Runs initialization, scheduling and the forward pass on a fresh workspace.
pub fn propagate<G>(
    graph: &G,
    query: &GraphQuery,
    reporter: &ProgressReporter,
) -> Result<Output, EngineError>
where
    G: ProbabilityGraph + ?Sized,
{
    let mut workspace = Workspace::new();
    propagate_with_workspace(graph, &mut workspace, query, reporter)
}

#[instrument(skip_all, name = "propagate_workflow")]
pub fn propagate_with_workspace<G>(
    graph: &G,
    workspace: &mut Workspace,
    query: &GraphQuery,
    reporter: &ProgressReporter,
) -> Result<Output, EngineError>
where
    G: ProbabilityGraph + ?Sized,
{
    let initialized = reporter.stage(Stage::Initialize, move || {
        Evaluation::new(graph, workspace)
    })?;
    let scheduled = reporter.stage(Stage::Schedule, move || initialized.assign_order())?;
    let collected =
        reporter.stage(Stage::CollectEvidence, move || scheduled.collect_evidence(query))?;

    let output = collected.into_output();
    info!(
        max_probability = output.max_probability,
        total_probability = output.total_probability,
        "Lightweight evaluation complete."
    );
    Ok(output)
}

/// Full evaluation: probabilities, the decided best state and the pivot.
///
/// # Arguments
///
/// * `graph` - The factor-graph forest, only read.
/// * `query` - Evidence for every query slot of the graph.
/// * `infinite_ratio` - Ratio reported for a free variable that can never be true.
/// * `reporter` - Receives a start and finish event for every stage.
///
/// # Errors
///
/// Returns [`EngineError`] when the graph is not a forest, a node is malformed, or the
/// query has no slot for one of the variables.
pub fn execute<G>(
    graph: &G,
    query: &GraphQuery,
    infinite_ratio: f64,
    reporter: &ProgressReporter,
) -> Result<Output, EngineError>
where
    G: ProbabilityGraph + ?Sized,
{
    let mut workspace = Workspace::new();
    execute_with_workspace(graph, &mut workspace, query, infinite_ratio, reporter)
}

#[instrument(skip_all, name = "execute_workflow")]
pub fn execute_with_workspace<G>(
    graph: &G,
    workspace: &mut Workspace,
    query: &GraphQuery,
    infinite_ratio: f64,
    reporter: &ProgressReporter,
) -> Result<Output, EngineError>
where
    G: ProbabilityGraph + ?Sized,
{
    let initialized = reporter.stage(Stage::Initialize, move || {
        Evaluation::new(graph, workspace)
    })?;
    let scheduled = reporter.stage(Stage::Schedule, move || initialized.assign_order())?;
    let collected =
        reporter.stage(Stage::CollectEvidence, move || scheduled.collect_evidence(query))?;
    let decided = reporter.stage(Stage::DistributeDecisions, move || {
        collected.distribute_decisions()
    })?;
    let distributed = reporter.stage(Stage::DistributeEvidence, move || {
        decided.distribute_evidence()
    })?;
    let output = reporter.stage(Stage::StateRatios, move || {
        distributed.calculate_state_ratios(infinite_ratio)
    })?;

    info!(
        max_probability = output.max_probability,
        total_probability = output.total_probability,
        pivot = ?output.pivot_id(),
        "Full evaluation complete."
    );
    Ok(output)
}

/// Evaluates `query` with the stages selected by `config.mode`.
pub fn run<G>(
    graph: &G,
    query: &GraphQuery,
    config: &EngineConfig,
    reporter: &ProgressReporter,
) -> Result<Output, EngineError>
where
    G: ProbabilityGraph + ?Sized,
{
    let mut workspace = Workspace::new();
    run_with_workspace(graph, &mut workspace, query, config, reporter)
}

pub fn run_with_workspace<G>(
    graph: &G,
    workspace: &mut Workspace,
    query: &GraphQuery,
    config: &EngineConfig,
    reporter: &ProgressReporter,
) -> Result<Output, EngineError>
where
    G: ProbabilityGraph + ?Sized,
{
    match config.mode {
        EvaluationMode::Lightweight => propagate_with_workspace(graph, workspace, query, reporter),
        EvaluationMode::Full => {
            execute_with_workspace(graph, workspace, query, config.infinite_ratio, reporter)
        }
    }
}
