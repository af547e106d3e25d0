use super::evaluate;
use crate::core::models::graph::ProbabilityGraph;
use crate::core::models::query::GraphQuery;
use crate::engine::config::EngineConfig;
use crate::engine::error::EngineError;
use crate::engine::output::Output;
use crate::engine::progress::{Progress, ProgressReporter};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, instrument};

/// Evaluates every query against the same graph, one workspace per query.
///
/// Outputs are returned in the order of `queries`. With the `parallel` feature the
/// queries are spread over the rayon thread pool; each individual evaluation stays
/// sequential. Stage events of the individual evaluations are not forwarded. The
/// reporter sees `BatchStart`, one `QueryFinished` per query, a `Message` for every
/// query whose evidence is infeasible, then `BatchFinish`.
///
/// # Errors
///
/// Returns the error of the first failing query, in input order.
#[instrument(skip_all, name = "batch_workflow", fields(queries = queries.len()))]
pub fn run<G>(
    graph: &G,
    queries: &[GraphQuery],
    config: &EngineConfig,
    reporter: &ProgressReporter,
) -> Result<Vec<Output>, EngineError>
where
    G: ProbabilityGraph + Sync + ?Sized,
{
    reporter.report(Progress::BatchStart {
        total_queries: queries.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = queries.iter();

    #[cfg(feature = "parallel")]
    let iterator = queries.par_iter();

    let results: Vec<Result<Output, EngineError>> = iterator
        .map(|query| {
            let output = evaluate::run(graph, query, config, &ProgressReporter::new());
            reporter.report(Progress::QueryFinished);
            output
        })
        .collect();

    // Infeasible queries are reported before the batch closes.
    for (index, result) in results.iter().enumerate() {
        if matches!(result, Ok(output) if !output.is_feasible()) {
            reporter.report(Progress::Message(format!(
                "Query #{} has infeasible evidence.",
                index + 1
            )));
        }
    }
    reporter.report(Progress::BatchFinish);

    let outputs = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    info!(
        evaluated = outputs.len(),
        infeasible = outputs.iter().filter(|o| !o.is_feasible()).count(),
        "Batch evaluation finished."
    );
    Ok(outputs)
}
