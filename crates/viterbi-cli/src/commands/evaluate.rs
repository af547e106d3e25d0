use crate::cli::EvaluateArgs;
use crate::config::{AppConfig, PartialRunConfig};
use crate::error::Result;
use crate::report::{self, ReportRow};
use crate::utils::progress::CliProgressHandler;
use std::fmt::Write as _;
use std::io::Write;
use tracing::{info, warn};
use viterbi_graph::core::io::graph_file::GraphFile;
use viterbi_graph::core::io::query_file::{NamedQuery, QueryFile};
use viterbi_graph::core::models::graph::FactorGraph;
use viterbi_graph::core::models::query::GraphQuery;
use viterbi_graph::engine::output::Output;
use viterbi_graph::engine::progress::ProgressReporter;
use viterbi_graph::engine::workspace::Workspace;
use viterbi_graph::workflows;

pub fn run(args: EvaluateArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialRunConfig::from_file(path)?,
        None => PartialRunConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    let stdout = std::io::stdout();
    let summaries = evaluate(&config, &mut stdout.lock())?;
    if let Some(path) = &config.report_path {
        report::write_report(path, &summaries)?;
        println!("Report written to: {}", path.display());
    }
    Ok(())
}

/// Loads the graph and queries named by `config`, evaluates them and prints one block
/// per query to `out`.
fn evaluate(config: &AppConfig, out: &mut impl Write) -> Result<Vec<ReportRow>> {
    info!("Loading factor graph from {:?}", &config.graph_path);
    let graph = GraphFile::load(&config.graph_path)?;
    info!("Loading queries from {:?}", &config.queries_path);
    let queries = QueryFile::load(&config.queries_path, &graph)?;

    if queries.is_empty() {
        warn!("Query file contains no queries.");
    }

    let outputs = if config.dump_workspace {
        evaluate_with_dumps(&graph, &queries, config, out)?
    } else {
        let progress_handler = CliProgressHandler::new();
        let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
        let batch: Vec<GraphQuery> = queries.iter().map(|named| named.query.clone()).collect();
        workflows::batch::run(&graph, &batch, &config.engine, &reporter)?
    };

    let mut rows = Vec::with_capacity(outputs.len());
    for (named, output) in queries.iter().zip(&outputs) {
        out.write_all(render_output(&graph, &named.name, output).as_bytes())?;
        rows.push(ReportRow::new(&graph, &named.name, output));
    }
    Ok(rows)
}

fn evaluate_with_dumps(
    graph: &FactorGraph,
    queries: &[NamedQuery],
    config: &AppConfig,
    out: &mut impl Write,
) -> Result<Vec<Output>> {
    let mut workspace = Workspace::new();
    let reporter = ProgressReporter::new();
    let mut outputs = Vec::with_capacity(queries.len());

    for named in queries {
        let output = workflows::evaluate::run_with_workspace(
            graph,
            &mut workspace,
            &named.query,
            &config.engine,
            &reporter,
        )?;
        writeln!(out, "--- Workspace after query '{}' ---", named.name)?;
        workspace.dump(out)?;
        outputs.push(output);
    }
    Ok(outputs)
}

fn render_output(graph: &FactorGraph, name: &str, output: &Output) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Query '{name}'");
    let _ = writeln!(text, "  max probability:   {}", output.max_probability);
    let _ = writeln!(text, "  total probability: {}", output.total_probability);
    if !output.is_feasible() {
        let _ = writeln!(text, "  evidence is infeasible");
    }

    if let Some(state) = &output.state {
        let assignment = state
            .iter()
            .filter_map(|(query_id, _)| {
                let flag = if state.is_true(query_id) { 'T' } else { 'F' };
                graph
                    .query_id_name(query_id)
                    .map(|variable| format!("{variable}={flag}"))
            })
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(text, "  decided state:     {assignment}");

        match output.pivot {
            Some(pivot) => {
                let variable = graph
                    .query_id_name(pivot.query_id)
                    .map_or_else(|| pivot.query_id.to_string(), str::to_string);
                let _ = writeln!(text, "  pivot:             {variable} (ratio {})", pivot.ratio);
            }
            None => {
                let _ = writeln!(text, "  pivot:             none");
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;
    use viterbi_graph::engine::config::{EngineConfig, EvaluationMode};

    const GRAPH: &str = r#"
        [[variables]]
        name = "a"
        [[variables]]
        name = "b"

        [[factors]]
        name = "same"
        neighbors = ["a", "b"]
        table = [1.0, 0.0, 0.0, 1.0]
    "#;

    const QUERIES: &str = r#"
        [[queries]]
        name = "a-true"
        [queries.evidence]
        a = true

        [[queries]]
        name = "contradiction"
        [queries.evidence]
        a = true
        b = false
    "#;

    fn app_config(dir: &Path, mode: EvaluationMode, dump_workspace: bool) -> AppConfig {
        let graph_path = dir.join("graph.toml");
        let queries_path = dir.join("queries.toml");
        fs::write(&graph_path, GRAPH).unwrap();
        fs::write(&queries_path, QUERIES).unwrap();
        AppConfig {
            graph_path,
            queries_path,
            report_path: None,
            dump_workspace,
            engine: EngineConfig {
                mode,
                ..EngineConfig::default()
            },
        }
    }

    #[test]
    fn full_evaluation_prints_state_and_pivot() {
        let dir = tempdir().unwrap();
        let config = app_config(dir.path(), EvaluationMode::Full, false);
        let mut out = Vec::new();

        let rows = evaluate(&config, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(rows.len(), 2);
        assert!(text.contains("Query 'a-true'"));
        assert!(text.contains("decided state:     a=T b=T"));
        assert!(text.contains("pivot:             b (ratio 0)"));
        assert!(text.contains("evidence is infeasible"));
        assert!(rows[1].pivot.is_none());
        assert!(!rows[1].feasible);
    }

    #[test]
    fn lightweight_evaluation_prints_probabilities_only() {
        let dir = tempdir().unwrap();
        let config = app_config(dir.path(), EvaluationMode::Lightweight, false);
        let mut out = Vec::new();

        evaluate(&config, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("max probability:   1"));
        assert!(!text.contains("decided state"));
        assert!(!text.contains("pivot"));
    }

    #[test]
    fn dump_mode_writes_workspace_diagnostics() {
        let dir = tempdir().unwrap();
        let config = app_config(dir.path(), EvaluationMode::Full, true);
        let mut out = Vec::new();

        evaluate(&config, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("--- Workspace after query 'a-true' ---"));
        assert!(text.contains("Visit order (by NodeId) 0 1 2"));
        assert!(text.contains("message to: root"));
    }

    #[test]
    fn missing_graph_file_is_reported() {
        let dir = tempdir().unwrap();
        let mut config = app_config(dir.path(), EvaluationMode::Full, false);
        config.graph_path = dir.path().join("absent.toml");

        let result = evaluate(&config, &mut Vec::new());
        assert!(matches!(result, Err(crate::error::CliError::Graph(_))));
    }
}
