use crate::cli::CheckArgs;
use crate::error::Result;
use tracing::info;
use viterbi_graph::core::io::graph_file::GraphFile;
use viterbi_graph::core::models::graph::{FactorGraph, ProbabilityGraph};
use viterbi_graph::core::models::ids::NodeId;
use viterbi_graph::engine::pipeline::Evaluation;
use viterbi_graph::engine::workspace::Workspace;

pub fn run(args: CheckArgs) -> Result<()> {
    info!("Loading factor graph from {:?}", &args.graph);
    let graph = GraphFile::load(&args.graph)?;
    print!("{}", summarize(&graph)?);
    Ok(())
}

/// Schedules `graph` and describes its components and visitation order.
fn summarize(graph: &FactorGraph) -> Result<String> {
    let mut workspace = Workspace::new();
    Evaluation::new(graph, &mut workspace)?.assign_order()?;

    let name = |id: NodeId| {
        graph
            .node(id)
            .map_or_else(|| id.to_string(), |node| node.name.clone())
    };
    let roots: Vec<String> = workspace.roots().map(name).collect();
    let order: Vec<String> = workspace.visit_order().iter().copied().map(name).collect();

    Ok(format!(
        "Graph is a forest.\n  variables:   {}\n  factors:     {}\n  query slots: {}\n  components:  {} (roots: {})\n  visit order: {}\n",
        graph.variables().count(),
        graph.factors().count(),
        graph.query_size(),
        roots.len(),
        roots.join(", "),
        order.join(" "),
    ))
}
