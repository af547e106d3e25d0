use crate::error::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;
use viterbi_graph::core::models::graph::FactorGraph;
use viterbi_graph::engine::output::Output;

/// One CSV row per evaluated query. Columns a mode did not compute stay empty.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ReportRow {
    pub query: String,
    pub max_probability: f64,
    pub total_probability: f64,
    pub feasible: bool,
    pub true_variables: Option<String>,
    pub pivot: Option<String>,
    pub pivot_ratio: Option<f64>,
}

impl ReportRow {
    pub fn new(graph: &FactorGraph, query: &str, output: &Output) -> Self {
        let true_variables = output.state.as_ref().map(|state| {
            state
                .iter()
                .filter(|(query_id, _)| state.is_true(*query_id))
                .filter_map(|(query_id, _)| graph.query_id_name(query_id))
                .collect::<Vec<_>>()
                .join(" ")
        });
        let pivot = output.pivot_id().map(|query_id| {
            graph
                .query_id_name(query_id)
                .map_or_else(|| query_id.to_string(), str::to_string)
        });

        Self {
            query: query.to_string(),
            max_probability: output.max_probability,
            total_probability: output.total_probability,
            feasible: output.is_feasible(),
            true_variables,
            pivot,
            pivot_ratio: output.pivot_ratio(),
        }
    }
}

pub fn write_rows<W: Write>(writer: W, rows: &[ReportRow]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_rows(file, rows)?;
    info!(rows = rows.len(), "Report written to {:?}", path);
    Ok(())
}
