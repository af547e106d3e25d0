use std::path::PathBuf;
use thiserror::Error;
use viterbi_graph::core::io::graph_file::GraphFileError;
use viterbi_graph::core::io::query_file::QueryFileError;
use viterbi_graph::engine::error::EngineError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Graph(#[from] GraphFileError),

    #[error(transparent)]
    Queries(#[from] QueryFileError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report error: {0}")]
    Report(#[from] csv::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
