use crate::cli::EvaluateArgs;
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use viterbi_graph::engine::config::{self as core_config, EngineConfigBuilder, EvaluationMode};

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
enum PartialMode {
    Lightweight,
    Full,
}

impl From<PartialMode> for EvaluationMode {
    fn from(mode: PartialMode) -> Self {
        match mode {
            PartialMode::Lightweight => EvaluationMode::Lightweight,
            PartialMode::Full => EvaluationMode::Full,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialEngineConfig {
    mode: Option<PartialMode>,
    infinite_ratio: Option<f64>,
}

/// Run configuration as read from TOML, before command-line overrides.
///
/// ```toml
/// graph = "network.toml"
/// queries = "queries.toml"
/// report = "summary.csv"
///
/// [engine]
/// mode = "full"
/// infinite-ratio = 1e308
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialRunConfig {
    graph: Option<PathBuf>,
    queries: Option<PathBuf>,
    report: Option<PathBuf>,
    engine: Option<PartialEngineConfig>,
}

/// Fully resolved settings for one `evaluate` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub graph_path: PathBuf,
    pub queries_path: PathBuf,
    pub report_path: Option<PathBuf>,
    pub dump_workspace: bool,
    pub engine: core_config::EngineConfig,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Combines file values with command-line arguments. Arguments win.
    pub fn merge_with_cli(self, args: &EvaluateArgs) -> Result<AppConfig> {
        let engine_config = self.engine.unwrap_or_default();

        let graph_path = args.graph.clone().or(self.graph).ok_or_else(|| {
            CliError::Config(
                "A value for 'graph' is required either in the config file or via CLI argument."
                    .to_string(),
            )
        })?;
        let queries_path = args.queries.clone().or(self.queries).ok_or_else(|| {
            CliError::Config(
                "A value for 'queries' is required either in the config file or via CLI argument."
                    .to_string(),
            )
        })?;

        let mode = args
            .mode
            .map(EvaluationMode::from)
            .or(engine_config.mode.map(EvaluationMode::from))
            .unwrap_or_default();
        let mut builder = EngineConfigBuilder::new().mode(mode);
        if let Some(ratio) = args.infinite_ratio.or(engine_config.infinite_ratio) {
            builder = builder.infinite_ratio(ratio);
        }
        let engine = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

        Ok(AppConfig {
            graph_path,
            queries_path,
            report_path: args.report.clone().or(self.report),
            dump_workspace: args.dump_workspace,
            engine,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;
    use viterbi_graph::engine::config::DEFAULT_INFINITE_RATIO;

    fn evaluate_args(extra: &[&str]) -> EvaluateArgs {
        let mut argv = vec!["viterbi", "evaluate"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Evaluate(args) => args,
            other => panic!("Expected 'evaluate' subcommand, got {other:?}"),
        }
    }

    #[test]
    fn file_values_are_used_when_cli_is_silent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            r#"
            graph = "net.toml"
            queries = "q.toml"
            report = "out.csv"

            [engine]
            mode = "lightweight"
            infinite-ratio = 1e12
        "#,
        )
        .unwrap();

        let config = PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&evaluate_args(&[]))
            .unwrap();

        assert_eq!(config.graph_path, PathBuf::from("net.toml"));
        assert_eq!(config.queries_path, PathBuf::from("q.toml"));
        assert_eq!(config.report_path, Some(PathBuf::from("out.csv")));
        assert_eq!(config.engine.mode, EvaluationMode::Lightweight);
        assert_eq!(config.engine.infinite_ratio, 1e12);
        assert!(!config.dump_workspace);
    }

    #[test]
    fn cli_arguments_override_file_values() {
        let partial: PartialRunConfig = toml::from_str(
            r#"
            graph = "net.toml"
            queries = "q.toml"
            [engine]
            mode = "lightweight"
        "#,
        )
        .unwrap();
        let args = evaluate_args(&[
            "--graph",
            "other.toml",
            "--mode",
            "full",
            "--infinite-ratio",
            "1000",
            "--dump-workspace",
        ]);

        let config = partial.merge_with_cli(&args).unwrap();

        assert_eq!(config.graph_path, PathBuf::from("other.toml"));
        assert_eq!(config.queries_path, PathBuf::from("q.toml"));
        assert_eq!(config.engine.mode, EvaluationMode::Full);
        assert_eq!(config.engine.infinite_ratio, 1000.0);
        assert!(config.dump_workspace);
    }

    #[test]
    fn defaults_apply_without_a_config_file() {
        let args = evaluate_args(&["-g", "net.toml", "-Q", "q.toml"]);
        let config = PartialRunConfig::default().merge_with_cli(&args).unwrap();

        assert_eq!(config.engine.mode, EvaluationMode::Full);
        assert_eq!(config.engine.infinite_ratio, DEFAULT_INFINITE_RATIO);
        assert_eq!(config.report_path, None);
    }

    #[test]
    fn missing_graph_is_a_config_error() {
        let args = evaluate_args(&["-Q", "q.toml"]);
        let result = PartialRunConfig::default().merge_with_cli(&args);
        match result {
            Err(CliError::Config(msg)) => assert!(msg.contains("graph")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn invalid_ratio_is_rejected() {
        let args = evaluate_args(&["-g", "g.toml", "-Q", "q.toml", "--infinite-ratio=-1"]);
        let result = PartialRunConfig::default().merge_with_cli(&args);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, "[engine]\nmode = \"full\"\nthreads = 4\n").unwrap();

        let result = PartialRunConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
