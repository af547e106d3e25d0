//! # Core Models Module
//!
//! Data structures describing the probability graphs evaluated by the engine and the
//! queries posed against them.
//!
//! ## Key Components
//!
//! - [`ids`] - Dense identifier types for nodes and query slots
//! - [`node`] - Variable and factor nodes as a tagged variant
//! - [`graph`] - The [`ProbabilityGraph`](graph::ProbabilityGraph) trait consumed by the
//!   engine and the arena-backed [`FactorGraph`](graph::FactorGraph) implementation
//! - [`query`] - Per-variable evidence (true, false, partial, unknown)
//!
//! ## Usage
//!
//! ```ignore
//! use viterbi_graph::core::models::{graph::FactorGraph, ids::QueryId};
//!
//! let mut builder = FactorGraph::builder();
//! let a = builder.add_variable("a", QueryId(0), [1.0, 1.0])?;
//! builder.add_factor("bias", &[a], vec![1.0, 3.0])?;
//! let graph = builder.build();
//! ```

pub mod graph;
pub mod ids;
pub mod node;
pub mod query;
