//! # Core Module
//!
//! Stateless building blocks shared by the engine and the workflows.
//!
//! - **Graph Representation** ([`models`]) - Nodes, graphs, identifiers and queries
//! - **File I/O** ([`io`]) - TOML descriptions of graphs and query batches
//!
//! Nothing in this module holds evaluation state. Graphs are immutable once built and
//! may be shared read-only between concurrent evaluations.

pub mod io;
pub mod models;
