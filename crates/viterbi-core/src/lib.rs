//! # Viterbi Graph Library
//!
//! Max-product belief propagation over binary factor graphs that form a forest. For a
//! query of hard, partial, or missing evidence the library finds the most probable joint
//! state, the probability of that state, the total probability of the evidence, and the
//! unresolved variable whose value matters most (the pivot).
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Immutable graph models, evidence queries and the TOML
//!   loaders that build them.
//!
//! - **[`engine`]: The Logic Core.** The per-evaluation [`engine::workspace::Workspace`] and
//!   the stages that fill it: leaf-peeling scheduling, the forward pass, decision
//!   backtracking, the reverse pass and the pivot ratios. The stages are chained through the
//!   typestate [`engine::pipeline::Evaluation`] so they cannot run out of order.
//!
//! - **[`workflows`]: The Public API.** One-call evaluation of a single query and parallel
//!   evaluation of query batches, with progress reporting.

pub mod core;
pub mod engine;
pub mod workflows;
