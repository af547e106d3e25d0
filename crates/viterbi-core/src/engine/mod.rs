//! # Engine Module
//!
//! Stateful evaluation of a query against a factor-graph forest.
//!
//! ## Overview
//!
//! All mutable state of an evaluation lives in a [`workspace::Workspace`], one datum per
//! graph node. The graph itself is only read. A workspace can be reused across queries
//! but must never be shared between evaluations running at the same time.
//!
//! ## Architecture
//!
//! - **Scheduling** (`schedule`) - Leaf-to-root visitation order, forest detection
//! - **Forward Pass** (`forward`) - Max-product messages, best and total probability
//! - **Decisions** (`decision`) - Backtracking of the best joint state
//! - **Reverse Pass** (`reverse`) - Per-child messages excluding the child's own subtree
//! - **Ratios** (`ratio`) - False/true odds of free variables and pivot selection
//! - **Pipeline** ([`pipeline`]) - Typestate chaining of the stages above
//! - **Configuration** ([`config`]) - Evaluation mode and the infinite-ratio sentinel
//! - **Progress Monitoring** ([`progress`]) - Stage and batch events for front ends
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod config;
pub(crate) mod decision;
pub mod error;
pub(crate) mod forward;
pub mod output;
pub mod pipeline;
pub mod progress;
pub(crate) mod ratio;
pub(crate) mod reverse;
pub(crate) mod schedule;
pub mod workspace;
