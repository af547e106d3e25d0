//! # Workflows Module
//!
//! Top-level entry points of the library.
//!
//! - **Single Query** ([`evaluate`]) - Lightweight or full evaluation of one query, on a
//!   fresh or caller-owned workspace
//! - **Batches** ([`batch`]) - Many queries against one shared graph, in parallel when the
//!   `parallel` feature is enabled
//!
//! Both report their progress through [`crate::engine::progress::ProgressReporter`].

pub mod batch;
pub mod evaluate;
