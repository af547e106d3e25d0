//! Reading probability graphs and query batches from TOML files.
//!
//! Both formats refer to variables by name. Graph files declare variables and
//! factors; query files attach evidence to the variables of an already loaded graph.

pub mod graph_file;
pub mod query_file;
