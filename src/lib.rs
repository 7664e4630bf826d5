//! `solar-pr` library crate.
//!
//! The binary (`solar-pr`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - stages are reusable on their own (ingest, merge, metrics, filter, export)
//! - code stays easy to navigate as the project grows
//!
//! Data flow: partitions -> `io::ingest` -> `merge` -> `metrics` -> `filter`
//! -> `io::export` / `report` / `plot`.

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod filter;
pub mod io;
pub mod merge;
pub mod metrics;
pub mod plot;
pub mod report;
