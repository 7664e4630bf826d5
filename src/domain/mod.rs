//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - source readings (`Reading`, `MetricKind`)
//! - the merged table (`ConsolidatedRow`) and its enriched form (`EnrichedRow`)
//! - run configuration (`PipelineConfig`, `ColumnNames`, `PartitionLayout`, `BudgetParams`)

pub mod types;

pub use types::*;
