//! Input/output helpers.
//!
//! - partition discovery + CSV ingest + validation (`ingest`)
//! - consolidated CSV export and re-read (`export`)
//! - summary JSON export (`summary`)

pub mod export;
pub mod ingest;
pub mod summary;

pub use export::*;
pub use ingest::*;
pub use summary::*;
