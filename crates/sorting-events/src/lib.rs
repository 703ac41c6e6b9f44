//! Shared record types for the partisan sorting model.
//!
//! This crate contains pure data structures with no simulation logic.
//! Plotting, sweep and persistence tooling reads these instead of reaching
//! into the engine.

pub mod report;
pub mod snapshot;

// Re-export snapshot types
pub use snapshot::{AgentSnapshot, ModelSnapshot};

// Re-export report types
pub use report::{generate_run_id, ParamsRecord, RunReport, SortingSample};
