//! Partisan sorting model.
//!
//! Agents on a fixed social network carry an immutable group identity and a
//! handful of mutable opinions. Each step one agent picks an interlocutor,
//! favouring similar ones, and copies one opinion where they differ. Over
//! time opinions can become aligned with group identity; the sorting
//! statistic measures how far.

pub mod config;
pub mod engine;
pub mod error;
pub mod sorting;
pub mod state;
pub mod topology;

pub use config::{Config, ModelParams, RunConfig, DEFAULT_CONFIG_PATH};
pub use engine::{RunSummary, SortingModel, StagnationTracker, StepOutcome};
pub use error::{ConfigurationError, LoadError};
pub use sorting::{fraction_shared_flex, SortingStats};
pub use state::{AgentState, Dimensions};
pub use topology::{build_grid_torus, grid_side, GridCoord, Network, NodeLabels};
