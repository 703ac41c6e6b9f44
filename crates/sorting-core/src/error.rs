//! Error Types
//!
//! `ConfigurationError` is the only failure the model itself can produce.
//! It is raised while constructing a model, building a network or
//! installing a state; stepping a valid model never fails.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid model parameters, network or state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{name} must be at least 1, got {value}")]
    InvalidDimension { name: &'static str, value: usize },

    #[error("a square grid torus needs a population with an integer square root, got {n_agents}")]
    NonSquarePopulation { n_agents: usize },

    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("homophily exponent h must be finite and non-negative, got {value}")]
    InvalidExponent { value: f64 },

    #[error("{name} weight must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("network has no nodes")]
    EmptyNetwork,

    #[error("edge ({from}, {to}) references a node outside 0..{node_count}")]
    EdgeOutOfRange { from: usize, to: usize, node_count: usize },

    #[error("self-loop on node {node}")]
    SelfLoop { node: usize },

    #[error("node {node} has no neighbors")]
    IsolatedNode { node: usize },

    #[error("edge references unknown node {label}")]
    UnknownNode { label: String },

    #[error("custom network has {nodes} nodes but the population is {n_agents}")]
    NetworkSizeMismatch { nodes: usize, n_agents: usize },

    #[error("agent {agent}: {field} value {value} is outside 0..{bound}")]
    TraitOutOfRange {
        agent: usize,
        field: &'static str,
        value: u32,
        bound: u32,
    },

    #[error("state shape mismatch: expected {expected} {what}, got {actual}")]
    StateShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Failure loading or emitting a configuration file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigurationError),
}
