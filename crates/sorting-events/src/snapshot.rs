//! Snapshot Types
//!
//! Serialization structs for the agent state of a model at a point in time.

use serde::{Deserialize, Serialize};

/// One agent's traits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent: usize,
    pub fixed_trait: u32,
    pub flex_traits: Vec<u32>,
}

impl AgentSnapshot {
    pub fn new(agent: usize, fixed_trait: u32, flex_traits: impl Into<Vec<u32>>) -> Self {
        Self {
            agent,
            fixed_trait,
            flex_traits: flex_traits.into(),
        }
    }
}

/// Complete model state after a number of steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSnapshot {
    /// Steps executed since the last reset
    pub steps: u64,
    /// `within_agreement - between_agreement`; absent when either side is undefined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorting: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub within_agreement: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub between_agreement: Option<f64>,
    #[serde(default)]
    pub agents: Vec<AgentSnapshot>,
}

impl ModelSnapshot {
    pub fn new(steps: u64) -> Self {
        Self {
            steps,
            sorting: None,
            within_agreement: None,
            between_agreement: None,
            agents: Vec::new(),
        }
    }

    /// Number of agents holding each fixed-trait value, indexed by value.
    pub fn group_sizes(&self) -> Vec<usize> {
        let groups = self
            .agents
            .iter()
            .map(|a| a.fixed_trait as usize + 1)
            .max()
            .unwrap_or(0);
        let mut sizes = vec![0; groups];
        for agent in &self.agents {
            sizes[agent.fixed_trait as usize] += 1;
        }
        sizes
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
