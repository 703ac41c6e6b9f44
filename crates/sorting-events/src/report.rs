//! Run Report Types
//!
//! The record a driver emits after stepping a model: the parameters it ran
//! with, the sorting trajectory, and the final state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ModelSnapshot;

/// Generates a unique run ID.
pub fn generate_run_id() -> String {
    format!("run_{}", Uuid::new_v4().simple())
}

/// Model parameters as recorded in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamsRecord {
    pub k: u32,
    pub m: u32,
    pub n: usize,
    pub n_agents: usize,
    pub gamma: f64,
    pub h: f64,
    pub c: f64,
}

/// Sorting statistic observed after a given number of steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SortingSample {
    pub step: u64,
    /// Null when the within or between pair list is empty
    pub sorting: Option<f64>,
    /// Consecutive no-op steps at the time of sampling
    pub stagnant_steps: u64,
}

/// Full record of a single run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub seed: u64,
    pub params: ParamsRecord,
    pub steps_requested: u64,
    pub steps_taken: u64,
    pub changes: u64,
    pub stopped_early: bool,
    #[serde(default)]
    pub samples: Vec<SortingSample>,
    pub final_state: ModelSnapshot,
}

impl RunReport {
    /// Last recorded sorting value, if any sample has one.
    pub fn final_sorting(&self) -> Option<f64> {
        self.samples.iter().rev().find_map(|s| s.sorting)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> RunReport {
        RunReport {
            run_id: generate_run_id(),
            seed: 7,
            params: ParamsRecord {
                k: 2,
                m: 10,
                n: 4,
                n_agents: 100,
                gamma: 0.0,
                h: 8.0,
                c: 1.0,
            },
            steps_requested: 2000,
            steps_taken: 2000,
            changes: 812,
            stopped_early: false,
            samples: vec![
                SortingSample { step: 0, sorting: Some(0.01), stagnant_steps: 0 },
                SortingSample { step: 1000, sorting: Some(0.12), stagnant_steps: 3 },
                SortingSample { step: 2000, sorting: None, stagnant_steps: 0 },
            ],
            final_state: ModelSnapshot::new(2000),
        }
    }

    #[test]
    fn test_generate_run_id() {
        let a = generate_run_id();
        let b = generate_run_id();

        assert!(a.starts_with("run_"));
        assert_eq!(a.len(), "run_".len() + 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_final_sorting_skips_undefined_samples() {
        let report = sample_report();
        assert_eq!(report.final_sorting(), Some(0.12));
    }

    #[test]
    fn test_report_json_keeps_samples() {
        let report = sample_report();
        let parsed = RunReport::from_json(&report.to_json().unwrap()).unwrap();

        assert_eq!(parsed.run_id, report.run_id);
        assert_eq!(parsed.samples.len(), 3);
        assert_eq!(parsed.samples[2].sorting, None);
        assert_eq!(parsed.params, report.params);
    }
}
