//! Sorting Statistic
//!
//! How much more agents agree with their own group than with the other
//! groups, on flexible traits only.

use crate::state::AgentState;

/// Fraction of flexible coordinates on which `a1` and `a2` agree.
pub fn fraction_shared_flex(state: &AgentState, a1: usize, a2: usize) -> f64 {
    state.shared_flex(a1, a2) as f64 / state.dims().n as f64
}

/// Mean flexible agreement over same-group and cross-group pairs.
///
/// A side is `None` when its pair list is empty, e.g. with a single group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortingStats {
    pub within: Option<f64>,
    pub between: Option<f64>,
}

impl SortingStats {
    pub fn measure(state: &AgentState) -> Self {
        Self {
            within: mean_agreement(state, state.within()),
            between: mean_agreement(state, state.between()),
        }
    }

    /// `within - between`, if both sides are defined.
    pub fn sorting_value(&self) -> Option<f64> {
        Some(self.within? - self.between?)
    }

    /// `within - between`, NaN when either side is undefined.
    pub fn sorting(&self) -> f64 {
        self.sorting_value().unwrap_or(f64::NAN)
    }
}

fn mean_agreement(state: &AgentState, pairs: &[(usize, usize)]) -> Option<f64> {
    if pairs.is_empty() {
        return None;
    }
    let total: f64 = pairs
        .iter()
        .map(|&(a, b)| fraction_shared_flex(state, a, b))
        .sum();
    Some(total / pairs.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Dimensions;

    fn state(k: u32, fixed: Vec<u32>, flex: Vec<Vec<u32>>) -> AgentState {
        let n = flex[0].len();
        let dims = Dimensions::new(k, 4, n, fixed.len()).unwrap();
        AgentState::from_traits(dims, fixed, flex).unwrap()
    }

    #[test]
    fn test_fraction_shared_flex() {
        let s = state(1, vec![0, 0], vec![vec![0, 1, 2, 3], vec![0, 1, 0, 0]]);
        assert_eq!(fraction_shared_flex(&s, 0, 1), 0.5);
        assert_eq!(fraction_shared_flex(&s, 1, 1), 1.0);
    }

    #[test]
    fn test_perfectly_sorted_population() {
        // Each group shares one opinion profile, the groups share nothing.
        let s = state(
            2,
            vec![0, 0, 1, 1],
            vec![vec![0, 0], vec![0, 0], vec![1, 1], vec![1, 1]],
        );
        let stats = SortingStats::measure(&s);

        assert_eq!(stats.within, Some(1.0));
        assert_eq!(stats.between, Some(0.0));
        assert_eq!(stats.sorting(), 1.0);
    }

    #[test]
    fn test_cross_cutting_population_is_negative() {
        // Opinions line up across group lines instead of within them.
        let s = state(
            2,
            vec![0, 0, 1, 1],
            vec![vec![0], vec![1], vec![0], vec![1]],
        );
        let stats = SortingStats::measure(&s);

        assert_eq!(stats.within, Some(0.0));
        assert_eq!(stats.between, Some(0.5));
        assert_eq!(stats.sorting(), -0.5);
    }

    #[test]
    fn test_single_group_is_undefined() {
        let s = state(1, vec![0, 0, 0], vec![vec![1], vec![1], vec![2]]);
        let stats = SortingStats::measure(&s);

        assert!(stats.within.is_some());
        assert_eq!(stats.between, None);
        assert_eq!(stats.sorting_value(), None);
        assert!(stats.sorting().is_nan());
    }
}
