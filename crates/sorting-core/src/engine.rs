//! Interaction Engine
//!
//! One step: pick a focal agent, assemble its interlocutors, draw a partner
//! with probability proportional to `similarity ^ h`, then copy the partner's
//! value on one flexible coordinate where the two differ.
//!
//! Every random draw (trait initialization, focal choice, interlocutor
//! sampling, partner draw, dimension choice) comes from the model's single
//! generator, so a seeded generator reproduces a run exactly.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use sorting_events::{AgentSnapshot, ModelSnapshot};

use crate::config::ModelParams;
use crate::error::ConfigurationError;
use crate::sorting::{fraction_shared_flex, SortingStats};
use crate::state::{AgentState, Dimensions};
use crate::topology::{build_grid_torus, Network};

/// What a single step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Every interlocutor had zero weight, or there were none
    NoSimilarInterlocutor { focal: usize },
    /// The drawn partner already matches the focal agent on every flexible trait
    AlreadyAligned { focal: usize, partner: usize },
    /// The focal agent adopted the partner's value on `dimension`
    Imitated {
        focal: usize,
        partner: usize,
        dimension: usize,
        previous: u32,
        adopted: u32,
    },
}

impl StepOutcome {
    /// Whether the state was modified.
    pub fn changed(&self) -> bool {
        matches!(self, StepOutcome::Imitated { .. })
    }
}

/// Counts consecutive no-op steps and decides when a run has stagnated.
///
/// Stagnation is declared once the streak exceeds `break_after * n_agents`.
/// It is a heuristic: random selection could still produce a change later.
#[derive(Debug, Clone)]
pub struct StagnationTracker {
    limit: Option<u64>,
    since_change: u64,
}

impl StagnationTracker {
    pub fn new(break_after_stagnant: Option<u64>, n_agents: usize) -> Self {
        Self {
            limit: break_after_stagnant.map(|b| b.saturating_mul(n_agents as u64)),
            since_change: 0,
        }
    }

    /// Record one step; returns true when the run should stop.
    pub fn record(&mut self, changed: bool) -> bool {
        if changed {
            self.since_change = 0;
        } else {
            self.since_change += 1;
        }
        self.is_stagnant()
    }

    pub fn is_stagnant(&self) -> bool {
        self.limit.is_some_and(|limit| self.since_change > limit)
    }

    pub fn since_change(&self) -> u64 {
        self.since_change
    }
}

/// Tally of a call to [`SortingModel::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub steps_taken: u64,
    /// Steps that modified the state
    pub changes: u64,
    /// The stagnation limit was exceeded before the step budget ran out
    pub stopped_early: bool,
}

/// Agents on a fixed network imitating similar neighbors.
///
/// Not meant to be driven from several threads at once; each instance owns
/// its generator and state outright.
#[derive(Debug, Clone)]
pub struct SortingModel<R = SmallRng> {
    params: ModelParams,
    network: Network,
    custom_network: bool,
    state: AgentState,
    steps: u64,
    rng: R,
}

impl SortingModel<SmallRng> {
    /// Model on the default periodic torus with a seeded `SmallRng`.
    pub fn seeded(params: ModelParams, seed: u64) -> Result<Self, ConfigurationError> {
        Self::new(params, None, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SortingModel<R> {
    /// Validate `params`, build the network and draw the initial state.
    ///
    /// Without `custom_network` the population is laid out on a periodic
    /// Moore torus and must be a perfect square.
    pub fn new(
        params: ModelParams,
        custom_network: Option<Network>,
        mut rng: R,
    ) -> Result<Self, ConfigurationError> {
        params.validate()?;

        let custom = custom_network.is_some();
        let network = match custom_network {
            Some(network) => {
                if network.len() != params.n_agents {
                    return Err(ConfigurationError::NetworkSizeMismatch {
                        nodes: network.len(),
                        n_agents: params.n_agents,
                    });
                }
                network
            }
            None => build_grid_torus(params.n_agents, true)?,
        };

        let state = AgentState::draw(Dimensions::from(&params), &mut rng);
        let model = Self {
            params,
            network,
            custom_network: custom,
            state,
            steps: 0,
            rng,
        };
        model.log_reset();
        Ok(model)
    }

    /// Discard the current state and draw a new population.
    pub fn reset(&mut self) {
        self.state = AgentState::draw(Dimensions::from(&self.params), &mut self.rng);
        self.steps = 0;
        self.log_reset();
    }

    /// Install an externally built state with matching dimensions.
    pub fn replace_state(&mut self, state: AgentState) -> Result<(), ConfigurationError> {
        let expected = Dimensions::from(&self.params);
        let actual = state.dims();
        let checks = [
            ("agents", expected.n_agents, actual.n_agents),
            ("flex coordinates", expected.n, actual.n),
            ("fixed-trait values", expected.k as usize, actual.k as usize),
            ("flex-trait values", expected.m as usize, actual.m as usize),
        ];
        for (what, expected, actual) in checks {
            if expected != actual {
                return Err(ConfigurationError::StateShapeMismatch { what, expected, actual });
            }
        }

        self.state = state;
        self.steps = 0;
        Ok(())
    }

    fn log_reset(&self) {
        debug!(
            n_agents = self.params.n_agents,
            groups = ?self.state.group_sizes(),
            within_pairs = self.state.within().len(),
            between_pairs = self.state.between().len(),
            custom_network = self.custom_network,
            "agent state reset"
        );
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn has_custom_network(&self) -> bool {
        self.custom_network
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn n_agents(&self) -> usize {
        self.state.n_agents()
    }

    /// Steps executed since the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn fixed_trait(&self, agent: usize) -> u32 {
        self.state.fixed_trait(agent)
    }

    pub fn flex_traits(&self, agent: usize) -> &[u32] {
        self.state.flex_traits(agent)
    }

    /// Weighted agreement of two agents in `[0, 1]`.
    ///
    /// A fixed-trait match counts `c`, each matching flexible coordinate
    /// counts 1, out of a total of `c + n`.
    pub fn similarity(&self, a1: usize, a2: usize) -> f64 {
        let fixed = if self.state.fixed_trait(a1) == self.state.fixed_trait(a2) {
            self.params.c
        } else {
            0.0
        };
        let flex = self.state.shared_flex(a1, a2) as f64;
        (fixed + flex) / (self.params.c + self.params.n as f64)
    }

    /// Fraction of flexible coordinates on which `a1` and `a2` agree.
    pub fn fraction_shared_flex(&self, a1: usize, a2: usize) -> f64 {
        fraction_shared_flex(&self.state, a1, a2)
    }

    /// Mean within-group and between-group flexible agreement.
    pub fn sorting_breakdown(&self) -> SortingStats {
        SortingStats::measure(&self.state)
    }

    /// `within_mean - between_mean`; NaN when either pair list is empty.
    pub fn calculate_sorting(&self) -> f64 {
        self.sorting_breakdown().sorting()
    }

    /// Network neighbors of `focal` with `round(gamma * degree)` of them
    /// swapped for agents drawn from the whole population.
    fn interlocutors(&mut self, focal: usize) -> Vec<usize> {
        let neighbors = self.network.neighbors(focal);
        let replaced = (self.params.gamma * neighbors.len() as f64).round() as usize;
        if replaced == 0 {
            return neighbors.to_vec();
        }

        let kept = neighbors.len() - replaced;
        let mut pool = Vec::with_capacity(neighbors.len());
        pool.extend(
            index::sample(&mut self.rng, neighbors.len(), kept)
                .into_iter()
                .map(|i| neighbors[i]),
        );
        pool.extend(index::sample(&mut self.rng, self.network.len(), replaced).into_iter());
        pool
    }

    /// Attempt one interaction and report what happened.
    pub fn step_detailed(&mut self) -> StepOutcome {
        self.steps += 1;
        let focal = self.rng.gen_range(0..self.state.n_agents());

        let pool = self.interlocutors(focal);
        let weights: Vec<f64> = pool
            .iter()
            .map(|&other| self.similarity(focal, other).powf(self.params.h))
            .collect();

        // Fails only for an empty pool or all-zero weights.
        let Ok(urn) = WeightedIndex::new(&weights) else {
            return StepOutcome::NoSimilarInterlocutor { focal };
        };
        let partner = pool[urn.sample(&mut self.rng)];

        let differing: Vec<usize> = self
            .state
            .flex_traits(focal)
            .iter()
            .zip(self.state.flex_traits(partner))
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(d, _)| d)
            .collect();

        let Some(&dimension) = differing.choose(&mut self.rng) else {
            return StepOutcome::AlreadyAligned { focal, partner };
        };

        let adopted = self.state.flex_traits(partner)[dimension];
        let previous = self.state.set_flex(focal, dimension, adopted);
        trace!(focal, partner, dimension, previous, adopted, "imitated");

        StepOutcome::Imitated {
            focal,
            partner,
            dimension,
            previous,
            adopted,
        }
    }

    /// Attempt one interaction; true if the state changed.
    pub fn step(&mut self) -> bool {
        self.step_detailed().changed()
    }

    /// Run up to `steps` steps, stopping early once more than
    /// `break_after_stagnant * n_agents` consecutive steps changed nothing.
    pub fn run(&mut self, steps: u64, break_after_stagnant: Option<u64>) -> RunSummary {
        let mut tracker = StagnationTracker::new(break_after_stagnant, self.n_agents());
        let mut summary = RunSummary::default();

        for _ in 0..steps {
            let changed = self.step();
            summary.steps_taken += 1;
            if changed {
                summary.changes += 1;
            }
            if tracker.record(changed) {
                summary.stopped_early = true;
                info!(
                    steps_taken = summary.steps_taken,
                    stagnant_steps = tracker.since_change(),
                    "run stagnated, stopping early"
                );
                break;
            }
        }

        debug!(
            steps_taken = summary.steps_taken,
            changes = summary.changes,
            stopped_early = summary.stopped_early,
            "run finished"
        );
        summary
    }

    /// Serializable copy of the current state for external collaborators.
    pub fn snapshot(&self) -> ModelSnapshot {
        let stats = self.sorting_breakdown();
        let mut snapshot = ModelSnapshot::new(self.steps);
        snapshot.sorting = stats.sorting_value();
        snapshot.within_agreement = stats.within;
        snapshot.between_agreement = stats.between;
        snapshot.agents = self
            .state
            .flex_rows()
            .enumerate()
            .map(|(agent, row)| AgentSnapshot::new(agent, self.state.fixed_trait(agent), row))
            .collect();
        snapshot
    }
}
