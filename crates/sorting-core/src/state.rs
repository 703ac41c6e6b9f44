//! Agent State Store
//!
//! Each agent holds one fixed trait (its group) and `n` flexible traits.
//! The within/between pair lists are derived from the fixed traits when the
//! state is created and never updated afterwards, since imitation only ever
//! touches flexible traits.

use rand::Rng;

use crate::config::ModelParams;
use crate::error::ConfigurationError;

/// Shape of an agent population.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Fixed-trait values
    pub k: u32,
    /// Values per flexible coordinate
    pub m: u32,
    /// Flexible coordinates per agent
    pub n: usize,
    pub n_agents: usize,
}

impl Dimensions {
    pub fn new(k: u32, m: u32, n: usize, n_agents: usize) -> Result<Self, ConfigurationError> {
        let dims = Self { k, m, n, n_agents };
        dims.validate()?;
        Ok(dims)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        let checks = [
            ("k", self.k as usize),
            ("m", self.m as usize),
            ("n", self.n),
            ("n_agents", self.n_agents),
        ];
        for (name, value) in checks {
            if value < 1 {
                return Err(ConfigurationError::InvalidDimension { name, value });
            }
        }
        Ok(())
    }
}

impl From<&ModelParams> for Dimensions {
    fn from(params: &ModelParams) -> Self {
        Self {
            k: params.k,
            m: params.m,
            n: params.n,
            n_agents: params.n_agents,
        }
    }
}

/// Trait arrays for a whole population plus the precomputed pair lists.
///
/// Building the pair lists enumerates all `N * (N - 1) / 2` agent pairs and
/// stores each one, so memory grows quadratically with the population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentState {
    dims: Dimensions,
    fixed: Vec<u32>,
    /// Row-major, `n` entries per agent
    flex: Vec<u32>,
    within: Vec<(usize, usize)>,
    between: Vec<(usize, usize)>,
}

impl AgentState {
    /// Draw a fresh population uniformly at random.
    ///
    /// All fixed traits are drawn first, then the flexible traits agent by
    /// agent, all from `rng`.
    pub fn random<R: Rng>(dims: Dimensions, rng: &mut R) -> Result<Self, ConfigurationError> {
        dims.validate()?;
        Ok(Self::draw(dims, rng))
    }

    /// `random` for dimensions that are already known to be valid.
    pub(crate) fn draw<R: Rng>(dims: Dimensions, rng: &mut R) -> Self {
        let fixed: Vec<u32> = (0..dims.n_agents).map(|_| rng.gen_range(0..dims.k)).collect();
        let flex: Vec<u32> = (0..dims.n_agents * dims.n)
            .map(|_| rng.gen_range(0..dims.m))
            .collect();

        Self::assemble(dims, fixed, flex)
    }

    /// Build a state from explicit trait values.
    pub fn from_traits(
        dims: Dimensions,
        fixed: Vec<u32>,
        flex: Vec<Vec<u32>>,
    ) -> Result<Self, ConfigurationError> {
        dims.validate()?;

        if fixed.len() != dims.n_agents {
            return Err(ConfigurationError::StateShapeMismatch {
                what: "fixed traits",
                expected: dims.n_agents,
                actual: fixed.len(),
            });
        }
        if flex.len() != dims.n_agents {
            return Err(ConfigurationError::StateShapeMismatch {
                what: "flex trait rows",
                expected: dims.n_agents,
                actual: flex.len(),
            });
        }

        for (agent, &value) in fixed.iter().enumerate() {
            if value >= dims.k {
                return Err(ConfigurationError::TraitOutOfRange {
                    agent,
                    field: "fixed_trait",
                    value,
                    bound: dims.k,
                });
            }
        }

        let mut flat = Vec::with_capacity(dims.n_agents * dims.n);
        for (agent, row) in flex.into_iter().enumerate() {
            if row.len() != dims.n {
                return Err(ConfigurationError::StateShapeMismatch {
                    what: "flex traits per agent",
                    expected: dims.n,
                    actual: row.len(),
                });
            }
            if let Some(&value) = row.iter().find(|&&v| v >= dims.m) {
                return Err(ConfigurationError::TraitOutOfRange {
                    agent,
                    field: "flex_traits",
                    value,
                    bound: dims.m,
                });
            }
            flat.extend(row);
        }

        Ok(Self::assemble(dims, fixed, flat))
    }

    fn assemble(dims: Dimensions, fixed: Vec<u32>, flex: Vec<u32>) -> Self {
        let mut within = Vec::new();
        let mut between = Vec::new();
        for i1 in 0..fixed.len() {
            for i2 in (i1 + 1)..fixed.len() {
                if fixed[i1] == fixed[i2] {
                    within.push((i1, i2));
                } else {
                    between.push((i1, i2));
                }
            }
        }

        Self {
            dims,
            fixed,
            flex,
            within,
            between,
        }
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn n_agents(&self) -> usize {
        self.dims.n_agents
    }

    pub fn fixed_trait(&self, agent: usize) -> u32 {
        self.fixed[agent]
    }

    pub fn fixed_traits(&self) -> &[u32] {
        &self.fixed
    }

    pub fn flex_traits(&self, agent: usize) -> &[u32] {
        let n = self.dims.n;
        &self.flex[agent * n..(agent + 1) * n]
    }

    /// Iterate over every agent's flexible traits in index order.
    pub fn flex_rows(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.flex.chunks_exact(self.dims.n)
    }

    /// Overwrite one flexible coordinate of `agent`, returning the old value.
    pub(crate) fn set_flex(&mut self, agent: usize, dimension: usize, value: u32) -> u32 {
        let slot = &mut self.flex[agent * self.dims.n + dimension];
        std::mem::replace(slot, value)
    }

    /// Same-group pairs `(i1, i2)` with `i1 < i2`.
    pub fn within(&self) -> &[(usize, usize)] {
        &self.within
    }

    /// Different-group pairs `(i1, i2)` with `i1 < i2`.
    pub fn between(&self) -> &[(usize, usize)] {
        &self.between
    }

    /// Agent count for each fixed-trait value.
    pub fn group_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.dims.k as usize];
        for &g in &self.fixed {
            sizes[g as usize] += 1;
        }
        sizes
    }

    /// Number of flexible coordinates on which `a` and `b` agree.
    pub fn shared_flex(&self, a: usize, b: usize) -> usize {
        self.flex_traits(a)
            .iter()
            .zip(self.flex_traits(b))
            .filter(|(x, y)| x == y)
            .count()
    }
}
