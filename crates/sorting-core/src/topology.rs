//! Topology Generator
//!
//! The fixed undirected graph that decides who may interact with whom. Nodes
//! are petgraph indices, which are always dense `0..N-1`; networks built
//! from opaque node identities carry the labeled graph alongside as a
//! [`NodeLabels`] bijection.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::error::ConfigurationError;

/// Immutable undirected graph over dense agent indices.
#[derive(Debug, Clone)]
pub struct Network {
    graph: UnGraph<usize, ()>,
    /// Sorted neighbor lists, so interlocutor sampling can index into a slice
    neighbors: Vec<Vec<usize>>,
}

impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        self.neighbors == other.neighbors
    }
}

impl Eq for Network {}

impl Network {
    /// Build a network over `node_count` dense indices.
    ///
    /// Duplicate edges collapse into one. Every node must end up with at
    /// least one neighbor.
    pub fn from_edges(
        node_count: usize,
        edges: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, ConfigurationError> {
        if node_count == 0 {
            return Err(ConfigurationError::EmptyNetwork);
        }

        let mut graph: UnGraph<usize, ()> = UnGraph::with_capacity(node_count, 0);
        let nodes: Vec<NodeIndex> = (0..node_count).map(|i| graph.add_node(i)).collect();
        for (from, to) in edges {
            if from >= node_count || to >= node_count {
                return Err(ConfigurationError::EdgeOutOfRange { from, to, node_count });
            }
            if from == to {
                return Err(ConfigurationError::SelfLoop { node: from });
            }
            graph.update_edge(nodes[from], nodes[to], ());
        }

        let neighbors: Vec<Vec<usize>> = nodes
            .iter()
            .map(|&node| {
                let mut list: Vec<usize> = graph.neighbors(node).map(|n| n.index()).collect();
                list.sort_unstable();
                list
            })
            .collect();

        if let Some(node) = neighbors.iter().position(Vec::is_empty) {
            return Err(ConfigurationError::IsolatedNode { node });
        }

        Ok(Self { graph, neighbors })
    }

    /// Adopt the shape of any petgraph undirected graph.
    ///
    /// Node and edge weights are ignored; agent `i` is graph node `i`.
    pub fn from_graph<N, E>(graph: &UnGraph<N, E>) -> Result<Self, ConfigurationError> {
        let edges = graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()));
        Self::from_edges(graph.node_count(), edges)
    }

    /// Build a network from arbitrary node identities.
    ///
    /// Indices are assigned in the order `nodes` yields them; repeated labels
    /// keep their first index.
    pub fn from_labeled_edges<K>(
        nodes: impl IntoIterator<Item = K>,
        edges: impl IntoIterator<Item = (K, K)>,
    ) -> Result<(Self, NodeLabels<K>), ConfigurationError>
    where
        K: Eq + Hash + Clone + std::fmt::Debug,
    {
        let mut graph: UnGraph<K, ()> = UnGraph::new_undirected();
        let mut positions = HashMap::new();
        for label in nodes {
            if !positions.contains_key(&label) {
                let node = graph.add_node(label.clone());
                positions.insert(label, node);
            }
        }

        for (a, b) in edges {
            let lookup = |label: &K| {
                positions
                    .get(label)
                    .copied()
                    .ok_or_else(|| ConfigurationError::UnknownNode {
                        label: format!("{label:?}"),
                    })
            };
            let (a, b) = (lookup(&a)?, lookup(&b)?);
            graph.add_edge(a, b, ());
        }

        let network = Self::from_graph(&graph)?;
        Ok((network, NodeLabels { graph, positions }))
    }

    /// Underlying petgraph graph; node weights are the agent indices.
    pub fn graph(&self) -> &UnGraph<usize, ()> {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All node indices.
    pub fn nodes(&self) -> Range<usize> {
        0..self.len()
    }

    /// Sorted neighbors of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a valid index.
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.neighbors[node]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.neighbors[node].len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_edge(&self, a: usize, b: usize) -> bool {
        a < self.len()
            && b < self.len()
            && self.graph.contains_edge(NodeIndex::new(a), NodeIndex::new(b))
    }
}

/// Bijection between node identities and dense indices.
#[derive(Debug, Clone)]
pub struct NodeLabels<K> {
    graph: UnGraph<K, ()>,
    positions: HashMap<K, NodeIndex>,
}

impl<K: Eq + Hash> NodeLabels<K> {
    pub fn index(&self, label: &K) -> Option<usize> {
        self.positions.get(label).map(|n| n.index())
    }

    pub fn label(&self, index: usize) -> Option<&K> {
        self.graph.node_weight(NodeIndex::new(index))
    }

    /// The labeled graph the network was built from.
    pub fn graph(&self) -> &UnGraph<K, ()> {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

/// Position of a node on a square grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCoord {
    pub row: usize,
    pub col: usize,
}

impl GridCoord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Dense index of this cell on a grid `side` cells wide.
    pub fn index(self, side: usize) -> usize {
        self.row * side + self.col
    }

    pub fn from_index(index: usize, side: usize) -> Self {
        Self::new(index / side, index % side)
    }
}

/// Integer square root of `n_agents`, if it is a perfect square.
pub fn grid_side(n_agents: usize) -> Option<usize> {
    let approx = (n_agents as f64).sqrt().round() as usize;
    // Check neighbours of the float estimate to absorb rounding.
    (approx.saturating_sub(1)..=approx.saturating_add(1))
        .find(|s| s.checked_mul(*s) == Some(n_agents))
}

/// Square grid with the full Moore neighborhood.
///
/// Edges run from each cell to its left, up, upper-left and upper-right
/// cells. With `periodic`, the same four relations wrap around both axes
/// (only when the side exceeds 2, otherwise the wraps would repeat existing
/// edges) and the two corner diagonals are joined.
///
/// Every cell of a periodic grid has exactly 8 neighbors only when the side
/// is at least 3. A 2x2 torus gives each cell 3 neighbors, and a 1x1 grid
/// has none, so it fails with [`ConfigurationError::IsolatedNode`].
pub fn build_grid_torus(n_agents: usize, periodic: bool) -> Result<Network, ConfigurationError> {
    let side = grid_side(n_agents).ok_or(ConfigurationError::NonSquarePopulation { n_agents })?;
    if side == 0 {
        return Err(ConfigurationError::EmptyNetwork);
    }

    let mut grid: UnGraph<GridCoord, ()> = UnGraph::new_undirected();
    // Row-major insertion makes the petgraph index equal `GridCoord::index`.
    let cells: Vec<NodeIndex> = (0..n_agents)
        .map(|i| grid.add_node(GridCoord::from_index(i, side)))
        .collect();
    let at = |row: usize, col: usize| cells[GridCoord::new(row, col).index(side)];
    let last = side - 1;

    let mut connect = |a: NodeIndex, b: NodeIndex| {
        // A 1x1 torus only produces self-loops; skip them and let the
        // isolated-node check reject it.
        if a != b {
            grid.update_edge(a, b, ());
        }
    };

    for i in 0..side {
        for j in 0..side {
            if i > 0 {
                connect(at(i, j), at(i - 1, j));
            }
            if j > 0 {
                connect(at(i, j), at(i, j - 1));
            }
            if i > 0 && j > 0 {
                connect(at(i, j), at(i - 1, j - 1));
            }
            if i > 0 && j < last {
                connect(at(i, j), at(i - 1, j + 1));
            }
        }
    }

    if periodic {
        if side > 2 {
            for i in 0..side {
                connect(at(i, 0), at(i, last));
                if i > 0 {
                    connect(at(i, 0), at(i - 1, last));
                }
                if i < last {
                    connect(at(i, 0), at(i + 1, last));
                }
            }
            for j in 0..side {
                connect(at(0, j), at(last, j));
                if j > 0 {
                    connect(at(0, j), at(last, j - 1));
                }
                if j < last {
                    connect(at(0, j), at(last, j + 1));
                }
            }
        }

        // Diagonal to diagonal
        connect(at(0, 0), at(last, last));
        connect(at(last, 0), at(0, last));
    }

    Network::from_graph(&grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_side() {
        assert_eq!(grid_side(9), Some(3));
        assert_eq!(grid_side(100), Some(10));
        assert_eq!(grid_side(1), Some(1));
        assert_eq!(grid_side(10), None);
        assert_eq!(grid_side(99), None);
    }

    #[test]
    fn test_huge_population_is_not_square() {
        assert_eq!(grid_side(usize::MAX), None);
        assert_eq!(
            build_grid_torus(usize::MAX, true),
            Err(ConfigurationError::NonSquarePopulation { n_agents: usize::MAX })
        );
    }

    #[test]
    fn test_non_square_population_rejected() {
        assert_eq!(
            build_grid_torus(10, true),
            Err(ConfigurationError::NonSquarePopulation { n_agents: 10 })
        );
        assert!(build_grid_torus(9, true).is_ok());
    }

    #[test]
    fn test_periodic_torus_has_eight_neighbors_everywhere() {
        for side in 3..=8 {
            let network = build_grid_torus(side * side, true).unwrap();
            assert_eq!(network.len(), side * side);
            for node in network.nodes() {
                assert_eq!(network.degree(node), 8, "side {side}, node {node}");
            }
            assert_eq!(network.edge_count(), 4 * side * side);
        }
    }

    #[test]
    fn test_open_grid_boundary_degrees() {
        let side = 5;
        let network = build_grid_torus(side * side, false).unwrap();
        let at = |r, c| GridCoord::new(r, c).index(side);

        assert_eq!(network.degree(at(0, 0)), 3);
        assert_eq!(network.degree(at(4, 4)), 3);
        assert_eq!(network.degree(at(0, 2)), 5);
        assert_eq!(network.degree(at(2, 0)), 5);
        assert_eq!(network.degree(at(2, 2)), 8);
        assert_eq!(network.edge_count(), 4 * side * side - 6 * side + 2);
    }

    #[test]
    fn test_torus_wraps_corners() {
        let side = 4;
        let network = build_grid_torus(side * side, true).unwrap();
        let at = |r, c| GridCoord::new(r, c).index(side);

        assert!(network.contains_edge(at(0, 0), at(3, 3)));
        assert!(network.contains_edge(at(3, 0), at(0, 3)));
        assert!(network.contains_edge(at(0, 0), at(0, 3)));
        assert!(network.contains_edge(at(0, 0), at(3, 0)));
        assert!(network.contains_edge(at(0, 0), at(1, 3)));
        assert!(network.contains_edge(at(0, 0), at(3, 1)));
        assert!(!network.contains_edge(at(0, 0), at(2, 2)));
    }

    #[test]
    fn test_neighbors_are_symmetric() {
        let network = build_grid_torus(36, true).unwrap();
        for a in network.nodes() {
            for &b in network.neighbors(a) {
                assert!(network.neighbors(b).contains(&a));
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_small_tori() {
        let two = build_grid_torus(4, true).unwrap();
        for node in two.nodes() {
            assert_eq!(two.degree(node), 3);
        }

        assert_eq!(
            build_grid_torus(1, true),
            Err(ConfigurationError::IsolatedNode { node: 0 })
        );
    }

    #[test]
    fn test_from_edges_validation() {
        assert_eq!(
            Network::from_edges(0, Vec::<(usize, usize)>::new()),
            Err(ConfigurationError::EmptyNetwork)
        );
        assert_eq!(
            Network::from_edges(3, [(0, 3)]),
            Err(ConfigurationError::EdgeOutOfRange { from: 0, to: 3, node_count: 3 })
        );
        assert_eq!(
            Network::from_edges(2, [(1, 1)]),
            Err(ConfigurationError::SelfLoop { node: 1 })
        );
        assert_eq!(
            Network::from_edges(3, [(0, 1)]),
            Err(ConfigurationError::IsolatedNode { node: 2 })
        );
    }

    #[test]
    fn test_from_edges_collapses_duplicates() {
        let network = Network::from_edges(3, [(0, 1), (1, 0), (1, 2), (0, 1)]).unwrap();
        assert_eq!(network.edge_count(), 2);
        assert_eq!(network.neighbors(1), &[0, 2]);
    }

    #[test]
    fn test_from_graph_ignores_weights() {
        let mut graph: UnGraph<&str, f32> = UnGraph::new_undirected();
        let a = graph.add_node("a");
        let b = graph.add_node("b");
        let c = graph.add_node("c");
        graph.add_edge(a, b, 0.5);
        graph.add_edge(c, b, 2.0);

        let network = Network::from_graph(&graph).unwrap();
        assert_eq!(network.len(), 3);
        assert_eq!(network.neighbors(1), &[0, 2]);
        assert_eq!(network.graph().node_weight(NodeIndex::new(2)), Some(&2));

        graph.add_edge(c, c, 1.0);
        assert_eq!(
            Network::from_graph(&graph),
            Err(ConfigurationError::SelfLoop { node: 2 })
        );
    }

    #[test]
    fn test_labeled_edges_build_bijection() {
        let (network, labels) = Network::from_labeled_edges(
            ["carol", "alice", "bob"],
            [("alice", "bob"), ("bob", "carol")],
        )
        .unwrap();

        assert_eq!(labels.len(), 3);
        assert_eq!(labels.index(&"carol"), Some(0));
        assert_eq!(labels.label(1), Some(&"alice"));
        assert!(network.contains_edge(1, 2));
        assert!(network.contains_edge(2, 0));
        assert!(!network.contains_edge(0, 1));
        assert!(!network.contains_edge(0, 7));
        assert_eq!(labels.graph().edge_count(), 2);

        let err = Network::from_labeled_edges(["a", "b"], [("a", "z")]).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownNode { .. }));
    }

    #[test]
    fn test_grid_coord_mapping() {
        let coord = GridCoord::new(2, 3);
        assert_eq!(coord.index(5), 13);
        assert_eq!(GridCoord::from_index(13, 5), coord);
    }
}
