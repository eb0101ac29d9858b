//! Device connectivity graph.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::{RouteError, RouteResult};

/// Sentinel distance for unreachable qubit pairs.
const UNREACHABLE: u32 = u32::MAX;

/// The coupling map of a physical device: which pairs of physical
/// qubits support a two-qubit gate.
///
/// Construction eagerly computes an all-pairs shortest-path distance
/// table (one BFS per qubit) and connected-component labels. Both are
/// read-only afterwards and amortized over every routing call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplingMap {
    /// Undirected coupling edges.
    edges: Vec<(u32, u32)>,
    /// Number of physical qubits.
    num_qubits: u32,
    /// Adjacency list, indexed by physical qubit.
    #[serde(skip)]
    adjacency: Vec<Vec<u32>>,
    /// `distance[a][b]` is the shortest-path hop count, or `u32::MAX`
    /// across components.
    #[serde(skip)]
    distance: Vec<Vec<u32>>,
    /// Connected-component label per physical qubit.
    #[serde(skip)]
    component: Vec<u32>,
}

impl CouplingMap {
    /// Build a coupling map from an undirected edge list.
    ///
    /// Duplicate edges (in either direction) and self-loops are ignored.
    pub fn from_edges(num_qubits: u32, edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut map = Self {
            edges: vec![],
            num_qubits,
            adjacency: vec![],
            distance: vec![],
            component: vec![],
        };
        for (a, b) in edges {
            if a == b || a >= num_qubits || b >= num_qubits {
                continue;
            }
            if map
                .edges
                .iter()
                .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
            {
                continue;
            }
            map.edges.push((a, b));
        }
        map.rebuild_caches();
        map
    }

    /// Rebuild the adjacency list, distance table, and component labels
    /// from the edge list. Must be called after deserialization.
    pub fn rebuild_caches(&mut self) {
        let n = self.num_qubits as usize;
        self.adjacency = vec![vec![]; n];
        for &(a, b) in &self.edges {
            self.adjacency[a as usize].push(b);
            self.adjacency[b as usize].push(a);
        }
        for neighbors in &mut self.adjacency {
            neighbors.sort_unstable();
        }

        self.distance = vec![vec![UNREACHABLE; n]; n];
        for src in 0..n {
            let row = &mut self.distance[src];
            row[src] = 0;
            let mut queue = VecDeque::new();
            queue.push_back(src as u32);
            while let Some(current) = queue.pop_front() {
                let d = row[current as usize];
                for &neighbor in &self.adjacency[current as usize] {
                    if row[neighbor as usize] == UNREACHABLE {
                        row[neighbor as usize] = d + 1;
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        self.component = vec![UNREACHABLE; n];
        let mut next_label = 0u32;
        for start in 0..n {
            if self.component[start] != UNREACHABLE {
                continue;
            }
            self.component[start] = next_label;
            let mut queue = VecDeque::from([start as u32]);
            while let Some(current) = queue.pop_front() {
                for &neighbor in &self.adjacency[current as usize] {
                    if self.component[neighbor as usize] == UNREACHABLE {
                        self.component[neighbor as usize] = next_label;
                        queue.push_back(neighbor);
                    }
                }
            }
            next_label += 1;
        }
    }

    /// Number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// The coupling edges.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Check if two physical qubits are directly coupled.
    #[inline]
    pub fn is_connected(&self, a: u32, b: u32) -> bool {
        self.adjacency[a as usize].binary_search(&b).is_ok()
    }

    /// Neighbors of a physical qubit.
    #[inline]
    pub fn neighbors(&self, qubit: u32) -> &[u32] {
        &self.adjacency[qubit as usize]
    }

    /// Shortest-path distance between two physical qubits, or `None`
    /// across connected components.
    #[inline]
    pub fn distance(&self, a: u32, b: u32) -> Option<u32> {
        let d = self.distance[a as usize][b as usize];
        (d != UNREACHABLE).then_some(d)
    }

    /// Shortest-path distance, failing with [`RouteError::DisconnectedTopology`]
    /// across components.
    pub fn checked_distance(&self, a: u32, b: u32) -> RouteResult<u32> {
        self.distance(a, b)
            .ok_or(RouteError::DisconnectedTopology { a, b })
    }

    /// Check whether two physical qubits share a connected component.
    #[inline]
    pub fn same_component(&self, a: u32, b: u32) -> bool {
        self.component[a as usize] == self.component[b as usize]
    }

    /// Whether every pair of physical qubits is directly coupled.
    pub fn is_complete(&self) -> bool {
        let n = self.num_qubits as usize;
        self.edges.len() == n * (n - 1) / 2
    }

    /// Create a linear chain 0-1-2-...
    pub fn linear(n: u32) -> Self {
        Self::from_edges(n, (0..n.saturating_sub(1)).map(|i| (i, i + 1)))
    }

    /// Create a ring 0-1-...-n-0.
    pub fn ring(n: u32) -> Self {
        let wrap = if n > 2 { Some((n - 1, 0)) } else { None };
        Self::from_edges(
            n,
            (0..n.saturating_sub(1)).map(|i| (i, i + 1)).chain(wrap),
        )
    }

    /// Create a rows × cols rectangular grid.
    pub fn grid(rows: u32, cols: u32) -> Self {
        let mut edges = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let q = r * cols + c;
                if c + 1 < cols {
                    edges.push((q, q + 1));
                }
                if r + 1 < rows {
                    edges.push((q, q + cols));
                }
            }
        }
        Self::from_edges(rows * cols, edges)
    }

    /// Create a star topology (qubit 0 coupled to all others).
    pub fn star(n: u32) -> Self {
        Self::from_edges(n, (1..n).map(|i| (0, i)))
    }

    /// Create a fully connected coupling map.
    pub fn full(n: u32) -> Self {
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((i, j));
            }
        }
        Self::from_edges(n, edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_distances() {
        let map = CouplingMap::linear(5);
        assert!(map.is_connected(0, 1));
        assert!(!map.is_connected(0, 2));
        assert_eq!(map.distance(0, 4), Some(4));
        assert_eq!(map.distance(2, 2), Some(0));
    }

    #[test]
    fn test_ring_wraps() {
        let map = CouplingMap::ring(6);
        assert!(map.is_connected(5, 0));
        assert_eq!(map.distance(0, 3), Some(3));
        assert_eq!(map.distance(0, 5), Some(1));
    }

    #[test]
    fn test_grid_distances() {
        let map = CouplingMap::grid(2, 3);
        // 0-1-2
        // 3-4-5
        assert!(map.is_connected(1, 4));
        assert_eq!(map.distance(0, 5), Some(3));
    }

    #[test]
    fn test_star() {
        let map = CouplingMap::star(5);
        assert!(map.is_connected(0, 4));
        assert!(!map.is_connected(1, 2));
        assert_eq!(map.distance(1, 2), Some(2));
    }

    #[test]
    fn test_full_is_complete() {
        assert!(CouplingMap::full(4).is_complete());
        assert!(!CouplingMap::linear(4).is_complete());
    }

    #[test]
    fn test_disconnected_components() {
        let map = CouplingMap::from_edges(4, [(0, 1), (2, 3)]);
        assert_eq!(map.distance(0, 3), None);
        assert!(map.same_component(0, 1));
        assert!(!map.same_component(1, 2));
        assert!(matches!(
            map.checked_distance(0, 2),
            Err(RouteError::DisconnectedTopology { a: 0, b: 2 })
        ));
    }

    #[test]
    fn test_serde_rebuilds_caches() {
        let map = CouplingMap::grid(2, 2);
        let json = serde_json::to_string(&map).unwrap();
        let mut back: CouplingMap = serde_json::from_str(&json).unwrap();
        back.rebuild_caches();
        assert_eq!(back.distance(0, 3), Some(2));
        assert!(back.is_connected(0, 1));
    }

    #[test]
    fn test_duplicate_edges_ignored() {
        let map = CouplingMap::from_edges(3, [(0, 1), (1, 0), (0, 1), (1, 2)]);
        assert_eq!(map.edges().len(), 2);
    }
}
