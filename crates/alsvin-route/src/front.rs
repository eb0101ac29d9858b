//! Router working sets: the blocked front layer and the lookahead window.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use alsvin_ir::NodeIndex;

use crate::coupling::CouplingMap;

/// Distance as `f64` for scoring; infinite across components so a swap
/// that strands a gate can never win.
#[inline]
fn dist(coupling: &CouplingMap, a: u32, b: u32) -> f64 {
    match coupling.distance(a, b) {
        Some(d) => f64::from(d),
        None => f64::INFINITY,
    }
}

/// The currently blocked two-qubit gates, tracked on physical qubits.
///
/// Only adjacency-constrained gates ever live here: single-qubit
/// operations and barriers are scheduled the moment their predecessors
/// resolve, so a qubit holds at most one front-layer gate at a time.
/// Insertion order is preserved for deterministic iteration.
pub struct FrontLayer {
    /// Map from the node to the physical qubit pair it acts on.
    nodes: IndexMap<NodeIndex, [u32; 2], FxBuildHasher>,
    /// For each physical qubit, the front-layer node on it and the
    /// partner qubit, if any.
    qubits: Vec<Option<(NodeIndex, u32)>>,
}

impl FrontLayer {
    pub fn new(num_qubits: u32) -> Self {
        Self {
            // Each qubit pairs with exactly one other, so the layer can
            // never exceed half the device width.
            nodes: IndexMap::with_capacity_and_hasher(
                num_qubits as usize / 2,
                FxBuildHasher,
            ),
            qubits: vec![None; num_qubits as usize],
        }
    }

    /// Add a blocked node with the physical qubit pair it acts on.
    pub fn insert(&mut self, node: NodeIndex, qubits: [u32; 2]) {
        let [a, b] = qubits;
        self.qubits[a as usize] = Some((node, b));
        self.qubits[b as usize] = Some((node, a));
        self.nodes.insert(node, qubits);
    }

    /// Remove a node once it has been scheduled.
    ///
    /// Panics if the node is not present; that is a routing-state
    /// corruption, not a recoverable condition.
    pub fn remove(&mut self, node: NodeIndex) {
        let [a, b] = self
            .nodes
            .swap_remove(&node)
            .expect("front layer must contain the node being scheduled");
        self.qubits[a as usize] = None;
        self.qubits[b as usize] = None;
    }

    /// The front-layer gate on a physical qubit, with its partner qubit.
    #[inline]
    pub fn on_qubit(&self, qubit: u32) -> Option<(NodeIndex, u32)> {
        self.qubits[qubit as usize]
    }

    /// Query whether a qubit holds a blocked gate.
    #[inline]
    pub fn is_active(&self, qubit: u32) -> bool {
        self.qubits[qubit as usize].is_some()
    }

    /// True if no gates are blocked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rewrite tracking state after a swap of two physical qubits.
    pub fn apply_swap(&mut self, [a, b]: [u32; 2]) {
        // A gate acting on the swapped edge itself just flips operands.
        if let (Some((n1, _)), Some((n2, _))) =
            (self.qubits[a as usize], self.qubits[b as usize])
        {
            if n1 == n2 {
                let entry = self.nodes.get_mut(&n1).expect("node tracked in both tables");
                entry.swap(0, 1);
                return;
            }
        }
        if let Some((node, c)) = self.qubits[a as usize] {
            self.qubits[c as usize] = Some((node, b));
            let entry = self.nodes.get_mut(&node).expect("node tracked in both tables");
            *entry = if entry[0] == a { [b, entry[1]] } else { [entry[0], b] };
        }
        if let Some((node, c)) = self.qubits[b as usize] {
            self.qubits[c as usize] = Some((node, a));
            let entry = self.nodes.get_mut(&node).expect("node tracked in both tables");
            *entry = if entry[0] == b { [a, entry[1]] } else { [entry[0], a] };
        }
        self.qubits.swap(a as usize, b as usize);
    }

    /// Change in the summed front-layer distance if the swap were
    /// applied, relative to not applying it. Lower is better.
    pub fn score(&self, [a, b]: [u32; 2], coupling: &CouplingMap) -> f64 {
        let mut total = 0.0;
        if let Some((_, c)) = self.qubits[a as usize] {
            if c != b {
                total += dist(coupling, b, c) - dist(coupling, a, c);
            }
        }
        if let Some((_, c)) = self.qubits[b as usize] {
            if c != a {
                total += dist(coupling, a, c) - dist(coupling, b, c);
            }
        }
        total
    }

    /// Iterator over the nodes in insertion order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &NodeIndex> {
        self.nodes.keys()
    }

    /// Iterator over the physical qubits holding blocked gates.
    pub fn iter_active(&self) -> impl Iterator<Item = &u32> {
        self.nodes.values().flatten()
    }
}

/// Bounded lookahead window of upcoming two-qubit gates, as physical
/// qubit pairs under the current layout.
///
/// Rebuilt from scratch after every routed gate, so it stays a plain
/// list; a qubit may appear in several pairs here.
pub struct ExtendedSet {
    pairs: Vec<[u32; 2]>,
}

impl ExtendedSet {
    pub fn new(max_size: usize) -> Self {
        Self {
            pairs: Vec::with_capacity(max_size),
        }
    }

    /// Add a physical qubit pair to the window.
    pub fn push(&mut self, pair: [u32; 2]) {
        self.pairs.push(pair);
    }

    /// Rewrite the window after a swap of two physical qubits.
    pub fn apply_swap(&mut self, [a, b]: [u32; 2]) {
        for pair in &mut self.pairs {
            for q in pair.iter_mut() {
                if *q == a {
                    *q = b;
                } else if *q == b {
                    *q = a;
                }
            }
        }
    }

    /// Change in the summed window distance if the swap were applied.
    ///
    /// Only pairs touching the swapped qubits can change. Pairs that are
    /// unreachable both before and after contribute nothing; a swap acts
    /// within one component, so it can never reconnect them.
    pub fn score(&self, [a, b]: [u32; 2], coupling: &CouplingMap) -> f64 {
        let swapped = |q: u32| {
            if q == a {
                b
            } else if q == b {
                a
            } else {
                q
            }
        };
        let mut total = 0.0;
        for &[x, y] in &self.pairs {
            if x != a && x != b && y != a && y != b {
                continue;
            }
            let before = dist(coupling, x, y);
            let after = dist(coupling, swapped(x), swapped(y));
            if before.is_finite() || after.is_finite() {
                total += after - before;
            }
        }
        total
    }

    /// Drop all pairs, keeping the allocation.
    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Number of pairs in the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}
