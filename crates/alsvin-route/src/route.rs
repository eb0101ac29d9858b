//! Heuristic swap routing over an instruction dependency graph.
//!
//! The router schedules instructions in dependency order, inserting swap
//! gates whenever a two-qubit gate's operands are not adjacent under the
//! current layout. Swap selection is greedy over a scored candidate set:
//! the change in summed front-layer distance, a weighted change over a
//! bounded lookahead window, and a decay penalty that discourages
//! hammering the same qubits. Several independent trials run in
//! parallel with distinct tie-break seeds and the cheapest wins.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::debug;

use alsvin_ir::{InstructionGraph, NodeIndex};

use crate::config::RouterConfig;
use crate::coupling::CouplingMap;
use crate::error::{RouteError, RouteResult};
use crate::front::{ExtendedSet, FrontLayer};
use crate::layout::Layout;

/// Outcome of one routing trial.
#[derive(Debug, Clone)]
pub struct TrialResult {
    /// Original stream positions in scheduled order.
    pub gate_order: Vec<usize>,
    /// Swaps (as physical qubit pairs) to insert immediately before the
    /// keyed stream position.
    pub swaps: FxHashMap<usize, Vec<[u32; 2]>>,
    /// Total number of inserted swaps.
    pub swap_count: usize,
    /// Layout after the last scheduled instruction.
    pub final_layout: Layout,
}

/// Mutable state of a single routing trial.
struct RoutingState<'a> {
    graph: &'a InstructionGraph,
    coupling: &'a CouplingMap,
    config: &'a RouterConfig,
    front: FrontLayer,
    extended: ExtendedSet,
    /// Unsatisfied predecessor-edge count per node.
    required_predecessors: Vec<u32>,
    layout: Layout,
    /// Decay penalty per physical qubit.
    decay: Vec<f64>,
    gate_order: Vec<usize>,
    swaps: FxHashMap<usize, Vec<[u32; 2]>>,
    /// Swaps inserted since the last scheduled instruction; attached to
    /// the next one.
    pending_swaps: Vec<[u32; 2]>,
    swap_count: usize,
    rng: Pcg64Mcg,
    swap_scratch: Vec<[u32; 2]>,
}

impl<'a> RoutingState<'a> {
    fn new(
        graph: &'a InstructionGraph,
        coupling: &'a CouplingMap,
        layout: Layout,
        config: &'a RouterConfig,
        seed: u64,
    ) -> Self {
        let num_physical = coupling.num_qubits();
        Self {
            graph,
            coupling,
            config,
            front: FrontLayer::new(num_physical),
            extended: ExtendedSet::new(config.lookahead_size),
            required_predecessors: graph.predecessor_counts(),
            layout,
            decay: vec![0.0; num_physical as usize],
            gate_order: Vec::with_capacity(graph.node_count()),
            swaps: FxHashMap::default(),
            pending_swaps: Vec::new(),
            swap_count: 0,
            rng: Pcg64Mcg::seed_from_u64(seed),
            swap_scratch: Vec::new(),
        }
    }

    /// Physical operand pair of an adjacency-constrained node under the
    /// current layout.
    #[inline]
    fn physical_pair(&self, node: NodeIndex) -> [u32; 2] {
        let payload = self.graph.node(node);
        [
            self.layout.get_physical(payload.qubits[0]),
            self.layout.get_physical(payload.qubits[1]),
        ]
    }

    /// Schedule every node in `seeds` (and transitively everything their
    /// completion frees up) that is executable under the current layout;
    /// blocked two-qubit gates land in the front layer.
    ///
    /// Breadth-first so that simultaneously eligible nodes keep their
    /// relative stream order in the output. A gate whose operands sit in
    /// different connected components can never be unblocked by swaps,
    /// so it fails the trial immediately instead of entering the front
    /// layer.
    fn route_reachable_nodes(&mut self, seeds: &[NodeIndex]) -> RouteResult<()> {
        let mut queue: VecDeque<NodeIndex> = seeds.iter().copied().collect();
        while let Some(node) = queue.pop_front() {
            let payload = self.graph.node(node);
            if payload.requires_adjacency {
                let [a, b] = self.physical_pair(node);
                if !self.coupling.is_connected(a, b) {
                    if !self.coupling.same_component(a, b) {
                        return Err(RouteError::UnroutableCircuit {
                            a: payload.qubits[0],
                            b: payload.qubits[1],
                        });
                    }
                    self.front.insert(node, [a, b]);
                    continue;
                }
            }
            self.gate_order.push(payload.index);
            if !self.pending_swaps.is_empty() {
                self.swaps
                    .insert(payload.index, std::mem::take(&mut self.pending_swaps));
            }
            for successor in self.graph.successors(node) {
                let count = &mut self.required_predecessors[successor.index()];
                *count -= 1;
                if *count == 0 {
                    queue.push_back(successor);
                }
            }
        }
        Ok(())
    }

    /// Fill the lookahead window with the next two-qubit gates behind
    /// the front layer, up to the configured size.
    ///
    /// Walks the dependency graph as if the front layer had executed,
    /// temporarily decrementing predecessor counts and restoring them
    /// afterwards.
    fn populate_extended_set(&mut self) {
        self.extended.clear();
        let mut decremented: FxHashMap<NodeIndex, u32> = FxHashMap::default();
        let mut to_visit: VecDeque<NodeIndex> = self.front.iter_nodes().copied().collect();
        while let Some(node) = to_visit.pop_front() {
            if self.extended.len() >= self.config.lookahead_size {
                break;
            }
            for successor in self.graph.successors(node) {
                *decremented.entry(successor).or_insert(0) += 1;
                let count = &mut self.required_predecessors[successor.index()];
                *count -= 1;
                if *count == 0 {
                    let payload = self.graph.node(successor);
                    if payload.requires_adjacency {
                        self.extended.push([
                            self.layout.get_physical(payload.qubits[0]),
                            self.layout.get_physical(payload.qubits[1]),
                        ]);
                    }
                    to_visit.push_back(successor);
                }
            }
        }
        for (node, count) in decremented {
            self.required_predecessors[node.index()] += count;
        }
    }

    /// Candidate swaps: every coupling edge with at least one endpoint
    /// under a blocked gate. The `neighbor > qubit` guard dedups edges
    /// whose endpoints are both active.
    fn obtain_swaps(&mut self) {
        self.swap_scratch.clear();
        for &qubit in self.front.iter_active() {
            for &neighbor in self.coupling.neighbors(qubit) {
                if neighbor > qubit || !self.front.is_active(neighbor) {
                    self.swap_scratch.push([qubit, neighbor]);
                }
            }
        }
    }

    /// Score all candidate swaps and pick the best, breaking ties
    /// uniformly at random with the trial's seeded generator.
    fn choose_best_swap(&mut self) -> [u32; 2] {
        self.obtain_swaps();
        let epsilon = self.config.best_epsilon;
        let mut best_score = f64::INFINITY;
        let mut best: Vec<[u32; 2]> = Vec::new();
        for i in 0..self.swap_scratch.len() {
            let swap = self.swap_scratch[i];
            let score = self.front.score(swap, self.coupling)
                + self.config.lookahead_weight * self.extended.score(swap, self.coupling)
                + self.decay[swap[0] as usize]
                + self.decay[swap[1] as usize];
            if score < best_score - epsilon {
                best_score = score;
                best.clear();
                best.push(swap);
            } else if (score - best_score).abs() <= epsilon {
                best.push(swap);
            }
        }
        best[self.rng.gen_range(0..best.len())]
    }

    /// Apply a chosen swap to the layout and every tracking structure.
    fn apply_swap(&mut self, swap: [u32; 2]) {
        self.layout.swap_physical(swap[0], swap[1]);
        self.front.apply_swap(swap);
        self.extended.apply_swap(swap);
        self.pending_swaps.push(swap);
        self.swap_count += 1;
        self.decay[swap[0] as usize] += self.config.decay_increment;
        self.decay[swap[1] as usize] += self.config.decay_increment;
    }

    /// Run the trial to completion.
    fn run(mut self) -> RouteResult<TrialResult> {
        self.route_reachable_nodes(&self.graph.first_layer().to_vec())?;
        self.populate_extended_set();

        let mut swaps_since_progress = 0usize;
        let mut steps_since_decay_reset = 0u32;
        while !self.front.is_empty() {
            if swaps_since_progress >= self.config.stall_limit {
                return Err(RouteError::RoutingStalled {
                    swaps: swaps_since_progress,
                });
            }
            let swap = self.choose_best_swap();
            self.apply_swap(swap);
            swaps_since_progress += 1;
            steps_since_decay_reset += 1;
            if steps_since_decay_reset >= self.config.decay_reset_interval {
                self.decay.fill(0.0);
                steps_since_decay_reset = 0;
            }

            // A swap can unblock a gate on either endpoint.
            let mut unblocked: Vec<NodeIndex> = Vec::with_capacity(2);
            for qubit in swap {
                if let Some((node, other)) = self.front.on_qubit(qubit) {
                    if self.coupling.is_connected(qubit, other) && !unblocked.contains(&node) {
                        unblocked.push(node);
                    }
                }
            }
            if !unblocked.is_empty() {
                for &node in &unblocked {
                    self.front.remove(node);
                }
                self.route_reachable_nodes(&unblocked)?;
                self.populate_extended_set();
                self.decay.fill(0.0);
                steps_since_decay_reset = 0;
                swaps_since_progress = 0;
            }
        }
        debug_assert!(self.pending_swaps.is_empty());
        debug_assert_eq!(self.gate_order.len(), self.graph.node_count());

        Ok(TrialResult {
            gate_order: self.gate_order,
            swaps: self.swaps,
            swap_count: self.swap_count,
            final_layout: self.layout,
        })
    }
}

/// Route one trial from a fixed initial layout and tie-break seed.
pub(crate) fn route_one(
    graph: &InstructionGraph,
    coupling: &CouplingMap,
    layout: Layout,
    config: &RouterConfig,
    seed: u64,
) -> RouteResult<TrialResult> {
    RoutingState::new(graph, coupling, layout, config, seed).run()
}

/// Route a dependency graph from an initial layout, running
/// `config.num_trials` independent trials in parallel and keeping the
/// one with the fewest swaps (ties broken by trial index).
///
/// A trial that finishes with zero swaps is optimal and stops the
/// remaining trials early. Individual trials may stall; the call only
/// fails if every trial does.
///
/// A layout that splits an interacting pair across connected components
/// fails with [`RouteError::UnroutableCircuit`] naming the pair; swaps
/// can never bring such a pair adjacent.
pub fn route_trials(
    graph: &InstructionGraph,
    coupling: &CouplingMap,
    initial_layout: &Layout,
    config: &RouterConfig,
) -> RouteResult<TrialResult> {
    let mut seed_rng = Pcg64Mcg::seed_from_u64(config.seed);
    let seeds: Vec<u64> = (0..config.num_trials.max(1))
        .map(|_| seed_rng.r#gen())
        .collect();

    let done = AtomicBool::new(false);
    let outcomes: Vec<Option<RouteResult<TrialResult>>> = seeds
        .into_par_iter()
        .map(|seed| {
            if done.load(Ordering::Relaxed) {
                return None;
            }
            let result = route_one(graph, coupling, initial_layout.clone(), config, seed);
            if matches!(&result, Ok(trial) if trial.swap_count == 0) {
                done.store(true, Ordering::Relaxed);
            }
            Some(result)
        })
        .collect();

    let mut best: Option<TrialResult> = None;
    let mut first_error: Option<RouteError> = None;
    for outcome in outcomes.into_iter().flatten() {
        match outcome {
            Ok(trial) => {
                if best
                    .as_ref()
                    .is_none_or(|current| trial.swap_count < current.swap_count)
                {
                    best = Some(trial);
                }
            }
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    match best {
        Some(trial) => {
            debug!(
                swap_count = trial.swap_count,
                scheduled = trial.gate_order.len(),
                "routing trials complete"
            );
            Ok(trial)
        }
        None => Err(first_error.unwrap_or(RouteError::RoutingStalled { swaps: 0 })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvin_ir::{Circuit, QubitId};

    fn graph_of(circuit: &Circuit) -> InstructionGraph {
        InstructionGraph::new(circuit).unwrap()
    }

    #[test]
    fn test_adjacent_gate_needs_no_swaps() {
        let mut circuit = Circuit::with_size("adj", 2, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let graph = graph_of(&circuit);
        let coupling = CouplingMap::linear(2);
        let trial = route_trials(
            &graph,
            &coupling,
            &Layout::trivial(2),
            &RouterConfig::default(),
        )
        .unwrap();
        assert_eq!(trial.swap_count, 0);
        assert_eq!(trial.gate_order, vec![0]);
        assert!(trial.swaps.is_empty());
    }

    #[test]
    fn test_distant_gate_inserts_one_swap_on_line() {
        let mut circuit = Circuit::with_size("far", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let graph = graph_of(&circuit);
        let coupling = CouplingMap::linear(3);
        let trial = route_trials(
            &graph,
            &coupling,
            &Layout::trivial(3),
            &RouterConfig::default(),
        )
        .unwrap();
        assert_eq!(trial.swap_count, 1);
        // The single swap is attached to the only gate.
        assert_eq!(trial.swaps[&0].len(), 1);
    }

    #[test]
    fn test_single_qubit_gates_pass_through() {
        let mut circuit = Circuit::with_size("sq", 3, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.x(QubitId(1)).unwrap();
        circuit.h(QubitId(2)).unwrap();
        let graph = graph_of(&circuit);
        let coupling = CouplingMap::linear(3);
        let trial = route_trials(
            &graph,
            &coupling,
            &Layout::trivial(3),
            &RouterConfig::default(),
        )
        .unwrap();
        assert_eq!(trial.swap_count, 0);
        assert_eq!(trial.gate_order.len(), 3);
    }

    #[test]
    fn test_dependency_order_is_preserved() {
        let mut circuit = Circuit::with_size("dep", 3, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.cx(QubitId(1), QubitId(2)).unwrap();
        let graph = graph_of(&circuit);
        let coupling = CouplingMap::linear(3);
        let trial = route_trials(
            &graph,
            &coupling,
            &Layout::trivial(3),
            &RouterConfig::default(),
        )
        .unwrap();
        let pos = |i: usize| trial.gate_order.iter().position(|&x| x == i).unwrap();
        assert!(pos(0) < pos(1));
        assert!(pos(1) < pos(2));
    }

    #[test]
    fn test_same_seed_same_result() {
        let mut circuit = Circuit::with_size("det", 5, 0);
        circuit.cx(QubitId(0), QubitId(4)).unwrap();
        circuit.cx(QubitId(1), QubitId(3)).unwrap();
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let graph = graph_of(&circuit);
        let coupling = CouplingMap::ring(5);
        let config = RouterConfig {
            num_trials: 1,
            ..RouterConfig::default()
        };
        let a = route_trials(&graph, &coupling, &Layout::trivial(5), &config).unwrap();
        let b = route_trials(&graph, &coupling, &Layout::trivial(5), &config).unwrap();
        assert_eq!(a.gate_order, b.gate_order);
        assert_eq!(a.swap_count, b.swap_count);
        assert_eq!(a.swaps, b.swaps);
    }

    #[test]
    fn test_stall_limit_reported() {
        let mut circuit = Circuit::with_size("stall", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let graph = graph_of(&circuit);
        let coupling = CouplingMap::linear(3);
        let config = RouterConfig {
            stall_limit: 0,
            num_trials: 1,
            ..RouterConfig::default()
        };
        let result = route_trials(&graph, &coupling, &Layout::trivial(3), &config);
        assert!(matches!(result, Err(RouteError::RoutingStalled { .. })));
    }

    #[test]
    fn test_split_placement_fails_with_unroutable() {
        let mut circuit = Circuit::with_size("split", 2, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let graph = graph_of(&circuit);
        let coupling = CouplingMap::from_edges(4, [(0, 1), (2, 3)]);
        // Logical 0 and 1 pinned to opposite components.
        let layout = Layout::from_mapping(&[0, 2], 4).unwrap();
        let result = route_trials(&graph, &coupling, &layout, &RouterConfig::default());
        assert!(matches!(
            result,
            Err(RouteError::UnroutableCircuit { a: QubitId(0), b: QubitId(1) })
        ));
    }

    #[test]
    fn test_final_layout_tracks_swaps() {
        let mut circuit = Circuit::with_size("fl", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let graph = graph_of(&circuit);
        let coupling = CouplingMap::linear(3);
        let trial = route_trials(
            &graph,
            &coupling,
            &Layout::trivial(3),
            &RouterConfig::default(),
        )
        .unwrap();
        // One swap moved exactly two logical qubits off their start.
        let moved = (0..3)
            .filter(|&q| trial.final_layout.get_physical(QubitId(q)) != q)
            .count();
        assert_eq!(moved, 2);
    }
}
