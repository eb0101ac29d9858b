//! Initial layout selection.
//!
//! Two engines sit behind [`LayoutStrategy`]: a backtracking search for
//! an exact embedding of the circuit's interaction graph into the
//! coupling map (a hit means the circuit routes with zero swaps), and
//! an iterative scheme that seeds the router from random layouts and
//! refines each seed with alternating forward and time-reversed dry
//! runs before keeping the cheapest.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use rayon::prelude::*;
use tracing::debug;

use alsvin_ir::{InstructionGraph, QubitId};

use crate::config::{LayoutStrategy, RouterConfig};
use crate::coupling::CouplingMap;
use crate::error::{RouteError, RouteResult};
use crate::layout::Layout;
use crate::route::route_one;

/// Redraw attempts per trial for a seed layout keeping every
/// interacting pair inside one device component. On a connected device
/// the first draw always qualifies.
const SEED_DRAW_ATTEMPTS: usize = 64;

pub struct LayoutSearch<'a> {
    graph: &'a InstructionGraph,
    reversed: &'a InstructionGraph,
    coupling: &'a CouplingMap,
    config: &'a RouterConfig,
}

impl<'a> LayoutSearch<'a> {
    pub fn new(
        graph: &'a InstructionGraph,
        reversed: &'a InstructionGraph,
        coupling: &'a CouplingMap,
        config: &'a RouterConfig,
    ) -> Self {
        Self {
            graph,
            reversed,
            coupling,
            config,
        }
    }

    /// Choose an initial layout according to the strategy.
    pub fn select(&self, strategy: &LayoutStrategy) -> RouteResult<Layout> {
        match strategy {
            LayoutStrategy::Fixed(layout) => {
                if layout.num_qubits() != self.coupling.num_qubits() {
                    return Err(RouteError::InvalidLayout(format!(
                        "layout covers {} qubits but the device has {}",
                        layout.num_qubits(),
                        self.coupling.num_qubits()
                    )));
                }
                Ok(layout.clone())
            }
            LayoutStrategy::ExactEmbedding {
                state_budget,
                rounds,
            } => {
                if let Some(layout) = self.try_exact_embedding(*state_budget)? {
                    debug!("exact embedding found, circuit routes without swaps");
                    return Ok(layout);
                }
                debug!("exact embedding missed, falling back to iterative seeding");
                self.iterative_seeded(*rounds)
            }
            LayoutStrategy::IterativeRouterSeeded { rounds } => self.iterative_seeded(*rounds),
        }
    }

    /// Backtracking search for a subgraph embedding of the interaction
    /// graph into the coupling map.
    ///
    /// Logical qubits are placed most-constrained-first (descending
    /// interaction degree). The search aborts with `None` after
    /// `state_budget` placement attempts, so a pathological instance
    /// degrades to the fallback instead of hanging.
    fn try_exact_embedding(&self, state_budget: usize) -> RouteResult<Option<Layout>> {
        let num_logical = self.graph.num_qubits() as usize;
        let num_physical = self.coupling.num_qubits() as usize;
        let pairs = self.graph.interaction_pairs();
        if pairs.is_empty() {
            return Ok(Some(Layout::trivial(self.coupling.num_qubits())));
        }

        let mut adjacency: Vec<Vec<u32>> = vec![vec![]; num_logical];
        for (a, b) in &pairs {
            adjacency[a.index()].push(b.0);
            adjacency[b.index()].push(a.0);
        }
        // An interaction degree above the device's maximum can never
        // embed; skip the search entirely.
        let max_device_degree = (0..num_physical)
            .map(|q| self.coupling.neighbors(q as u32).len())
            .max()
            .unwrap_or(0);
        if adjacency.iter().any(|n| n.len() > max_device_degree) {
            return Ok(None);
        }

        let mut order: Vec<u32> = (0..num_logical as u32).collect();
        order.sort_by_key(|&q| std::cmp::Reverse(adjacency[q as usize].len()));

        let mut assignment: Vec<Option<u32>> = vec![None; num_logical];
        let mut used = vec![false; num_physical];
        let mut budget = state_budget;
        let found = self.embed(&order, 0, &adjacency, &mut assignment, &mut used, &mut budget);
        if !found {
            return Ok(None);
        }
        let mapping: Vec<u32> = assignment
            .into_iter()
            .map(|phys| phys.unwrap_or_else(|| unreachable!("embedding assigns every qubit")))
            .collect();
        Layout::from_mapping(&mapping, self.coupling.num_qubits()).map(Some)
    }

    fn embed(
        &self,
        order: &[u32],
        depth: usize,
        adjacency: &[Vec<u32>],
        assignment: &mut Vec<Option<u32>>,
        used: &mut Vec<bool>,
        budget: &mut usize,
    ) -> bool {
        if depth == order.len() {
            return true;
        }
        let logical = order[depth] as usize;
        let placed_neighbors: Vec<u32> = adjacency[logical]
            .iter()
            .filter_map(|&n| assignment[n as usize])
            .collect();
        // Candidates must neighbor every already-placed interaction
        // partner; with none placed, any free physical qubit works.
        let candidates: Vec<u32> = match placed_neighbors.first() {
            Some(&anchor) => self
                .coupling
                .neighbors(anchor)
                .iter()
                .copied()
                .filter(|&p| {
                    !used[p as usize]
                        && placed_neighbors[1..]
                            .iter()
                            .all(|&other| self.coupling.is_connected(p, other))
                })
                .collect(),
            None => (0..self.coupling.num_qubits())
                .filter(|&p| !used[p as usize])
                .collect(),
        };
        for phys in candidates {
            if *budget == 0 {
                return false;
            }
            *budget -= 1;
            assignment[logical] = Some(phys);
            used[phys as usize] = true;
            if self.embed(order, depth + 1, adjacency, assignment, used, budget) {
                return true;
            }
            assignment[logical] = None;
            used[phys as usize] = false;
        }
        false
    }

    /// Random full-width seed layout that keeps every interacting pair
    /// within one connected component of the device.
    ///
    /// Redraws a bounded number of times; if a qualifying draw never
    /// appears, the last one is returned anyway and the dry run reports
    /// the offending pair as [`RouteError::UnroutableCircuit`].
    fn draw_seed_layout(&self, pairs: &[(QubitId, QubitId)], rng: &mut Pcg64Mcg) -> Layout {
        let mut permutation: Vec<u32> = (0..self.coupling.num_qubits()).collect();
        let mut layout = Layout::trivial(self.coupling.num_qubits());
        for _ in 0..SEED_DRAW_ATTEMPTS {
            permutation.shuffle(rng);
            layout = Layout::from_permutation(permutation.clone());
            let co_located = pairs.iter().all(|&(a, b)| {
                self.coupling
                    .same_component(layout.get_physical(a), layout.get_physical(b))
            });
            if co_located {
                break;
            }
        }
        layout
    }

    /// Seed the router from random full-width layouts, refining each
    /// seed with alternating forward and time-reversed dry runs, then
    /// keep the seed whose final forward run inserts the fewest swaps.
    fn iterative_seeded(&self, rounds: usize) -> RouteResult<Layout> {
        let pairs = self.graph.interaction_pairs();
        let mut seed_rng = Pcg64Mcg::seed_from_u64(self.config.seed);
        let trial_seeds: Vec<u64> = (0..self.config.num_trials.max(1))
            .map(|_| seed_rng.r#gen())
            .collect();
        // Dry runs are single-trial; the outer loop provides the
        // parallelism.
        let dry_config = RouterConfig {
            num_trials: 1,
            ..self.config.clone()
        };

        let outcomes: Vec<RouteResult<(usize, Layout)>> = trial_seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = Pcg64Mcg::seed_from_u64(seed);
                let mut layout = self.draw_seed_layout(&pairs, &mut rng);
                for _ in 0..rounds {
                    let forward =
                        route_one(self.graph, self.coupling, layout, &dry_config, seed)?;
                    let backward = route_one(
                        self.reversed,
                        self.coupling,
                        forward.final_layout,
                        &dry_config,
                        seed,
                    )?;
                    layout = backward.final_layout;
                }
                let scored =
                    route_one(self.graph, self.coupling, layout.clone(), &dry_config, seed)?;
                Ok((scored.swap_count, layout))
            })
            .collect();

        let mut best: Option<(usize, Layout)> = None;
        let mut first_error: Option<RouteError> = None;
        for outcome in outcomes {
            match outcome {
                Ok((cost, layout)) => {
                    if best.as_ref().is_none_or(|(current, _)| cost < *current) {
                        best = Some((cost, layout));
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
            Some((cost, layout)) => {
                debug!(estimated_swaps = cost, "iterative layout seeding complete");
                Ok(layout)
            }
            None => Err(first_error.unwrap_or(RouteError::RoutingStalled { swaps: 0 })),
        }
    }
}
