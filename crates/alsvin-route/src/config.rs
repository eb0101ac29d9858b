//! Tunable parameters for layout search and swap routing.

use serde::{Deserialize, Serialize};

use crate::layout::Layout;

/// Heuristic and budget knobs for the swap router.
///
/// The defaults are the empirically solid values; every field is a
/// tuning parameter rather than a fixed constant, so callers can trade
/// routing quality against runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Maximum number of two-qubit gates held in the lookahead window.
    pub lookahead_size: usize,
    /// Weight of the lookahead window relative to the front set.
    pub lookahead_weight: f64,
    /// Amount added to a physical qubit's decay weight each time it
    /// participates in an inserted swap.
    pub decay_increment: f64,
    /// Number of swap-selection steps between decay resets.
    pub decay_reset_interval: u32,
    /// Floating-point epsilon when comparing candidate-swap scores.
    pub best_epsilon: f64,
    /// Maximum swaps inserted without routing a gate before the pass
    /// fails with [`RouteError::RoutingStalled`](crate::RouteError::RoutingStalled).
    pub stall_limit: usize,
    /// Number of independent routing trials (distinct tie-break seeds).
    pub num_trials: usize,
    /// Base random seed; trial seeds derive from it deterministically.
    pub seed: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            lookahead_size: 20,
            lookahead_weight: 0.5,
            decay_increment: 0.001,
            decay_reset_interval: 5,
            best_epsilon: 1e-10,
            stall_limit: 1000,
            num_trials: 4,
            seed: 0,
        }
    }
}

/// How the initial logical-to-physical layout is chosen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LayoutStrategy {
    /// Use the supplied layout unchanged, bypassing layout search.
    Fixed(Layout),
    /// Try to embed the circuit's interaction graph directly into the
    /// coupling map (zero swaps when it succeeds), falling back to
    /// iterative router seeding on a miss.
    ExactEmbedding {
        /// Search-state budget for the backtracking embedding.
        state_budget: usize,
        /// Forward/backward seeding rounds for the fallback.
        rounds: usize,
    },
    /// Skip the embedding attempt and go straight to iterative
    /// forward/backward router seeding from random starts.
    IterativeRouterSeeded {
        /// Forward/backward seeding rounds per trial.
        rounds: usize,
    },
}

impl Default for LayoutStrategy {
    fn default() -> Self {
        LayoutStrategy::ExactEmbedding {
            state_budget: 10_000,
            rounds: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default();
        assert_eq!(config.lookahead_size, 20);
        assert_eq!(config.num_trials, 4);
        assert_eq!(config.seed, 0);
    }

    #[test]
    fn test_default_strategy_embeds_first() {
        assert!(matches!(
            LayoutStrategy::default(),
            LayoutStrategy::ExactEmbedding { .. }
        ));
    }
}
