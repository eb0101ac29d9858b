//! Qubit mapping and swap routing for coupling-constrained devices.
//!
//! Takes a logical circuit and a device coupling map, chooses an
//! initial logical-to-physical layout, and inserts swap gates so every
//! two-qubit gate acts on a coupled pair. The result is a physical
//! circuit plus the layouts bracketing it.
//!
//! # Example
//!
//! ```
//! use alsvin_ir::{Circuit, QubitId};
//! use alsvin_route::{route, CouplingMap, LayoutStrategy, RouterConfig};
//!
//! let mut circuit = Circuit::with_size("ghz", 3, 0);
//! circuit.h(QubitId(0))?;
//! circuit.cx(QubitId(0), QubitId(1))?;
//! circuit.cx(QubitId(0), QubitId(2))?;
//!
//! let coupling = CouplingMap::linear(3);
//! let routed = route(
//!     &circuit,
//!     &coupling,
//!     &LayoutStrategy::default(),
//!     &RouterConfig::default(),
//! )?;
//! assert!(routed.circuit.len() >= circuit.len());
//! # Ok::<(), alsvin_route::RouteError>(())
//! ```

pub mod config;
pub mod coupling;
pub mod emit;
pub mod error;
mod front;
pub mod layout;
pub mod route;
pub mod search;

pub use config::{LayoutStrategy, RouterConfig};
pub use coupling::CouplingMap;
pub use emit::{Emitter, RoutedCircuit};
pub use error::{RouteError, RouteResult};
pub use layout::Layout;
pub use route::{TrialResult, route_trials};
pub use search::LayoutSearch;

use alsvin_ir::{Circuit, InstructionGraph};
use tracing::info;

/// Map and route a circuit onto a device.
///
/// Selects an initial layout per `strategy`, runs the configured number
/// of routing trials, and emits the cheapest result as a physical
/// circuit.
///
/// # Errors
///
/// - [`RouteError::LayoutOverflow`] if the circuit declares more qubits
///   than the device has.
/// - [`RouteError::MalformedCircuit`] if the instruction stream fails
///   validation (out-of-range operands, gates on more than two qubits).
/// - [`RouteError::UnroutableCircuit`] if an interacting pair is placed
///   in different connected components of the device.
/// - [`RouteError::RoutingStalled`] if every trial exceeds its swap
///   budget without progress.
pub fn route(
    circuit: &Circuit,
    coupling: &CouplingMap,
    strategy: &LayoutStrategy,
    config: &RouterConfig,
) -> RouteResult<RoutedCircuit> {
    if circuit.num_qubits() > coupling.num_qubits() {
        return Err(RouteError::LayoutOverflow {
            required: circuit.num_qubits(),
            available: coupling.num_qubits(),
        });
    }
    let graph = InstructionGraph::new(circuit)?;
    let reversed = InstructionGraph::reversed(circuit)?;

    let search = LayoutSearch::new(&graph, &reversed, coupling, config);
    let initial_layout = search.select(strategy)?;

    // Swaps only move qubits within a component, so a pair split across
    // components can never become adjacent.
    for (a, b) in graph.interaction_pairs() {
        let pa = initial_layout.get_physical(a);
        let pb = initial_layout.get_physical(b);
        if !coupling.same_component(pa, pb) {
            return Err(RouteError::UnroutableCircuit { a, b });
        }
    }

    let trial = route_trials(&graph, coupling, &initial_layout, config)?;
    let routed = Emitter::new(circuit, coupling).emit(&trial, &initial_layout)?;
    info!(
        circuit = circuit.name(),
        qubits = circuit.num_qubits(),
        gates = circuit.len(),
        swaps = routed.swap_count,
        depth = routed.depth(),
        "routing complete"
    );
    Ok(routed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvin_ir::QubitId;

    #[test]
    fn test_route_overflow() {
        let circuit = Circuit::with_size("big", 5, 0);
        let coupling = CouplingMap::linear(3);
        let result = route(
            &circuit,
            &coupling,
            &LayoutStrategy::default(),
            &RouterConfig::default(),
        );
        assert!(matches!(
            result,
            Err(RouteError::LayoutOverflow { required: 5, available: 3 })
        ));
    }

    #[test]
    fn test_route_split_device_with_fixed_layout() {
        let mut circuit = Circuit::with_size("split", 4, 0);
        circuit.cx(QubitId(1), QubitId(2)).unwrap();
        let coupling = CouplingMap::from_edges(4, [(0, 1), (2, 3)]);
        let result = route(
            &circuit,
            &coupling,
            &LayoutStrategy::Fixed(Layout::trivial(4)),
            &RouterConfig::default(),
        );
        assert!(matches!(
            result,
            Err(RouteError::UnroutableCircuit { a: QubitId(1), b: QubitId(2) })
        ));
    }

    #[test]
    fn test_route_bell_on_line() {
        let circuit = Circuit::bell().unwrap();
        let coupling = CouplingMap::linear(2);
        let routed = route(
            &circuit,
            &coupling,
            &LayoutStrategy::default(),
            &RouterConfig::default(),
        )
        .unwrap();
        assert_eq!(routed.swap_count, 0);
        assert_eq!(routed.circuit.count_ops("measure"), 2);
    }
}
