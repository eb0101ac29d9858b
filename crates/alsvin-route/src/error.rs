//! Error types for mapping and routing.

use alsvin_ir::{IrError, QubitId};
use thiserror::Error;

/// Errors that can occur during layout selection and routing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RouteError {
    /// The input instruction stream is malformed (out-of-range operand,
    /// unsupported arity). Surfaced before any routing state is built.
    #[error("Malformed circuit: {0}")]
    MalformedCircuit(#[from] IrError),

    /// The circuit declares more logical qubits than the device has.
    #[error("Circuit needs {required} qubits but the device has {available}")]
    LayoutOverflow {
        /// Logical qubits declared by the circuit.
        required: u32,
        /// Physical qubits on the device.
        available: u32,
    },

    /// A distance was requested between physical qubits in different
    /// connected components of the coupling map.
    #[error("No path between physical qubits {a} and {b}: disconnected coupling map")]
    DisconnectedTopology {
        /// First physical qubit.
        a: u32,
        /// Second physical qubit.
        b: u32,
    },

    /// The circuit requires an interaction between logical qubits placed
    /// in different connected components of the device.
    #[error("Cannot route interaction between {a} and {b}: no connecting path on the device")]
    UnroutableCircuit {
        /// First logical qubit of the offending pair.
        a: QubitId,
        /// Second logical qubit of the offending pair.
        b: QubitId,
    },

    /// The swap-search heuristic exceeded its step budget without
    /// routing a gate. Recoverable: retry with a different seed or a
    /// larger lookahead.
    #[error("Routing stalled after {swaps} swaps without progress; retry with a different seed")]
    RoutingStalled {
        /// Swaps attempted since the last routed gate.
        swaps: usize,
    },

    /// A user-supplied initial layout is not a valid bijection onto the
    /// device.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
}

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;
