//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Instruction references a qubit outside the declared register.
    #[error("Qubit {qubit} is out of range for a circuit with {num_qubits} qubits")]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Declared qubit count of the circuit.
        num_qubits: u32,
    },

    /// Instruction references a classical bit outside the declared register.
    #[error("Classical bit {clbit} is out of range for a circuit with {num_clbits} classical bits")]
    ClbitOutOfRange {
        /// The offending classical bit.
        clbit: ClbitId,
        /// Declared classical bit count of the circuit.
        num_clbits: u32,
    },

    /// Gate requires a different number of qubits than supplied.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Instruction acts on more qubits than the dependency graph supports.
    ///
    /// Gates on three or more qubits must be decomposed before routing.
    #[error("Instruction '{name}' acts on {num_qubits} qubits; decompose to 1- and 2-qubit operations first")]
    UnsupportedArity {
        /// Name of the instruction.
        name: String,
        /// Number of qubit operands.
        num_qubits: u32,
    },

    /// The same qubit appears twice in one instruction.
    #[error("Duplicate qubit {qubit} in instruction '{name}'")]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Name of the instruction.
        name: String,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
