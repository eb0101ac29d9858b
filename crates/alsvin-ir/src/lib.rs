//! Alsvin circuit intermediate representation.
//!
//! This crate provides the data structures shared by the Alsvin mapping
//! and routing stack: qubit addressing, the standard gate set,
//! instructions, the ordered [`Circuit`] stream, and the
//! [`InstructionGraph`] dependency DAG the router consumes.
//!
//! # Overview
//!
//! A [`Circuit`] is an append-only, validated instruction stream over
//! declared qubit and classical-bit registers. [`InstructionGraph`]
//! derives the dataflow dependencies from that stream in a single pass:
//! two instructions are ordered if and only if they share a wire, which
//! is exactly the freedom the router is allowed to exploit when it
//! reorders independent operations.
//!
//! # Example
//!
//! ```rust
//! use alsvin_ir::{Circuit, InstructionGraph, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! let graph = InstructionGraph::new(&circuit).unwrap();
//! assert_eq!(graph.node_count(), 4);
//! assert_eq!(graph.first_layer().len(), 1);
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod graph;
pub mod instruction;
pub mod parameter;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use graph::{GateNode, InstructionGraph, NodeIndex};
pub use instruction::{Instruction, InstructionKind};
pub use parameter::ParameterExpression;
pub use qubit::{ClbitId, QubitId};
