//! Materializing a routing result as a physical circuit.

use alsvin_ir::{Circuit, Instruction, QubitId};

use crate::coupling::CouplingMap;
use crate::error::RouteResult;
use crate::layout::Layout;
use crate::route::TrialResult;

/// A circuit rewritten onto physical qubits, with the layouts that
/// bracket it.
///
/// Every instruction's operands are physical qubit indices and every
/// two-qubit gate acts on a coupled pair. The circuit is full device
/// width; measurement results still target the original classical bits.
#[derive(Debug, Clone)]
pub struct RoutedCircuit {
    /// The physical circuit, swaps included.
    pub circuit: Circuit,
    /// Where each logical qubit started.
    pub initial_layout: Layout,
    /// Where each logical qubit ended up after the inserted swaps.
    pub final_layout: Layout,
    /// Number of swap gates inserted by routing.
    pub swap_count: usize,
}

impl RoutedCircuit {
    /// Depth of the physical circuit.
    pub fn depth(&self) -> usize {
        self.circuit.depth()
    }

    /// The initial logical-to-physical assignment restricted to the
    /// source circuit's qubits.
    pub fn initial_mapping(&self, num_logical: u32) -> Vec<u32> {
        self.initial_layout.logical_mapping(num_logical)
    }
}

/// Replays a routing trial over the source circuit, producing the
/// physical instruction stream.
pub struct Emitter<'a> {
    source: &'a Circuit,
    coupling: &'a CouplingMap,
}

impl<'a> Emitter<'a> {
    pub fn new(source: &'a Circuit, coupling: &'a CouplingMap) -> Self {
        Self { source, coupling }
    }

    /// Emit the physical circuit for a trial started from
    /// `initial_layout`.
    ///
    /// Walks the scheduled order, inserting each gate's pending swaps
    /// first and rewriting operands through the running layout.
    pub fn emit(&self, trial: &TrialResult, initial_layout: &Layout) -> RouteResult<RoutedCircuit> {
        let mut running = initial_layout.clone();
        let mut circuit = Circuit::with_size(
            self.source.name(),
            self.coupling.num_qubits(),
            self.source.num_clbits(),
        );

        for &index in &trial.gate_order {
            if let Some(swaps) = trial.swaps.get(&index) {
                for &[a, b] in swaps {
                    circuit.swap(QubitId(a), QubitId(b))?;
                    running.swap_physical(a, b);
                }
            }
            let instruction = &self.source.instructions()[index];
            let physical = Instruction {
                kind: instruction.kind.clone(),
                qubits: instruction
                    .qubits
                    .iter()
                    .map(|&q| QubitId(running.get_physical(q)))
                    .collect(),
                clbits: instruction.clbits.clone(),
            };
            if physical.needs_adjacency() {
                debug_assert!(
                    self.coupling
                        .is_connected(physical.qubits[0].0, physical.qubits[1].0),
                    "scheduled two-qubit gate must sit on a coupled edge"
                );
            }
            circuit.apply(physical)?;
        }
        debug_assert_eq!(running, trial.final_layout);

        Ok(RoutedCircuit {
            circuit,
            initial_layout: initial_layout.clone(),
            final_layout: trial.final_layout.clone(),
            swap_count: trial.swap_count,
        })
    }
}
