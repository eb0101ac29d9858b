//! Dependency graph over an instruction stream.
//!
//! Nodes wrap one instruction each; edges encode "must execute before"
//! ordering induced by shared qubit or classical-bit wires. The graph is
//! built in one pass by tracking, per wire, the last instruction that
//! touched it, so construction is linear in the stream length plus the
//! number of operands.
//!
//! The graph is acyclic by construction: every edge points from an
//! earlier stream position to a later one. Any topological order
//! therefore preserves the relative order of instructions sharing a
//! wire, while independent instructions may be freely reordered.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::instruction::Instruction;
use crate::qubit::QubitId;

/// Node index type for the instruction graph.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node in the instruction graph.
#[derive(Debug, Clone)]
pub struct GateNode {
    /// Position of the wrapped instruction in the original stream.
    pub index: usize,
    /// Logical qubit operands.
    pub qubits: Vec<QubitId>,
    /// Whether this node constrains two qubits to be adjacent when
    /// scheduled (two-qubit gates; barriers and 1q operations do not).
    pub requires_adjacency: bool,
}

/// Dependency DAG over an ordered instruction stream.
#[derive(Debug, Clone)]
pub struct InstructionGraph {
    graph: DiGraph<GateNode, ()>,
    first_layer: Vec<NodeIndex>,
    num_qubits: u32,
}

impl InstructionGraph {
    /// Build the dependency graph for a circuit's instruction stream.
    pub fn new(circuit: &Circuit) -> IrResult<Self> {
        Self::build(circuit, circuit.iter().enumerate())
    }

    /// Build the dependency graph for the time-reversed stream.
    ///
    /// Node indices still refer to positions in the *original* stream,
    /// so routing results over the reversed graph stay addressable.
    pub fn reversed(circuit: &Circuit) -> IrResult<Self> {
        let len = circuit.len();
        Self::build(
            circuit,
            circuit.iter().rev().enumerate().map(move |(i, inst)| (len - 1 - i, inst)),
        )
    }

    fn build<'a>(
        circuit: &Circuit,
        stream: impl Iterator<Item = (usize, &'a Instruction)>,
    ) -> IrResult<Self> {
        let num_qubits = circuit.num_qubits();
        let num_clbits = circuit.num_clbits();
        let mut qubit_last: Vec<Option<NodeIndex>> = vec![None; num_qubits as usize];
        let mut clbit_last: Vec<Option<NodeIndex>> = vec![None; num_clbits as usize];
        let mut graph = DiGraph::with_capacity(circuit.len(), 2 * circuit.len());
        let mut first_layer = Vec::new();

        for (index, inst) in stream {
            for &qubit in &inst.qubits {
                if qubit.0 >= num_qubits {
                    return Err(IrError::QubitOutOfRange { qubit, num_qubits });
                }
            }
            for &clbit in &inst.clbits {
                if clbit.0 >= num_clbits {
                    return Err(IrError::ClbitOutOfRange { clbit, num_clbits });
                }
            }
            if inst.is_gate() && inst.qubits.len() > 2 {
                return Err(IrError::UnsupportedArity {
                    name: inst.name().to_string(),
                    num_qubits: u32::try_from(inst.qubits.len()).unwrap_or(u32::MAX),
                });
            }

            let node = graph.add_node(GateNode {
                index,
                qubits: inst.qubits.clone(),
                requires_adjacency: inst.needs_adjacency(),
            });
            let mut is_front = true;
            for &qubit in &inst.qubits {
                if let Some(prev) = qubit_last[qubit.index()] {
                    is_front = false;
                    graph.add_edge(prev, node, ());
                }
                qubit_last[qubit.index()] = Some(node);
            }
            for &clbit in &inst.clbits {
                if let Some(prev) = clbit_last[clbit.index()] {
                    is_front = false;
                    graph.add_edge(prev, node, ());
                }
                clbit_last[clbit.index()] = Some(node);
            }
            if is_front {
                first_layer.push(node);
            }
        }

        Ok(Self {
            graph,
            first_layer,
            num_qubits,
        })
    }

    /// The underlying dependency graph.
    #[inline]
    pub fn graph(&self) -> &DiGraph<GateNode, ()> {
        &self.graph
    }

    /// Nodes with no predecessors: the initial front set.
    #[inline]
    pub fn first_layer(&self) -> &[NodeIndex] {
        &self.first_layer
    }

    /// Number of instruction nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Declared number of logical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// The node payload.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> &GateNode {
        &self.graph[index]
    }

    /// Immediate successors of a node.
    pub fn successors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(index, Direction::Outgoing)
    }

    /// Per-node count of unsatisfied predecessor edges.
    ///
    /// An instruction becomes eligible for the front set once its count
    /// reaches zero; parallel edges (two instructions sharing both
    /// qubits) are deliberately counted once per shared wire.
    pub fn predecessor_counts(&self) -> Vec<u32> {
        let mut counts = vec![0u32; self.graph.node_count()];
        for edge in self.graph.edge_indices() {
            if let Some((_, target)) = self.graph.edge_endpoints(edge) {
                counts[target.index()] += 1;
            }
        }
        counts
    }

    /// Distinct unordered logical-qubit pairs constrained by two-qubit
    /// gates: the circuit's interaction graph as an edge list.
    pub fn interaction_pairs(&self) -> Vec<(QubitId, QubitId)> {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut pairs = Vec::new();
        for node in self.graph.node_indices() {
            let payload = &self.graph[node];
            if payload.requires_adjacency {
                let (a, b) = (payload.qubits[0], payload.qubits[1]);
                let key = if a <= b { (a, b) } else { (b, a) };
                if seen.insert(key) {
                    pairs.push(key);
                }
            }
        }
        pairs
    }
}
