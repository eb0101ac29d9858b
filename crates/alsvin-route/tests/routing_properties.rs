//! End-to-end routing behavior on concrete devices plus randomized
//! structural properties.

use proptest::prelude::*;

use alsvin_ir::{Circuit, Instruction, InstructionKind, QubitId, StandardGate};
use alsvin_route::{
    route, CouplingMap, Layout, LayoutStrategy, RouteError, RouterConfig, RoutedCircuit,
};

fn fixed_trivial(n: u32) -> LayoutStrategy {
    LayoutStrategy::Fixed(Layout::trivial(n))
}

/// Recover the logical instruction stream from a routed circuit by
/// replaying its swaps against the initial layout.
///
/// Only valid for source circuits without user swap gates: every swap
/// in the output is then a routing insertion.
fn replay_logical(routed: &RoutedCircuit) -> Vec<Instruction> {
    let mut layout = routed.initial_layout.clone();
    let mut recovered = Vec::new();
    for inst in routed.circuit.iter() {
        if inst.name() == "swap" {
            layout.swap_physical(inst.qubits[0].0, inst.qubits[1].0);
            continue;
        }
        recovered.push(Instruction {
            kind: inst.kind.clone(),
            qubits: inst
                .qubits
                .iter()
                .map(|&p| layout.get_logical(p.0))
                .collect(),
            clbits: inst.clbits.clone(),
        });
    }
    assert_eq!(layout, routed.final_layout);
    recovered
}

/// Check that `recovered` is a dependency-preserving reordering of the
/// source stream: per logical wire, the projected instruction sequences
/// must match exactly.
fn assert_wire_equivalent(source: &Circuit, recovered: &[Instruction]) {
    for q in 0..source.num_qubits() {
        let wire = QubitId(q);
        let project = |insts: &mut dyn Iterator<Item = &Instruction>| -> Vec<Instruction> {
            insts
                .filter(|i| i.qubits.contains(&wire))
                .cloned()
                .collect()
        };
        let original = project(&mut source.iter());
        let replayed = project(&mut recovered.iter());
        assert_eq!(original, replayed, "wire q{q} diverged");
    }
}

fn assert_all_two_qubit_gates_coupled(routed: &RoutedCircuit, coupling: &CouplingMap) {
    for inst in routed.circuit.iter() {
        if inst.needs_adjacency() {
            assert!(
                coupling.is_connected(inst.qubits[0].0, inst.qubits[1].0),
                "{} on uncoupled pair {:?}",
                inst.name(),
                inst.qubits
            );
        }
    }
}

#[test]
fn distant_cnot_on_line_costs_one_swap() {
    let mut circuit = Circuit::with_size("far", 3, 0);
    circuit.cx(QubitId(0), QubitId(2)).unwrap();
    let coupling = CouplingMap::linear(3);
    let routed = route(
        &circuit,
        &coupling,
        &fixed_trivial(3),
        &RouterConfig::default(),
    )
    .unwrap();
    assert_eq!(routed.swap_count, 1);
    assert_all_two_qubit_gates_coupled(&routed, &coupling);
    assert_wire_equivalent(&circuit, &replay_logical(&routed));
}

#[test]
fn adjacent_circuit_routes_without_swaps() {
    let mut circuit = Circuit::with_size("adj", 4, 0);
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    circuit.cx(QubitId(2), QubitId(3)).unwrap();
    circuit.cx(QubitId(1), QubitId(2)).unwrap();
    let coupling = CouplingMap::linear(4);
    let routed = route(
        &circuit,
        &coupling,
        &fixed_trivial(4),
        &RouterConfig::default(),
    )
    .unwrap();
    assert_eq!(routed.swap_count, 0);
    assert_eq!(routed.circuit.count_ops("swap"), 0);
}

#[test]
fn complete_device_never_needs_swaps() {
    let mut circuit = Circuit::with_size("dense", 5, 0);
    for a in 0..5u32 {
        for b in 0..5u32 {
            if a != b {
                circuit.cx(QubitId(a), QubitId(b)).unwrap();
            }
        }
    }
    let coupling = CouplingMap::full(5);
    let routed = route(
        &circuit,
        &coupling,
        &LayoutStrategy::default(),
        &RouterConfig::default(),
    )
    .unwrap();
    assert_eq!(routed.swap_count, 0);
}

#[test]
fn embedding_strategy_finds_zero_swap_layout_for_chain() {
    // Interactions form a 5-chain; a 5-qubit line hosts it exactly,
    // whatever order the logical qubits arrive in.
    let mut circuit = Circuit::with_size("chain", 5, 0);
    circuit.cx(QubitId(3), QubitId(1)).unwrap();
    circuit.cx(QubitId(1), QubitId(4)).unwrap();
    circuit.cx(QubitId(4), QubitId(0)).unwrap();
    circuit.cx(QubitId(0), QubitId(2)).unwrap();
    let coupling = CouplingMap::linear(5);
    let routed = route(
        &circuit,
        &coupling,
        &LayoutStrategy::default(),
        &RouterConfig::default(),
    )
    .unwrap();
    assert_eq!(routed.swap_count, 0);
    assert_all_two_qubit_gates_coupled(&routed, &coupling);
}

#[test]
fn split_device_rejects_cross_component_interaction() {
    let mut circuit = Circuit::with_size("split", 4, 0);
    circuit.cx(QubitId(0), QubitId(3)).unwrap();
    let coupling = CouplingMap::from_edges(4, [(0, 1), (2, 3)]);
    let result = route(
        &circuit,
        &coupling,
        &fixed_trivial(4),
        &RouterConfig::default(),
    );
    assert!(matches!(
        result,
        Err(RouteError::UnroutableCircuit { a: QubitId(0), b: QubitId(3) })
    ));
}

#[test]
fn split_device_rejects_cross_component_fixed_placement() {
    // Two logical qubits deliberately pinned to opposite components.
    let mut circuit = Circuit::with_size("pinned", 2, 0);
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    let coupling = CouplingMap::from_edges(4, [(0, 1), (2, 3)]);
    let layout = Layout::from_mapping(&[0, 3], 4).unwrap();
    let result = route(
        &circuit,
        &coupling,
        &LayoutStrategy::Fixed(layout),
        &RouterConfig::default(),
    );
    assert!(matches!(
        result,
        Err(RouteError::UnroutableCircuit { a: QubitId(0), b: QubitId(1) })
    ));
}

#[test]
fn seeded_search_routes_within_one_island_of_a_split_device() {
    // The circuit fits entirely inside either island; layout search must
    // place it there rather than strand the pair across the gap.
    let mut circuit = Circuit::with_size("island", 2, 0);
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    let coupling = CouplingMap::from_edges(4, [(0, 1), (2, 3)]);
    let config = RouterConfig {
        seed: 1,
        ..RouterConfig::default()
    };
    let routed = route(
        &circuit,
        &coupling,
        &LayoutStrategy::IterativeRouterSeeded { rounds: 2 },
        &config,
    )
    .unwrap();
    assert_eq!(routed.swap_count, 0);
    assert_all_two_qubit_gates_coupled(&routed, &coupling);
}

#[test]
fn same_seed_gives_identical_output() {
    let mut circuit = Circuit::with_size("det", 6, 0);
    circuit.cx(QubitId(0), QubitId(5)).unwrap();
    circuit.cx(QubitId(2), QubitId(4)).unwrap();
    circuit.cx(QubitId(1), QubitId(3)).unwrap();
    circuit.cx(QubitId(0), QubitId(3)).unwrap();
    let coupling = CouplingMap::grid(2, 3);
    let config = RouterConfig {
        seed: 42,
        ..RouterConfig::default()
    };
    let a = route(&circuit, &coupling, &fixed_trivial(6), &config).unwrap();
    let b = route(&circuit, &coupling, &fixed_trivial(6), &config).unwrap();
    assert_eq!(a.circuit, b.circuit);
    assert_eq!(a.final_layout, b.final_layout);
}

#[test]
fn measurements_follow_their_qubit() {
    let mut circuit = Circuit::with_size("m", 3, 3);
    circuit.cx(QubitId(0), QubitId(2)).unwrap();
    circuit.measure_all().unwrap();
    let coupling = CouplingMap::linear(3);
    let routed = route(
        &circuit,
        &coupling,
        &fixed_trivial(3),
        &RouterConfig::default(),
    )
    .unwrap();
    assert_eq!(routed.circuit.count_ops("measure"), 3);
    // Replaying must put every measurement back on its logical qubit
    // with the original classical target.
    let recovered = replay_logical(&routed);
    let measures: Vec<_> = recovered
        .iter()
        .filter(|i| matches!(i.kind, InstructionKind::Measure))
        .collect();
    for m in measures {
        assert_eq!(m.qubits[0].0, m.clbits[0].0);
    }
}

#[test]
fn barrier_survives_routing_in_order() {
    let mut circuit = Circuit::with_size("b", 3, 0);
    circuit.h(QubitId(0)).unwrap();
    circuit.barrier().unwrap();
    circuit.cx(QubitId(0), QubitId(2)).unwrap();
    let coupling = CouplingMap::linear(3);
    let routed = route(
        &circuit,
        &coupling,
        &fixed_trivial(3),
        &RouterConfig::default(),
    )
    .unwrap();
    let names: Vec<_> = routed.circuit.iter().map(|i| i.name()).collect();
    let barrier_pos = names.iter().position(|&n| n == "barrier").unwrap();
    let h_pos = names.iter().position(|&n| n == "h").unwrap();
    let cx_pos = names.iter().position(|&n| n == "cx").unwrap();
    assert!(h_pos < barrier_pos);
    assert!(barrier_pos < cx_pos);
}

#[derive(Debug, Clone)]
enum GateSpec {
    H(u32),
    Cx(u32, u32),
}

fn circuit_strategy(num_qubits: u32) -> impl Strategy<Value = Circuit> {
    let gate = prop_oneof![
        (0..num_qubits).prop_map(GateSpec::H),
        (0..num_qubits, 0..num_qubits)
            .prop_filter("distinct operands", |(a, b)| a != b)
            .prop_map(|(a, b)| GateSpec::Cx(a, b)),
    ];
    proptest::collection::vec(gate, 1..40).prop_map(move |gates| {
        let mut circuit = Circuit::with_size("random", num_qubits, 0);
        for gate in gates {
            match gate {
                GateSpec::H(q) => circuit.h(QubitId(q)).unwrap(),
                GateSpec::Cx(a, b) => circuit.cx(QubitId(a), QubitId(b)).unwrap(),
            };
        }
        circuit
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn routed_circuits_respect_coupling_on_a_line(circuit in circuit_strategy(5)) {
        let coupling = CouplingMap::linear(5);
        let routed = route(
            &circuit,
            &coupling,
            &fixed_trivial(5),
            &RouterConfig::default(),
        )
        .unwrap();
        assert_all_two_qubit_gates_coupled(&routed, &coupling);
    }

    #[test]
    fn routing_preserves_per_wire_order(circuit in circuit_strategy(5)) {
        let coupling = CouplingMap::grid(1, 5);
        let routed = route(
            &circuit,
            &coupling,
            &fixed_trivial(5),
            &RouterConfig::default(),
        )
        .unwrap();
        assert_wire_equivalent(&circuit, &replay_logical(&routed));
    }

    #[test]
    fn searched_layouts_still_route_faithfully(circuit in circuit_strategy(6)) {
        let coupling = CouplingMap::ring(6);
        let config = RouterConfig::default();
        let searched = route(
            &circuit,
            &coupling,
            &LayoutStrategy::IterativeRouterSeeded { rounds: 2 },
            &config,
        )
        .unwrap();
        assert_all_two_qubit_gates_coupled(&searched, &coupling);
        // The chosen layout still yields a faithful reordering.
        assert_wire_equivalent(&circuit, &replay_logical(&searched));
    }
}

#[test]
fn uses_swap_gate_kind_for_insertions() {
    let mut circuit = Circuit::with_size("k", 3, 0);
    circuit.cx(QubitId(0), QubitId(2)).unwrap();
    let coupling = CouplingMap::linear(3);
    let routed = route(
        &circuit,
        &coupling,
        &fixed_trivial(3),
        &RouterConfig::default(),
    )
    .unwrap();
    let swap = routed
        .circuit
        .iter()
        .find(|i| i.name() == "swap")
        .unwrap();
    assert_eq!(swap.kind, InstructionKind::Gate(StandardGate::Swap));
}
