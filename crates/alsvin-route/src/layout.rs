//! Logical-to-physical qubit assignment.

use serde::{Deserialize, Serialize};

use alsvin_ir::QubitId;

use crate::error::{RouteError, RouteResult};

/// A bijection between virtual qubit slots and physical device qubits.
///
/// The layout is always full device width: circuit logical qubits
/// occupy slots `[0, n)` and the remaining slots are ancilla fill, so a
/// swap with a currently unoccupied physical qubit is still a total
/// permutation. Routing mutates a layout exclusively through
/// [`swap_physical`](Self::swap_physical); trials snapshot via `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Physical qubit assigned to each virtual slot.
    virt_to_phys: Vec<u32>,
    /// Virtual slot held by each physical qubit.
    phys_to_virt: Vec<u32>,
}

impl Layout {
    /// The identity layout on a device of the given width.
    pub fn trivial(num_physical: u32) -> Self {
        Self {
            virt_to_phys: (0..num_physical).collect(),
            phys_to_virt: (0..num_physical).collect(),
        }
    }

    /// Build a layout from a full-width virtual→physical permutation.
    ///
    /// Intended for internal construction where the permutation is known
    /// to be valid (e.g. a shuffled identity).
    pub(crate) fn from_permutation(virt_to_phys: Vec<u32>) -> Self {
        let mut phys_to_virt = vec![0u32; virt_to_phys.len()];
        for (virt, &phys) in virt_to_phys.iter().enumerate() {
            phys_to_virt[phys as usize] = virt as u32;
        }
        Self {
            virt_to_phys,
            phys_to_virt,
        }
    }

    /// Build a layout from a caller-supplied assignment of circuit
    /// logical qubits to physical qubits.
    ///
    /// `mapping[i]` is the physical qubit for logical qubit `i`. Unused
    /// physical qubits are assigned to ancilla slots in ascending order.
    pub fn from_mapping(mapping: &[u32], num_physical: u32) -> RouteResult<Self> {
        let required = u32::try_from(mapping.len()).unwrap_or(u32::MAX);
        if required > num_physical {
            return Err(RouteError::LayoutOverflow {
                required,
                available: num_physical,
            });
        }
        let mut used = vec![false; num_physical as usize];
        for &phys in mapping {
            if phys >= num_physical {
                return Err(RouteError::InvalidLayout(format!(
                    "physical qubit {phys} is out of range for a device with {num_physical} qubits"
                )));
            }
            if used[phys as usize] {
                return Err(RouteError::InvalidLayout(format!(
                    "physical qubit {phys} is assigned twice"
                )));
            }
            used[phys as usize] = true;
        }
        let mut virt_to_phys = mapping.to_vec();
        virt_to_phys.extend((0..num_physical).filter(|&p| !used[p as usize]));
        Ok(Self::from_permutation(virt_to_phys))
    }

    /// Device width of this layout.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.virt_to_phys.len() as u32
    }

    /// The physical qubit currently holding a logical qubit.
    #[inline]
    pub fn get_physical(&self, logical: QubitId) -> u32 {
        self.virt_to_phys[logical.index()]
    }

    /// The virtual slot currently held by a physical qubit.
    ///
    /// Slots at or beyond the circuit's declared qubit count are
    /// ancilla fill.
    #[inline]
    pub fn get_logical(&self, physical: u32) -> QubitId {
        QubitId(self.phys_to_virt[physical as usize])
    }

    /// Exchange the virtual slots held by two physical qubits.
    #[inline]
    pub fn swap_physical(&mut self, p1: u32, p2: u32) {
        let v1 = self.phys_to_virt[p1 as usize];
        let v2 = self.phys_to_virt[p2 as usize];
        self.phys_to_virt[p1 as usize] = v2;
        self.phys_to_virt[p2 as usize] = v1;
        self.virt_to_phys[v1 as usize] = p2;
        self.virt_to_phys[v2 as usize] = p1;
    }

    /// Iterate over `(logical, physical)` assignments in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, u32)> + '_ {
        self.virt_to_phys
            .iter()
            .enumerate()
            .map(|(virt, &phys)| (QubitId(virt as u32), phys))
    }

    /// The virtual→physical assignment restricted to the first
    /// `num_logical` slots: the externally visible part of the layout.
    pub fn logical_mapping(&self, num_logical: u32) -> Vec<u32> {
        self.virt_to_phys[..num_logical as usize].to_vec()
    }
}
