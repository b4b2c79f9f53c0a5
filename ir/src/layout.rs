use std::collections::HashMap;

use thiserror::Error;

/// The storage-layout oracle the core consumes (`spec.md` §6:
/// `storage_layout_of(contract, var) -> (slot, offset)`). Storage layout
/// computation is explicitly an external collaborator per `spec.md` §1 —
/// the core only ever calls this trait and downgrades a failure to
/// `(-1, -1)` (§7). Hosts with a more precise model (inherited layouts,
/// struct packing, dynamic arrays) can substitute their own implementation
/// without touching the analysis crate.
pub trait StorageLayoutOracle {
    fn storage_layout_of(&self, contract: &str, variable: &str) -> Result<(i64, i64), LayoutError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("no storage layout for `{contract}.{variable}`")]
    UnknownVariable { contract: String, variable: String },
}

/// Assigns 32-byte storage slots to a contract's state variables in
/// declaration order, packing consecutive variables into the same slot at
/// increasing byte offsets when their combined size fits in 32 bytes — the
/// simplified version of the packing rule EVM storage layout follows for
/// value types.
#[derive(Default)]
pub struct SequentialStorageLayout {
    slots: HashMap<(String, String), (i64, i64)>,
}

impl SequentialStorageLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a contract's state variables, in order, with their byte
    /// sizes, and compute their slot/offset assignment.
    pub fn declare_contract(&mut self, contract: &str, variables: &[(String, u32)]) {
        const SLOT_BYTES: u32 = 32;
        let mut slot: i64 = 0;
        let mut offset: u32 = 0;
        for (name, size) in variables {
            let size = (*size).min(SLOT_BYTES).max(1);
            if offset + size > SLOT_BYTES {
                slot += 1;
                offset = 0;
            }
            self.slots.insert((contract.to_string(), name.clone()), (slot, offset as i64));
            offset += size;
            if offset >= SLOT_BYTES {
                slot += 1;
                offset = 0;
            }
        }
    }
}

impl StorageLayoutOracle for SequentialStorageLayout {
    fn storage_layout_of(&self, contract: &str, variable: &str) -> Result<(i64, i64), LayoutError> {
        self.slots
            .get(&(contract.to_string(), variable.to_string()))
            .copied()
            .ok_or_else(|| LayoutError::UnknownVariable {
                contract: contract.to_string(),
                variable: variable.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_small_fields_into_one_slot() {
        let mut layout = SequentialStorageLayout::new();
        layout.declare_contract(
            "C",
            &[("a".to_string(), 16), ("b".to_string(), 16), ("c".to_string(), 32)],
        );
        assert_eq!(layout.storage_layout_of("C", "a"), Ok((0, 0)));
        assert_eq!(layout.storage_layout_of("C", "b"), Ok((0, 16)));
        assert_eq!(layout.storage_layout_of("C", "c"), Ok((1, 0)));
    }

    #[test]
    fn spills_to_next_slot_when_field_does_not_fit() {
        let mut layout = SequentialStorageLayout::new();
        layout.declare_contract(
            "C",
            &[("a".to_string(), 24), ("b".to_string(), 24)],
        );
        assert_eq!(layout.storage_layout_of("C", "a"), Ok((0, 0)));
        assert_eq!(layout.storage_layout_of("C", "b"), Ok((1, 0)));
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let layout = SequentialStorageLayout::new();
        assert!(layout.storage_layout_of("C", "missing").is_err());
    }
}
