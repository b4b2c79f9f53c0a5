//! Variable identity and reference resolution (`spec.md` §4.1). The arena
//! that owns variable identity lives in the `ir` crate, since assigning and
//! storing a variable's key is a property of the data model itself; this
//! module is the analysis-facing surface the rest of the engine is written
//! against, so a host with a different arena implementation only needs to
//! satisfy the same two operations.

pub use ir::VarKey;
use ir::{VariableArena, VariableId};

/// Canonical hashable key for a variable (`spec.md` §3).
pub fn key(arena: &VariableArena, var: VariableId) -> VarKey {
    arena.key(var)
}

/// Follow a reference-variable chain to its origin, with a cycle guard
/// (`spec.md` §4.1).
pub fn resolve(arena: &VariableArena, var: VariableId) -> VariableId {
    arena.resolve(var)
}
