use std::collections::HashSet;

use crate::operation::Operation;
use crate::variable::{VariableArena, VariableId};

/// Stable handle for a CFG node within one compilation unit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The id's raw index, for hosts that need to display or serialize a
    /// location without holding a live reference into the arena.
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// The node types `spec.md` §3 calls out by name (`IF`/`IFLOOP`/`ENDIF`
/// drive control-flow taint propagation and overwrite elimination; the
/// rest fall under `Other`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeKind {
    Begin,
    Expression,
    If,
    IfLoop,
    EndIf,
    Other,
}

/// A CFG basic block: an ordered list of IR operations plus successors.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub irs: Vec<Operation>,
    pub sons: Vec<NodeId>,
}

impl Node {
    /// The state variables this node writes, computed on demand by
    /// resolving each operation's lvalue through the reference chain. This
    /// is the host capability `spec.md` §3/§6 calls
    /// `Node.state_variables_written`; computing it here instead of storing
    /// it means it can never drift out of sync with `irs`.
    pub fn state_variables_written(&self, arena: &VariableArena) -> Vec<VariableId> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for ir in &self.irs {
            if let Some(lvalue) = ir.lvalue() {
                let target = arena.resolve(lvalue);
                if arena.is_state(target) && seen.insert(target) {
                    result.push(target);
                }
            }
        }
        result
    }
}
