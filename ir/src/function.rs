use crate::node::NodeId;

/// Stable handle for a function or modifier within one compilation unit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct FunctionId(pub(crate) u32);

/// A function or modifier: an ordered list of CFG nodes plus the metadata
/// `spec.md` §3 requires from the host (`canonical_name`, `is_implemented`,
/// `contract_declarer`).
#[derive(Clone, Debug)]
pub struct Function {
    pub id: FunctionId,
    pub canonical_name: String,
    pub contract: String,
    pub is_implemented: bool,
    pub nodes: Vec<NodeId>,
}
