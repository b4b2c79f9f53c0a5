use std::collections::HashMap;

use crate::contract::Contract;
use crate::function::{Function, FunctionId};
use crate::node::{Node, NodeId};
use crate::variable::VariableArena;

/// A compilation unit: the full set of contracts, functions, nodes, and
/// interned variables the host frontend produced for one run (`spec.md`
/// §6: `CompilationUnit.contracts_derived`).
pub struct CompilationUnit {
    pub arena: VariableArena,
    pub(crate) nodes: HashMap<NodeId, Node>,
    pub(crate) functions: HashMap<FunctionId, Function>,
    pub contracts_derived: Vec<Contract>,
}

impl CompilationUnit {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[&id]
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[&id]
    }

    pub fn find_function(&self, canonical_name: &str) -> Option<&Function> {
        self.functions.values().find(|f| f.canonical_name == canonical_name)
    }

    pub fn function_nodes<'a>(&'a self, function: &'a Function) -> impl Iterator<Item = &'a Node> {
        function.nodes.iter().map(move |id| &self.nodes[id])
    }
}
