use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use crate::contract::Contract;
use crate::document::{FunctionDocument, NodeKindDocument, OperationDocument, UnitDocument};
use crate::function::{Function, FunctionId};
use crate::layout::SequentialStorageLayout;
use crate::node::{Node, NodeId, NodeKind};
use crate::operation::Operation;
use crate::unit::CompilationUnit;
use crate::variable::{VariableArena, VariableId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LowerError {
    #[error("contract `{contract}` references unknown function `{name}`")]
    UnknownFunction { contract: String, name: String },
    #[error("function `{function}` node `{son}` is referenced as a successor but does not exist")]
    UnknownNode { function: String, son: u32 },
    #[error("function `{function}` declares node id `{id}` more than once")]
    DuplicateNodeId { function: String, id: u32 },
}

/// Lower a [`UnitDocument`] into a [`CompilationUnit`] plus the storage
/// layout declared by its contracts' state-variable sizes.
pub fn lower(doc: UnitDocument) -> Result<(CompilationUnit, SequentialStorageLayout), LowerError> {
    let mut arena = VariableArena::new();
    let mut layout = SequentialStorageLayout::new();

    for contract in &doc.contracts {
        let sizes: Vec<(String, u32)> =
            contract.state_variables.iter().map(|sv| (sv.name.clone(), sv.size)).collect();
        for (name, _) in &sizes {
            arena.intern_state(&contract.name, name);
        }
        layout.declare_contract(&contract.name, &sizes);
    }

    let mut function_ids: HashMap<String, FunctionId> = HashMap::new();
    for (index, function) in doc.functions.iter().enumerate() {
        function_ids.insert(function.name.clone(), FunctionId(index as u32));
    }

    let mut nodes: HashMap<NodeId, Node> = HashMap::new();
    let mut functions: HashMap<FunctionId, Function> = HashMap::new();
    let mut next_node_id: u32 = 0;

    for function in &doc.functions {
        let id = function_ids[&function.name];
        debug!("lowering function `{}`", function.name);
        let node_ids = lower_function_nodes(function, &function_ids, &mut arena, &mut next_node_id, &mut nodes)?;
        functions.insert(
            id,
            Function {
                id,
                canonical_name: function.name.clone(),
                contract: function.contract.clone(),
                is_implemented: function.implemented,
                nodes: node_ids,
            },
        );
    }

    let mut contracts_derived = Vec::with_capacity(doc.contracts.len());
    for contract in &doc.contracts {
        let resolve_list = |names: &[String]| -> Result<Vec<FunctionId>, LowerError> {
            names
                .iter()
                .map(|name| {
                    function_ids.get(name).copied().ok_or_else(|| LowerError::UnknownFunction {
                        contract: contract.name.clone(),
                        name: name.clone(),
                    })
                })
                .collect()
        };
        contracts_derived.push(Contract {
            name: contract.name.clone(),
            functions_declared: resolve_list(&contract.functions)?,
            modifiers_declared: resolve_list(&contract.modifiers_declared)?,
            modifiers: resolve_list(&contract.modifiers)?,
        });
    }

    Ok((CompilationUnit { arena, nodes, functions, contracts_derived }, layout))
}

fn lower_function_nodes(
    function: &FunctionDocument,
    function_ids: &HashMap<String, FunctionId>,
    arena: &mut VariableArena,
    next_node_id: &mut u32,
    nodes: &mut HashMap<NodeId, Node>,
) -> Result<Vec<NodeId>, LowerError> {
    let mut local_cache: HashMap<String, VariableId> = HashMap::new();

    // Pre-register every declared reference variable so that locals may
    // alias each other regardless of declaration order, then resolve each
    // alias target in a second pass.
    for name in function.locals.keys() {
        let id = arena.new_local(None, Some(name.clone()));
        local_cache.insert(name.clone(), id);
    }
    for (name, target) in &function.locals {
        let target_id = resolve_name(target, &function.contract, &mut local_cache, arena);
        arena.set_points_to(local_cache[name], target_id);
    }

    // Assign global node ids before lowering operations, so `sons` in any
    // order (forward or backward references) resolve correctly.
    let mut doc_to_id: HashMap<u32, NodeId> = HashMap::new();
    for node in &function.nodes {
        if doc_to_id.contains_key(&node.id) {
            return Err(LowerError::DuplicateNodeId { function: function.name.clone(), id: node.id });
        }
        let id = NodeId(*next_node_id);
        *next_node_id += 1;
        doc_to_id.insert(node.id, id);
    }

    let mut ordered_ids = Vec::with_capacity(function.nodes.len());
    for node in &function.nodes {
        let id = doc_to_id[&node.id];
        let mut sons = Vec::with_capacity(node.sons.len());
        for son in &node.sons {
            let son_id = doc_to_id.get(son).copied().ok_or_else(|| LowerError::UnknownNode {
                function: function.name.clone(),
                son: *son,
            })?;
            sons.push(son_id);
        }
        let irs = node
            .ops
            .iter()
            .map(|op| lower_operation(op, &function.contract, &mut local_cache, arena, function_ids))
            .collect();
        nodes.insert(
            id,
            Node { id, kind: lower_node_kind(node.kind), irs, sons },
        );
        ordered_ids.push(id);
    }
    Ok(ordered_ids)
}

fn lower_node_kind(kind: NodeKindDocument) -> NodeKind {
    match kind {
        NodeKindDocument::Begin => NodeKind::Begin,
        NodeKindDocument::Expression => NodeKind::Expression,
        NodeKindDocument::If => NodeKind::If,
        NodeKindDocument::IfLoop => NodeKind::IfLoop,
        NodeKindDocument::EndIf => NodeKind::EndIf,
        NodeKindDocument::Other => NodeKind::Other,
    }
}

fn lower_operation(
    op: &OperationDocument,
    contract: &str,
    local_cache: &mut HashMap<String, VariableId>,
    arena: &mut VariableArena,
    function_ids: &HashMap<String, FunctionId>,
) -> Operation {
    let mut resolve = |name: &str| resolve_name(name, contract, local_cache, arena);
    match op {
        OperationDocument::Assignment { lvalue, rvalue } => {
            Operation::Assignment { lvalue: resolve(lvalue), rvalue: resolve(rvalue) }
        }
        OperationDocument::Binary { lvalue, left, right } => {
            Operation::Binary { lvalue: resolve(lvalue), left: resolve(left), right: resolve(right) }
        }
        OperationDocument::Unary { lvalue, rvalue } => {
            Operation::Unary { lvalue: resolve(lvalue), rvalue: resolve(rvalue) }
        }
        OperationDocument::TypeConversion { lvalue, variable } => {
            Operation::TypeConversion { lvalue: resolve(lvalue), variable: resolve(variable) }
        }
        OperationDocument::Index { lvalue, left, right } => {
            Operation::Index { lvalue: resolve(lvalue), left: resolve(left), right: resolve(right) }
        }
        OperationDocument::Unpack { lvalue, tuple, index } => {
            Operation::Unpack { lvalue: resolve(lvalue), tuple: resolve(tuple), index: *index }
        }
        OperationDocument::SolidityCall { function, arguments, lvalue } => Operation::SolidityCall {
            function: function.clone(),
            arguments: arguments.iter().map(|a| resolve(a)).collect(),
            lvalue: lvalue.as_deref().map(&mut resolve),
        },
        OperationDocument::NewContract { lvalue, call_salt } => Operation::NewContract {
            lvalue: lvalue.as_deref().map(&mut resolve),
            call_salt: call_salt.as_deref().map(&mut resolve),
        },
        OperationDocument::InternalCall { lvalue, function, arguments } => Operation::InternalCall {
            lvalue: lvalue.as_deref().map(&mut resolve),
            function: function.as_ref().and_then(|name| function_ids.get(name).copied()),
            arguments: arguments.iter().map(|a| resolve(a)).collect(),
        },
        OperationDocument::Condition { value } => Operation::Condition { value: resolve(value) },
    }
}

/// Resolve a variable-reference string to a `VariableId`, per the
/// conventions documented on [`crate::document::UnitDocument`].
fn resolve_name(
    name: &str,
    contract: &str,
    local_cache: &mut HashMap<String, VariableId>,
    arena: &mut VariableArena,
) -> VariableId {
    if let Some(rest) = name.strip_prefix("state:") {
        return arena.intern_state(contract, rest);
    }
    if let Some(rest) = name.strip_prefix("const:") {
        return arena.new_constant(Some(rest.to_string()));
    }
    if name.contains('.') {
        return arena.intern_builtin(name);
    }
    if let Some(&id) = local_cache.get(name) {
        return id;
    }
    let id = arena.new_local(None, Some(name.to_string()));
    local_cache.insert(name.to_string(), id);
    id
}
