//! Overwrite elimination (`spec.md` §4.7): drop findings for a state
//! variable that is unconditionally rewritten with a clean value later in
//! the same function.

use std::collections::{HashMap, HashSet};

use ir::{CompilationUnit, Function, NodeId, NodeKind, Operation, VariableArena, VariableKind};
use log::debug;

use crate::context::TaintContext;

/// `true` iff `var` is itself a reference variable (mapping cell, array
/// element, struct field). Writes through a reference must not be treated
/// as overwriting the whole state variable: `map[k] = clean` does not
/// un-taint a prior `map[j] = tainted` (`spec.md` §4.7.2, §9).
fn is_reference_variable(arena: &VariableArena, var: ir::VariableId) -> bool {
    matches!(arena.get(var).kind, VariableKind::Local { points_to: Some(_) })
}

pub fn remove_overwritten_findings(unit: &CompilationUnit, function: &Function, ctx: &mut TaintContext) {
    if ctx.findings().is_empty() {
        return;
    }
    let arena = &unit.arena;

    let mut branch_depth: HashMap<NodeId, i32> = HashMap::new();
    let mut node_order: HashMap<NodeId, usize> = HashMap::new();
    let mut depth = 0i32;
    for (index, node) in unit.function_nodes(function).enumerate() {
        node_order.insert(node.id, index);
        match node.kind {
            NodeKind::If | NodeKind::IfLoop => {
                branch_depth.insert(node.id, depth);
                depth += 1;
            }
            NodeKind::EndIf => {
                depth = (depth - 1).max(0);
                branch_depth.insert(node.id, depth);
            }
            _ => {
                branch_depth.insert(node.id, depth);
            }
        }
    }

    let mut writes: HashMap<String, Vec<(usize, bool)>> = HashMap::new();
    for node in unit.function_nodes(function) {
        if branch_depth.get(&node.id).copied().unwrap_or(0) != 0 {
            continue;
        }
        let idx = node_order[&node.id];
        for op in &node.irs {
            let Operation::Assignment { lvalue, rvalue } = op else { continue };
            if is_reference_variable(arena, *lvalue) {
                continue;
            }
            let target = arena.resolve(*lvalue);
            if !arena.is_state(target) {
                continue;
            }
            let Some(cname) = arena.canonical_name(target) else { continue };
            let is_tainted = ctx.is_tainted(arena, *rvalue);
            writes.entry(cname).or_default().push((idx, is_tainted));
        }
    }

    let mut to_remove: HashSet<String> = HashSet::new();
    for (cname, mut write_list) in writes {
        if write_list.is_empty() {
            continue;
        }
        write_list.sort_by_key(|(idx, _)| *idx);
        let (_, last_tainted) = write_list[write_list.len() - 1];
        if !last_tainted {
            to_remove.insert(cname);
        }
    }

    if !to_remove.is_empty() {
        debug!("overwrite elimination drops {} variable(s) in `{}`", to_remove.len(), function.canonical_name);
        ctx.retain_findings(arena, |name| !to_remove.contains(name));
    }
}
