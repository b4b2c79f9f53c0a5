//! Control-flow taint propagation (`spec.md` §4.6): once data-flow has
//! settled, a branch whose condition is tainted taints every state write in
//! its body, no matter how the write got its value.

use std::collections::HashSet;

use ir::{CompilationUnit, Function, Node, NodeId, NodeKind, Operation};
use log::trace;

use crate::context::TaintContext;
use crate::reason::infer_reason;

pub fn propagate_control_flow_taint(unit: &CompilationUnit, function: &Function, ctx: &mut TaintContext) {
    let arena = &unit.arena;
    for node in unit.function_nodes(function) {
        if !matches!(node.kind, NodeKind::If | NodeKind::IfLoop) {
            continue;
        }
        let mut cond_tainted = false;
        for op in &node.irs {
            if let Operation::Condition { value } = op {
                if ctx.is_tainted(arena, *value) {
                    cond_tainted = true;
                }
            }
            // Conditions aside, any op in the branch-head node still
            // propagates data-flow taint the ordinary way.
            ctx.mark_if_any(arena, op.lvalue(), op.reads().into_iter().filter(|v| !arena.is_constant(*v)));
        }

        if !cond_tainted {
            continue;
        }
        trace!("node `{:?}` has a tainted condition in `{}`", node.id, function.canonical_name);

        for body_node in collect_branch_body(unit, node) {
            for sv in body_node.state_variables_written(arena) {
                let Some(cname) = arena.canonical_name(sv) else { continue };
                let reason = infer_reason(unit, function, ctx);
                ctx.push_finding(sv, body_node.id, cname, reason);
            }
        }
    }
}

/// Walk from `if_node`'s successors, halting descent at any `ENDIF` merge
/// node (which is not itself part of the body) — `spec.md` §4.6.
fn collect_branch_body<'a>(unit: &'a CompilationUnit, if_node: &Node) -> Vec<&'a Node> {
    let mut result = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::from([if_node.id]);
    let mut worklist: Vec<NodeId> = if_node.sons.clone();

    while let Some(current_id) = worklist.pop() {
        if !visited.insert(current_id) {
            continue;
        }
        let current = unit.node(current_id);
        if matches!(current.kind, NodeKind::EndIf) {
            continue;
        }
        for son in &current.sons {
            if !visited.contains(son) {
                worklist.push(*son);
            }
        }
        result.push(current);
    }
    result
}
