//! Reason-string inference (`spec.md` §4.8). Computed once per function,
//! by walking the function's own nodes plus every function it transitively
//! calls, and memoized on the [`TaintContext`] so every finding in the
//! function shares the same label (`spec.md` §3 invariant 4).

use std::collections::HashSet;

use ir::{CompilationUnit, Function, Operation};
use log::trace;

use crate::context::TaintContext;
use crate::source;

/// Return the memoized reason string for `function`, computing it first if
/// this is the first finding recorded in the pass.
pub fn infer_reason(unit: &CompilationUnit, function: &Function, ctx: &mut TaintContext) -> String {
    if let Some(cached) = ctx.cached_reason() {
        return cached.to_string();
    }
    let mut reasons = HashSet::new();
    let mut visited = HashSet::new();
    collect_reasons(unit, function, &mut reasons, &mut visited);
    let mut ordered: Vec<&str> = reasons.iter().map(String::as_str).collect();
    ordered.sort_unstable();
    let reason = if ordered.is_empty() { "tainted source".to_string() } else { ordered.join(", ") };
    trace!("inferred reason `{reason}` for function `{}`", function.canonical_name);
    ctx.set_cached_reason(reason.clone());
    reason
}

fn collect_reasons(
    unit: &CompilationUnit,
    function: &Function,
    reasons: &mut HashSet<String>,
    visited: &mut HashSet<ir::FunctionId>,
) {
    if !visited.insert(function.id) {
        return;
    }

    let arena = &unit.arena;
    let mut has_msg_sender_ref = false;
    let mut has_non_sender_balance = false;
    let mut callees = Vec::new();

    for node in unit.function_nodes(function) {
        for op in &node.irs {
            match op {
                Operation::Assignment { rvalue, .. } if arena.builtin_name(*rvalue) == Some(source::MSG_SENDER) => {
                    has_msg_sender_ref = true;
                }
                _ => {}
            }
            for read in op.reads() {
                if let Some(name) = arena.builtin_name(read) {
                    if source::is_gas_composed_source(name) {
                        reasons.insert(name.to_string());
                    }
                }
            }
            match op {
                Operation::SolidityCall { function: callee_fn, arguments, .. } if callee_fn == source::GASLEFT => {
                    reasons.insert(source::GASLEFT.to_string());
                    let _ = arguments;
                }
                Operation::SolidityCall { function: callee_fn, arguments, .. } if callee_fn == source::BALANCE => {
                    if let Some(&first) = arguments.first() {
                        if arena.builtin_name(first) == Some(source::MSG_SENDER) {
                            reasons.insert("msg.sender.balance".to_string());
                        } else {
                            has_non_sender_balance = true;
                        }
                    }
                }
                Operation::NewContract { call_salt: Some(_), .. } => {
                    reasons.insert("CREATE2".to_string());
                }
                Operation::InternalCall { function: Some(callee_id), .. } => {
                    callees.push(*callee_id);
                }
                _ => {}
            }
        }
    }

    if has_non_sender_balance {
        if has_msg_sender_ref {
            reasons.insert("msg.sender.balance".to_string());
        } else {
            reasons.insert("address.balance".to_string());
        }
    }

    for callee_id in callees {
        let callee = unit.function(callee_id);
        collect_reasons(unit, callee, reasons, visited);
    }
}
