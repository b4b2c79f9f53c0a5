//! Intra-node data-flow propagation (`spec.md` §4.4): the core per-op
//! dispatch that runs over every IR op in a node, in listed order.

use ir::{CompilationUnit, Function, Node, Operation, VariableArena};
use log::trace;

use crate::context::TaintContext;
use crate::interprocedural::{handle_internal_call, Caches};
use crate::reason::infer_reason;
use crate::source;

pub fn process_node_data_flow(
    unit: &CompilationUnit,
    function: &Function,
    node: &Node,
    ctx: &mut TaintContext,
    caches: &mut Caches,
) {
    let arena = &unit.arena;
    for op in &node.irs {
        trace!("visiting op `{op:?}` in node `{:?}`", node.id);

        // Sender-alias tracking (`spec.md` §4.4.1).
        if let Operation::Assignment { lvalue, rvalue } = op {
            if arena.builtin_name(*rvalue) == Some(source::MSG_SENDER) || ctx.is_msg_sender(arena, *rvalue) {
                ctx.mark_sender_alias(*lvalue);
            }
        }

        // Gas-global seeding (`spec.md` §4.4.2): idempotent, so it is safe
        // to run before kind dispatch on every op, not only assignments.
        for read in op.reads() {
            if let Some(name) = arena.builtin_name(read) {
                if source::is_gas_composed_source(name) {
                    ctx.mark(arena, read);
                }
            }
        }

        match op {
            Operation::SolidityCall { function: callee, arguments, lvalue } => {
                if callee == source::GASLEFT {
                    if let Some(lvalue) = lvalue {
                        ctx.mark(arena, *lvalue);
                    }
                    continue;
                }
                if callee == source::BALANCE {
                    if let (Some(lvalue), Some(&first)) = (lvalue, arguments.first()) {
                        if ctx.is_msg_sender(arena, first) {
                            ctx.mark(arena, *lvalue);
                            continue;
                        }
                    }
                }
                if source::is_hash_or_encode(callee) {
                    ctx.mark_if_any(arena, *lvalue, arguments.iter().copied());
                }
                continue;
            }
            Operation::NewContract { lvalue, call_salt } => {
                if call_salt.is_some() {
                    if let Some(lvalue) = lvalue {
                        ctx.mark(arena, *lvalue);
                    }
                }
                continue;
            }
            Operation::Assignment { lvalue, rvalue } => {
                if ctx.is_tainted(arena, *rvalue) {
                    ctx.mark(arena, *lvalue);
                    maybe_record_state_write(unit, function, *lvalue, node, ctx);
                }
                continue;
            }
            Operation::Binary { lvalue, left, right } => {
                ctx.mark_if_any(arena, Some(*lvalue), [*left, *right]);
                continue;
            }
            Operation::Unary { lvalue, rvalue } => {
                if ctx.is_tainted(arena, *rvalue) {
                    ctx.mark(arena, *lvalue);
                }
                continue;
            }
            Operation::TypeConversion { lvalue, variable } => {
                if ctx.is_tainted(arena, *variable) {
                    ctx.mark(arena, *lvalue);
                }
                if ctx.is_msg_sender(arena, *variable) {
                    ctx.mark_sender_alias(*lvalue);
                }
                continue;
            }
            Operation::Index { lvalue, left, right } => {
                ctx.mark_if_any(arena, Some(*lvalue), [*left, *right]);
                continue;
            }
            Operation::Unpack { lvalue, tuple, .. } => {
                // Tuple-level granularity: every component becomes tainted
                // if the tuple is (`spec.md` §4.4.3, acknowledged imprecision).
                if ctx.is_tainted(arena, *tuple) {
                    ctx.mark(arena, *lvalue);
                }
                continue;
            }
            Operation::InternalCall { lvalue, function: callee, arguments } => {
                handle_internal_call(unit, ctx, caches, *lvalue, *callee, arguments);
                continue;
            }
            Operation::Condition { .. } => continue,
        }
    }

    // Post-pass write recording (`spec.md` §4.4.5): rescan every op with an
    // lvalue, independent of which branch above handled it.
    for op in &node.irs {
        if let Some(lvalue) = op.lvalue() {
            maybe_record_state_write(unit, function, lvalue, node, ctx);
        }
    }
}

/// If `lvalue` resolves to a state variable and is tainted, record a
/// finding deduped by `(canonical_name, node)` (`spec.md` §4.4.5).
fn maybe_record_state_write(
    unit: &CompilationUnit,
    function: &Function,
    lvalue: ir::VariableId,
    node: &Node,
    ctx: &mut TaintContext,
) {
    let arena: &VariableArena = &unit.arena;
    let target = arena.resolve(lvalue);
    if !arena.is_state(target) || !ctx.is_tainted(arena, lvalue) {
        return;
    }
    let Some(cname) = arena.canonical_name(target) else { return };
    let reason = infer_reason(unit, function, ctx);
    ctx.push_finding(target, node.id, cname, reason);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(src: &str) -> CompilationUnit {
        let doc = ir::parse_unit(src).unwrap();
        ir::lower(doc).unwrap().0
    }

    #[test]
    fn gasleft_assigned_to_state_is_a_finding() {
        let unit = build(
            r#"
            {
              "contracts": [{"name": "C", "state_variables": [{"name": "storedGas"}], "functions": ["C.f()"]}],
              "functions": [
                {
                  "name": "C.f()",
                  "contract": "C",
                  "nodes": [
                    {
                      "id": 0,
                      "ops": [
                        {"op": "solidity_call", "function": "gasleft()", "lvalue": "t0"},
                        {"op": "assignment", "lvalue": "state:storedGas", "rvalue": "t0"}
                      ]
                    }
                  ]
                }
              ]
            }
            "#,
        );
        let function = unit.find_function("C.f()").unwrap();
        let mut ctx = TaintContext::new();
        let mut caches = Caches::new();
        for node in unit.function_nodes(function) {
            process_node_data_flow(&unit, function, node, &mut ctx, &mut caches);
        }
        assert_eq!(ctx.findings().len(), 1);
        assert_eq!(ctx.findings()[0].2, "gasleft()");
    }

    #[test]
    fn balance_of_msg_sender_alias_is_a_finding() {
        // address a = msg.sender; b = a.balance;
        let unit = build(
            r#"
            {
              "contracts": [{"name": "C", "state_variables": [{"name": "b"}], "functions": ["C.f()"]}],
              "functions": [
                {
                  "name": "C.f()",
                  "contract": "C",
                  "nodes": [
                    {
                      "id": 0,
                      "ops": [
                        {"op": "assignment", "lvalue": "a", "rvalue": "msg.sender"},
                        {"op": "solidity_call", "function": "balance(address)", "arguments": ["a"], "lvalue": "t0"},
                        {"op": "assignment", "lvalue": "state:b", "rvalue": "t0"}
                      ]
                    }
                  ]
                }
              ]
            }
            "#,
        );
        let function = unit.find_function("C.f()").unwrap();
        let mut ctx = TaintContext::new();
        let mut caches = Caches::new();
        for node in unit.function_nodes(function) {
            process_node_data_flow(&unit, function, node, &mut ctx, &mut caches);
        }
        assert_eq!(ctx.findings().len(), 1);
        assert_eq!(ctx.findings()[0].2, "msg.sender.balance");
    }

    #[test]
    fn create2_salt_taints_lvalue() {
        let unit = build(
            r#"
            {
              "contracts": [{"name": "C", "state_variables": [{"name": "getPool"}], "functions": ["C.c()"]}],
              "functions": [
                {
                  "name": "C.c()",
                  "contract": "C",
                  "nodes": [
                    {
                      "id": 0,
                      "ops": [
                        {"op": "new_contract", "lvalue": "addr", "call_salt": "s"},
                        {"op": "assignment", "lvalue": "state:getPool", "rvalue": "addr"}
                      ]
                    }
                  ]
                }
              ]
            }
            "#,
        );
        let function = unit.find_function("C.c()").unwrap();
        let mut ctx = TaintContext::new();
        let mut caches = Caches::new();
        for node in unit.function_nodes(function) {
            process_node_data_flow(&unit, function, node, &mut ctx, &mut caches);
        }
        assert_eq!(ctx.findings().len(), 1);
        assert_eq!(ctx.findings()[0].2, "CREATE2");
    }

    #[test]
    fn clean_function_has_no_findings() {
        let unit = build(
            r#"
            {
              "contracts": [{"name": "C", "state_variables": [{"name": "total"}], "functions": ["C.transfer()"]}],
              "functions": [
                {
                  "name": "C.transfer()",
                  "contract": "C",
                  "nodes": [
                    {"id": 0, "ops": [{"op": "assignment", "lvalue": "state:total", "rvalue": "const:amount"}]}
                  ]
                }
              ]
            }
            "#,
        );
        let function = unit.find_function("C.transfer()").unwrap();
        let mut ctx = TaintContext::new();
        let mut caches = Caches::new();
        for node in unit.function_nodes(function) {
            process_node_data_flow(&unit, function, node, &mut ctx, &mut caches);
        }
        assert!(ctx.findings().is_empty());
    }
}
