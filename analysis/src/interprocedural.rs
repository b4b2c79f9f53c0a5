//! Interprocedural call summarization (`spec.md` §4.5). Two caches, owned
//! exclusively by one detector invocation (`spec.md` §5), make this
//! tractable on call graphs with cycles: `call_taint` remembers whether a
//! callee's body contains any taint source, and `callee_state` remembers
//! which state variables a callee taints, pre-seeded with the empty set
//! before recursing so mutual or self recursion terminates.

use std::collections::{HashMap, HashSet};

use ir::{CompilationUnit, Function, FunctionId, Operation, VariableId};
use log::trace;

use crate::context::TaintContext;
use crate::source;

#[derive(Default)]
pub struct Caches {
    call_taint: HashMap<FunctionId, bool>,
    callee_state: HashMap<FunctionId, HashSet<VariableId>>,
}

impl Caches {
    pub fn new() -> Caches {
        Caches::default()
    }
}

/// Dispatch for `Operation::InternalCall` (`spec.md` §4.4.3/§4.5). A call
/// whose target is unresolved (`spec.md` §7 "broken IR") is skipped rather
/// than erroring.
pub fn handle_internal_call(
    unit: &CompilationUnit,
    ctx: &mut TaintContext,
    caches: &mut Caches,
    lvalue: Option<VariableId>,
    callee_id: Option<FunctionId>,
    arguments: &[VariableId],
) {
    let Some(callee_id) = callee_id else { return };
    let arena = &unit.arena;
    let callee = unit.function(callee_id);

    let any_arg_tainted =
        arguments.iter().filter(|a| !arena.is_constant(**a)).any(|a| ctx.is_tainted(arena, *a));

    let callee_has_taint = *caches
        .call_taint
        .entry(callee_id)
        .or_insert_with(|| callee_introduces_taint(unit, callee));

    if any_arg_tainted || callee_has_taint {
        if let Some(lvalue) = lvalue {
            ctx.mark(arena, lvalue);
        }
    }

    for sv in callee_tainted_state_vars(unit, callee_id, caches) {
        ctx.mark(arena, sv);
    }

    propagate_caller_taint_through_callee(unit, callee, ctx);
}

/// `true` if the callee's own body contains a taint source, per the rules
/// in `spec.md` §4.3 (ignoring anything that requires caller context, such
/// as `is_msg_sender` aliasing, since this only sees the callee in
/// isolation).
fn callee_introduces_taint(unit: &CompilationUnit, func: &Function) -> bool {
    let arena = &unit.arena;
    for node in unit.function_nodes(func) {
        for op in &node.irs {
            match op {
                Operation::SolidityCall { function, .. } if function == source::GASLEFT => {
                    return true;
                }
                Operation::SolidityCall { function, arguments, .. } if function == source::BALANCE => {
                    if let Some(&first) = arguments.first() {
                        if arena.builtin_name(first) == Some(source::MSG_SENDER) {
                            return true;
                        }
                    }
                }
                Operation::NewContract { call_salt: Some(_), .. } => return true,
                _ => {}
            }
            for read in op.reads() {
                if let Some(name) = arena.builtin_name(read) {
                    if source::is_gas_composed_source(name) {
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// Compute (with memoization and a recursion guard) the set of state
/// variables `func` taints as a side effect, by running the full
/// per-function analysis on it (`spec.md` §4.5.4).
fn callee_tainted_state_vars(
    unit: &CompilationUnit,
    callee_id: FunctionId,
    caches: &mut Caches,
) -> HashSet<VariableId> {
    if let Some(cached) = caches.callee_state.get(&callee_id) {
        return cached.clone();
    }
    // Pre-seed with the empty set so a cyclic call graph terminates.
    caches.callee_state.insert(callee_id, HashSet::new());

    let callee = unit.function(callee_id);
    trace!("summarizing side effects of callee `{}`", callee.canonical_name);
    let writes = crate::driver::analyze_function(unit, callee, caches);
    let result: HashSet<VariableId> = writes.into_iter().map(|(sv, _, _)| sv).collect();
    caches.callee_state.insert(callee_id, result.clone());
    result
}

/// Scan `callee`'s body with a fresh local taint set seeded from the
/// caller's context, so a chain like "helper A writes storage S; helper B
/// reads S and writes storage T" surfaces `T` as tainted in the caller too
/// (`spec.md` §4.5.5).
fn propagate_caller_taint_through_callee(unit: &CompilationUnit, callee: &Function, ctx: &mut TaintContext) {
    let arena = &unit.arena;
    let mut local_taint = HashSet::new();
    for node in unit.function_nodes(callee) {
        for op in &node.irs {
            let Some(lvalue) = op.lvalue() else { continue };
            let reads: Vec<VariableId> = op.reads().into_iter().filter(|r| !arena.is_constant(*r)).collect();
            let any_tainted =
                reads.iter().any(|r| ctx.is_tainted(arena, *r) || local_taint.contains(&arena.key(*r)));
            if any_tainted {
                local_taint.insert(arena.key(lvalue));
                let target = arena.resolve(lvalue);
                if arena.is_state(target) {
                    ctx.mark(arena, target);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(src: &str) -> CompilationUnit {
        let doc = ir::parse_unit(src).unwrap();
        ir::lower(doc).unwrap().0
    }

    /// `C.helperB()` reads state `S` into a local and stores that local to
    /// state `T`. In isolation (a fresh context, as step 4's
    /// `callee_tainted_state_vars` always starts one) `S` is an ordinary
    /// read, not a taint source, so the callee's own `analyze_function`
    /// pass finds nothing — only a caller that already treats `S` as
    /// tainted (standing in for an earlier callee's write) can make the
    /// rescan in `propagate_caller_taint_through_callee` carry that taint
    /// through the local into `T`.
    #[test]
    fn body_rescan_carries_caller_taint_through_a_local_the_callee_cannot_see_on_its_own() {
        let unit = build(
            r#"
            {
              "contracts": [{"name": "C", "state_variables": [{"name": "S"}, {"name": "T"}], "functions": ["C.helperB()"]}],
              "functions": [
                {
                  "name": "C.helperB()",
                  "contract": "C",
                  "nodes": [
                    {
                      "id": 0,
                      "ops": [
                        {"op": "assignment", "lvalue": "r0", "rvalue": "state:S"},
                        {"op": "assignment", "lvalue": "state:T", "rvalue": "r0"}
                      ]
                    }
                  ]
                }
              ]
            }
            "#,
        );
        let callee = unit.find_function("C.helperB()").unwrap();
        let s = unit.arena.find_state("C", "S").unwrap();
        let t = unit.arena.find_state("C", "T").unwrap();

        let mut caches = Caches::new();
        let isolated = crate::driver::analyze_function(&unit, callee, &mut caches);
        assert!(isolated.is_empty(), "callee has no taint source of its own");

        let mut ctx = TaintContext::new();
        ctx.mark(&unit.arena, s);
        propagate_caller_taint_through_callee(&unit, callee, &mut ctx);
        assert!(ctx.is_tainted(&unit.arena, t));
    }

    #[test]
    fn body_rescan_leaves_unrelated_state_untouched() {
        let unit = build(
            r#"
            {
              "contracts": [{"name": "C", "state_variables": [{"name": "S"}, {"name": "other"}], "functions": ["C.helperB()"]}],
              "functions": [
                {
                  "name": "C.helperB()",
                  "contract": "C",
                  "nodes": [
                    {"id": 0, "ops": [{"op": "assignment", "lvalue": "state:other", "rvalue": "const:zero"}]}
                  ]
                }
              ]
            }
            "#,
        );
        let callee = unit.find_function("C.helperB()").unwrap();
        let s = unit.arena.find_state("C", "S").unwrap();
        let other = unit.arena.find_state("C", "other").unwrap();

        let mut ctx = TaintContext::new();
        ctx.mark(&unit.arena, s);
        propagate_caller_taint_through_callee(&unit, callee, &mut ctx);
        assert!(!ctx.is_tainted(&unit.arena, other));
    }
}
