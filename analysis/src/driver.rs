//! The driver (`spec.md` §4.9/§9): runs the per-function engine over every
//! contract in a compilation unit, dedupes findings, and enriches them with
//! storage-layout metadata.

use std::collections::HashSet;

use ir::{CompilationUnit, Contract, Function, FunctionId, NodeId, StorageLayoutOracle, VariableId};
use log::debug;
use serde::Serialize;

use crate::context::TaintContext;
use crate::control_flow::propagate_control_flow_taint;
use crate::errors::AnalysisError;
use crate::interprocedural::Caches;
use crate::overwrite::remove_overwritten_findings;
use crate::propagate::process_node_data_flow;

/// One finding, serializable to the `spec.md` §6 result schema.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub variable: String,
    pub contract: String,
    pub slot: i64,
    pub slot_hex: String,
    pub offset: i64,
    pub taint_source: String,
    pub function: String,
    #[serde(skip)]
    node: NodeId,
}

impl Finding {
    /// The node index this finding's write occurred at, for hosts building
    /// their own structured diagnostics out of a `Finding`.
    pub fn node_index(&self) -> u32 {
        self.node.index()
    }

    /// A human-readable element sequence suitable for a host pretty-printer
    /// (`spec.md` §6, mirroring the teacher's `Report` rendering).
    pub fn pretty(&self) -> String {
        format!(
            "{} (slot: {}, offset: {}) is tainted by {} in {}\n\tnode {}\n",
            self.variable, self.slot, self.offset, self.taint_source, self.function, self.node.index()
        )
    }
}

/// Run the three-phase engine on one function and return its tainted state
/// writes: data-flow propagation (C4, inlining C5 at call sites), then
/// control-flow propagation (C6), then overwrite elimination (C7).
pub fn analyze_function(
    unit: &CompilationUnit,
    function: &Function,
    caches: &mut Caches,
) -> Vec<(VariableId, NodeId, String)> {
    let mut ctx = TaintContext::new();

    for node in unit.function_nodes(function) {
        process_node_data_flow(unit, function, node, &mut ctx, caches);
    }
    propagate_control_flow_taint(unit, function, &mut ctx);
    remove_overwritten_findings(unit, function, &mut ctx);

    ctx.into_findings()
}

/// Run the engine on a single named function, the entry point a host
/// wiring this crate into a broader pipeline calls directly rather than
/// through [`detect`] (`SPEC_FULL.md` §12.1): surfaces an unresolved name
/// as a typed error instead of silently skipping it.
pub fn analyze_function_named(
    unit: &CompilationUnit,
    canonical_name: &str,
    caches: &mut Caches,
) -> Result<Vec<(VariableId, NodeId, String)>, AnalysisError> {
    let function = unit
        .find_function(canonical_name)
        .ok_or_else(|| AnalysisError::UnknownFunction(canonical_name.to_string()))?;
    Ok(analyze_function(unit, function, caches))
}

/// Build the ordered, deduplicated analysis list for a contract: its
/// declared functions and modifiers, plus inherited modifiers not already
/// present (`spec.md` §4.9).
fn analyzable_functions<'a>(unit: &'a CompilationUnit, contract: &Contract) -> Vec<&'a Function> {
    let mut ids: Vec<FunctionId> = Vec::new();
    let mut seen = HashSet::new();
    for id in contract.functions_declared.iter().chain(&contract.modifiers_declared) {
        if seen.insert(*id) {
            ids.push(*id);
        }
    }
    for id in &contract.modifiers {
        if seen.insert(*id) {
            ids.push(*id);
        }
    }
    ids.into_iter().map(|id| unit.function(id)).collect()
}

/// Look up one contract by name, surfacing an unresolved name as a typed
/// error (`SPEC_FULL.md` §12.1) instead of panicking.
pub fn find_contract_named<'a>(
    unit: &'a CompilationUnit,
    name: &str,
) -> Result<&'a Contract, AnalysisError> {
    unit.contracts_derived
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| AnalysisError::UnknownContract(name.to_string()))
}

/// Run the engine over every analyzable function of every contract in
/// `unit`, attach storage-layout metadata, and dedupe by
/// `(variable canonical_name, function canonical_name)`.
pub fn detect(unit: &CompilationUnit, layout: &dyn StorageLayoutOracle) -> Vec<Finding> {
    let mut results = Vec::new();
    let mut caches = Caches::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for contract in &unit.contracts_derived {
        for function in analyzable_functions(unit, contract) {
            if !function.is_implemented {
                continue;
            }
            let writes = analyze_function(unit, function, &mut caches);
            debug!(
                "function `{}` produced {} tainted state write(s)",
                function.canonical_name,
                writes.len()
            );
            for (state_var, node, reason) in writes {
                let Some(variable) = unit.arena.canonical_name(state_var) else { continue };
                let key = (variable.clone(), function.canonical_name.clone());
                if !seen.insert(key) {
                    continue;
                }

                let contract_name =
                    unit.arena.contract_of(state_var).unwrap_or(contract.name.as_str()).to_string();
                let var_name = unit.arena.name_of(state_var).unwrap_or_default().to_string();
                let (slot, offset) =
                    layout.storage_layout_of(&contract_name, &var_name).unwrap_or((-1, -1));
                let slot_hex = format_slot_hex(slot);

                results.push(Finding {
                    variable,
                    contract: contract_name,
                    slot,
                    slot_hex,
                    offset,
                    taint_source: reason,
                    function: function.canonical_name.clone(),
                    node,
                });
            }
        }
    }
    results
}

/// Format a slot index as `"0x"` plus 64 lowercase hex digits (`spec.md`
/// §4.9/§6). A successful lookup always yields a non-negative slot and
/// formats as its ordinary 256-bit-width hex value. The `-1` lookup-failure
/// sentinel (`spec.md` §7) has no natural 256-bit representation; we render
/// it as the all-`f` pattern rather than embedding a sign inside the hex
/// body, so `slot_hex` stays a well-formed 66-character `0x`-prefixed
/// string in every case (see DESIGN.md).
fn format_slot_hex(slot: i64) -> String {
    if slot < 0 {
        format!("0x{}", "f".repeat(64))
    } else {
        format!("0x{slot:064x}")
    }
}
