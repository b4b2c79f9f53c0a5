use std::collections::HashSet;

use ir::{NodeId, VarKey, VariableArena, VariableId};

/// Per-function taint state (`spec.md` §3/§4.2). Created fresh for each
/// function analysis pass and discarded at the end of it; the caches that
/// outlive a single function (call-taint and callee-state) live on the
/// driver instead, see [`crate::interprocedural`].
#[derive(Default)]
pub struct TaintContext {
    tainted: HashSet<VarKey>,
    msg_sender_aliases: HashSet<VariableId>,
    findings: Vec<(VariableId, NodeId, String)>,
    seen_writes: HashSet<(String, NodeId)>,
    cached_reason: Option<String>,
}

impl TaintContext {
    pub fn new() -> TaintContext {
        TaintContext::default()
    }

    pub fn is_tainted(&self, arena: &VariableArena, var: VariableId) -> bool {
        self.tainted.contains(&arena.key(var))
    }

    pub fn mark(&mut self, arena: &VariableArena, var: VariableId) {
        self.tainted.insert(arena.key(var));
    }

    /// Taints `lvalue` iff any of `reads` is already tainted. Ignores a
    /// missing lvalue and constants, neither of which are taint-relevant
    /// (`spec.md` §4.4.4).
    pub fn mark_if_any(
        &mut self,
        arena: &VariableArena,
        lvalue: Option<VariableId>,
        reads: impl IntoIterator<Item = VariableId>,
    ) {
        let Some(lvalue) = lvalue else { return };
        let any_tainted = reads
            .into_iter()
            .filter(|r| !arena.is_constant(*r))
            .any(|r| self.is_tainted(arena, r));
        if any_tainted {
            self.mark(arena, lvalue);
        }
    }

    pub fn is_msg_sender(&self, arena: &VariableArena, var: VariableId) -> bool {
        if arena.builtin_name(var) == Some("msg.sender") {
            return true;
        }
        self.msg_sender_aliases.contains(&var)
    }

    pub fn mark_sender_alias(&mut self, var: VariableId) {
        self.msg_sender_aliases.insert(var);
    }

    /// Record a finding for a resolved state-variable write, deduped by
    /// `(canonical_name, node)` (`spec.md` §4.4.5/§4.6). The driver applies
    /// a second dedup pass over `(canonical_name, function)` on top of this
    /// one (`spec.md` §3 invariant 5).
    pub fn push_finding(&mut self, target: VariableId, node: NodeId, canonical_name: String, reason: String) {
        if self.seen_writes.insert((canonical_name, node)) {
            self.findings.push((target, node, reason));
        }
    }

    pub fn findings(&self) -> &[(VariableId, NodeId, String)] {
        &self.findings
    }

    pub fn into_findings(self) -> Vec<(VariableId, NodeId, String)> {
        self.findings
    }

    /// Drop every finding for a state variable whose canonical name fails
    /// `keep`, and rebuild the dedup index from the survivors (`spec.md`
    /// §4.7.3).
    pub fn retain_findings(&mut self, arena: &VariableArena, mut keep: impl FnMut(&str) -> bool) {
        self.findings.retain(|(target, _, _)| {
            arena.canonical_name(*target).map(|name| keep(&name)).unwrap_or(true)
        });
        self.seen_writes = self
            .findings
            .iter()
            .filter_map(|(target, node, _)| arena.canonical_name(*target).map(|name| (name, *node)))
            .collect();
    }

    pub fn cached_reason(&self) -> Option<&str> {
        self.cached_reason.as_deref()
    }

    pub fn set_cached_reason(&mut self, reason: String) {
        self.cached_reason = Some(reason);
    }
}
