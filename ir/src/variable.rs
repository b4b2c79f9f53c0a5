use std::collections::{HashMap, HashSet};

/// Stable handle into a [`VariableArena`]. Valid for the lifetime of one
/// compilation unit, which is what `spec.md` §9 requires of a host that
/// preserves variable object identity across uses within a function pass.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct VariableId(pub(crate) u32);

/// The variable kinds the detector distinguishes (`spec.md` §3). A
/// reference variable is modeled as `Local { points_to: Some(origin) }`
/// rather than as a separate kind, since the only thing that distinguishes
/// it from an ordinary local is the presence of an alias target.
#[derive(Clone, Debug)]
pub enum VariableKind {
    /// A contract state variable; the sink the detector reports on.
    State { contract: String, name: String },
    /// A builtin composed variable such as `msg.sender` or `tx.gasprice`.
    Builtin { name: String },
    /// A literal. Never tainted and never treated as a taint-relevant read.
    Constant,
    /// A local or temporary variable, optionally aliasing another variable
    /// (mapping cell, array element, struct field).
    Local { points_to: Option<VariableId> },
}

#[derive(Clone, Debug)]
pub struct VariableData {
    pub kind: VariableKind,
    pub debug_name: Option<String>,
}

/// Canonical hashable key for a variable, per `spec.md` §3: state variables
/// and builtins are keyed by name so that every occurrence of `msg.sender`
/// or `Contract.balanceOf` resolves to the same key, while locals and
/// references fall back to object identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VarKey {
    State(String),
    Builtin(String),
    Object(VariableId),
}

/// Arena owning every variable touched by one compilation unit. State
/// variables and builtins are interned so that repeated occurrences share a
/// `VariableId`; locals are allocated fresh by the lowering pass (or reused
/// within a function's local-name scope, see `ir::lower`).
#[derive(Default)]
pub struct VariableArena {
    vars: Vec<VariableData>,
    state_index: HashMap<(String, String), VariableId>,
    builtin_index: HashMap<String, VariableId>,
}

impl VariableArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_state(&self, contract: &str, name: &str) -> Option<VariableId> {
        self.state_index.get(&(contract.to_string(), name.to_string())).copied()
    }

    pub fn intern_state(&mut self, contract: &str, name: &str) -> VariableId {
        let key = (contract.to_string(), name.to_string());
        if let Some(&id) = self.state_index.get(&key) {
            return id;
        }
        let id = self.push(VariableData {
            kind: VariableKind::State { contract: contract.to_string(), name: name.to_string() },
            debug_name: None,
        });
        self.state_index.insert(key, id);
        id
    }

    pub fn intern_builtin(&mut self, name: &str) -> VariableId {
        if let Some(&id) = self.builtin_index.get(name) {
            return id;
        }
        let id = self.push(VariableData {
            kind: VariableKind::Builtin { name: name.to_string() },
            debug_name: None,
        });
        self.builtin_index.insert(name.to_string(), id);
        id
    }

    pub fn new_constant(&mut self, debug_name: Option<String>) -> VariableId {
        self.push(VariableData { kind: VariableKind::Constant, debug_name })
    }

    pub fn new_local(&mut self, points_to: Option<VariableId>, debug_name: Option<String>) -> VariableId {
        self.push(VariableData { kind: VariableKind::Local { points_to }, debug_name })
    }

    /// Rewrite the alias target of a previously allocated local. Used by the
    /// lowering pass to support reference variables whose origin is only
    /// known after every local in the function has been allocated.
    pub fn set_points_to(&mut self, id: VariableId, origin: VariableId) {
        if let VariableKind::Local { points_to } = &mut self.vars[id.0 as usize].kind {
            *points_to = Some(origin);
        }
    }

    pub fn get(&self, id: VariableId) -> &VariableData {
        &self.vars[id.0 as usize]
    }

    pub fn is_constant(&self, id: VariableId) -> bool {
        matches!(self.get(id).kind, VariableKind::Constant)
    }

    pub fn is_state(&self, id: VariableId) -> bool {
        matches!(self.get(id).kind, VariableKind::State { .. })
    }

    pub fn is_builtin(&self, id: VariableId) -> bool {
        matches!(self.get(id).kind, VariableKind::Builtin { .. })
    }

    pub fn builtin_name(&self, id: VariableId) -> Option<&str> {
        match &self.get(id).kind {
            VariableKind::Builtin { name } => Some(name),
            _ => None,
        }
    }

    pub fn canonical_name(&self, id: VariableId) -> Option<String> {
        match &self.get(id).kind {
            VariableKind::State { contract, name } => Some(format!("{contract}.{name}")),
            _ => None,
        }
    }

    pub fn contract_of(&self, id: VariableId) -> Option<&str> {
        match &self.get(id).kind {
            VariableKind::State { contract, .. } => Some(contract),
            _ => None,
        }
    }

    pub fn name_of(&self, id: VariableId) -> Option<&str> {
        match &self.get(id).kind {
            VariableKind::State { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn key(&self, id: VariableId) -> VarKey {
        match &self.get(id).kind {
            VariableKind::State { contract, name } => VarKey::State(format!("{contract}.{name}")),
            VariableKind::Builtin { name } => VarKey::Builtin(name.clone()),
            VariableKind::Constant | VariableKind::Local { .. } => VarKey::Object(id),
        }
    }

    /// Follow a reference-variable chain to its origin (`spec.md` §4.1).
    /// Guards against cycles: a repeated node in the chain stops the walk
    /// and returns the last-visited (non-repeated) variable.
    pub fn resolve(&self, id: VariableId) -> VariableId {
        let mut current = id;
        let mut seen = HashSet::new();
        loop {
            if !seen.insert(current) {
                return current;
            }
            match &self.get(current).kind {
                VariableKind::Local { points_to: Some(origin) } => current = *origin,
                _ => return current,
            }
        }
    }

    pub fn display_name(&self, id: VariableId) -> String {
        match &self.get(id).kind {
            VariableKind::State { contract, name } => format!("{contract}.{name}"),
            VariableKind::Builtin { name } => name.clone(),
            VariableKind::Constant => {
                self.get(id).debug_name.clone().unwrap_or_else(|| "<const>".to_string())
            }
            VariableKind::Local { .. } => {
                self.get(id).debug_name.clone().unwrap_or_else(|| format!("%{}", id.0))
            }
        }
    }
}
