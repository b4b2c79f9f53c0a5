use crate::function::FunctionId;
use crate::variable::VariableId;

/// An IR operation, tagged by kind, as enumerated in `spec.md` §3. Every
/// variant that writes a value exposes it through [`Operation::lvalue`],
/// and every variant exposes the variables it reads through
/// [`Operation::reads`] — together these stand in for the host's generic
/// `OperationWithLValue` capability.
#[derive(Clone, Debug)]
pub enum Operation {
    Assignment { lvalue: VariableId, rvalue: VariableId },
    Binary { lvalue: VariableId, left: VariableId, right: VariableId },
    Unary { lvalue: VariableId, rvalue: VariableId },
    TypeConversion { lvalue: VariableId, variable: VariableId },
    /// Collection indexing; `right` is the index/key.
    Index { lvalue: VariableId, left: VariableId, right: VariableId },
    Unpack { lvalue: VariableId, tuple: VariableId, index: usize },
    SolidityCall { function: String, arguments: Vec<VariableId>, lvalue: Option<VariableId> },
    NewContract { lvalue: Option<VariableId>, call_salt: Option<VariableId> },
    InternalCall { lvalue: Option<VariableId>, function: Option<FunctionId>, arguments: Vec<VariableId> },
    Condition { value: VariableId },
}

impl Operation {
    /// The variable this operation writes, if any.
    pub fn lvalue(&self) -> Option<VariableId> {
        use Operation::*;
        match self {
            Assignment { lvalue, .. }
            | Binary { lvalue, .. }
            | Unary { lvalue, .. }
            | TypeConversion { lvalue, .. }
            | Index { lvalue, .. } => Some(*lvalue),
            Unpack { lvalue, .. } => Some(*lvalue),
            SolidityCall { lvalue, .. } | NewContract { lvalue, .. } | InternalCall { lvalue, .. } => {
                *lvalue
            }
            Condition { .. } => None,
        }
    }

    /// The variables this operation reads (the `OperationWithLValue::read`
    /// capability from `spec.md` §3). Does not include the lvalue itself.
    pub fn reads(&self) -> Vec<VariableId> {
        use Operation::*;
        match self {
            Assignment { rvalue, .. } => vec![*rvalue],
            Binary { left, right, .. } => vec![*left, *right],
            Unary { rvalue, .. } => vec![*rvalue],
            TypeConversion { variable, .. } => vec![*variable],
            Index { left, right, .. } => vec![*left, *right],
            Unpack { tuple, .. } => vec![*tuple],
            SolidityCall { arguments, .. } => arguments.clone(),
            NewContract { call_salt, .. } => call_salt.into_iter().copied().collect(),
            InternalCall { arguments, .. } => arguments.clone(),
            Condition { value } => vec![*value],
        }
    }
}
