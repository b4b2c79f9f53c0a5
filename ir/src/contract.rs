use crate::function::FunctionId;

/// A contract, as derived by the host compilation unit (`spec.md` §6:
/// `Contract.{name, functions_declared, modifiers_declared, modifiers}`).
#[derive(Clone, Debug)]
pub struct Contract {
    pub name: String,
    pub functions_declared: Vec<FunctionId>,
    pub modifiers_declared: Vec<FunctionId>,
    /// Every modifier in scope for the contract, including inherited ones
    /// not present in `modifiers_declared`.
    pub modifiers: Vec<FunctionId>,
}
