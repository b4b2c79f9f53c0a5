use std::collections::HashMap;

use serde::Deserialize;

/// The JSON shape a host frontend emits in place of handing over live
/// compiler objects (`spec.md` §1: "the core does not parse source text" —
/// the host is assumed to have already lowered source into this IR).
/// Variable references inside operations are plain strings, resolved by
/// [`crate::lower::lower`]:
///
/// - `"state:<name>"` — the named state variable of the function's own
///   contract.
/// - `"const:<label>"` — a fresh constant (never tainted, never a read).
/// - anything containing a `.` (e.g. `"msg.sender"`, `"tx.gasprice"`) — a
///   builtin composed variable.
/// - anything else — a local/temporary variable, interned by name within
///   the enclosing function. Declare it in `locals` (mapping its name to
///   one of the targets above, or to another local) to make it a
///   reference variable.
#[derive(Debug, Deserialize)]
pub struct UnitDocument {
    #[serde(default)]
    pub contracts: Vec<ContractDocument>,
    #[serde(default)]
    pub functions: Vec<FunctionDocument>,
}

#[derive(Debug, Deserialize)]
pub struct StateVariableDocument {
    pub name: String,
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_size() -> u32 {
    32
}

#[derive(Debug, Deserialize)]
pub struct ContractDocument {
    pub name: String,
    #[serde(default)]
    pub state_variables: Vec<StateVariableDocument>,
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub modifiers_declared: Vec<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FunctionDocument {
    pub name: String,
    pub contract: String,
    #[serde(default = "default_true")]
    pub implemented: bool,
    /// Reference-variable declarations: local name -> alias target.
    #[serde(default)]
    pub locals: HashMap<String, String>,
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub enum NodeKindDocument {
    #[serde(rename = "BEGIN")]
    Begin,
    #[default]
    #[serde(rename = "EXPRESSION")]
    Expression,
    #[serde(rename = "IF")]
    If,
    #[serde(rename = "IFLOOP")]
    IfLoop,
    #[serde(rename = "ENDIF")]
    EndIf,
    #[serde(rename = "OTHER")]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct NodeDocument {
    pub id: u32,
    #[serde(default)]
    pub kind: NodeKindDocument,
    #[serde(default)]
    pub sons: Vec<u32>,
    #[serde(default)]
    pub ops: Vec<OperationDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OperationDocument {
    Assignment { lvalue: String, rvalue: String },
    Binary { lvalue: String, left: String, right: String },
    Unary { lvalue: String, rvalue: String },
    TypeConversion { lvalue: String, variable: String },
    Index { lvalue: String, left: String, right: String },
    Unpack { lvalue: String, tuple: String, index: usize },
    SolidityCall {
        function: String,
        #[serde(default)]
        arguments: Vec<String>,
        #[serde(default)]
        lvalue: Option<String>,
    },
    NewContract {
        #[serde(default)]
        lvalue: Option<String>,
        #[serde(default)]
        call_salt: Option<String>,
    },
    InternalCall {
        #[serde(default)]
        lvalue: Option<String>,
        #[serde(default)]
        function: Option<String>,
        #[serde(default)]
        arguments: Vec<String>,
    },
    Condition { value: String },
}

pub fn parse_unit(source: &str) -> serde_json::Result<UnitDocument> {
    serde_json::from_str(source)
}
