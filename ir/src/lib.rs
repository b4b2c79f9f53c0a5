//! Host-IR data model consumed by the tainted-storage detector.
//!
//! This crate owns everything the detector core treats as an external
//! collaborator (`spec.md` §1): the variable/operation/CFG data model a
//! host compiler frontend would hand over, a JSON transport format for
//! that IR, a storage-layout oracle, and diagnostic reporting.

pub mod contract;
pub mod document;
pub mod function;
pub mod layout;
pub mod lower;
pub mod node;
pub mod operation;
pub mod report;
pub mod report_writer;
pub mod unit;
pub mod variable;

pub use contract::Contract;
pub use document::{parse_unit, UnitDocument};
pub use function::{Function, FunctionId};
pub use layout::{LayoutError, SequentialStorageLayout, StorageLayoutOracle};
pub use lower::{lower, LowerError};
pub use node::{Node, NodeId, NodeKind};
pub use operation::Operation;
pub use report::{MessageCategory, Report, ReportCollection, ReportLocation};
pub use report_writer::{JsonWriter, ReportFilter, ReportWriter, StdoutWriter};
pub use unit::CompilationUnit;
pub use variable::{VarKey, VariableArena, VariableData, VariableId, VariableKind};
