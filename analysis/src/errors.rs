//! Typed errors surfaced at the analysis crate's boundary (`spec.md` §7,
//! `SPEC_FULL.md` §12.1). Everything the engine itself can recover from —
//! an unresolved call target, a missing storage slot — stays silent at the
//! point of origin; only the two cases a caller of this crate needs to
//! react to are modeled here.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("unknown contract `{0}`")]
    UnknownContract(String),

    #[error(transparent)]
    Layout(#[from] ir::LayoutError),
}
