//! Detector metadata shared between the analysis engine and its
//! registration surface, kept in one place the way the teacher's
//! `program_analysis::config`/`cli::config` separate constants from logic.

pub const ARGUMENT: &str = "tainted-storage";

pub const HELP: &str =
    "State variables tainted by gasleft, gas-related globals, CREATE2, or sender balance";
