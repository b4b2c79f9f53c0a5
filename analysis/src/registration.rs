//! Detector-plugin registration surface (`spec.md` §6, `SPEC_FULL.md`
//! §12). Mirrors the shape a host registry of detectors would expect:
//! an identifier, impact/confidence classification, wiki copy, and a
//! `detect` entry point, grounded on the Python `TaintedStorage` class's
//! own class attributes and `_detect` method.

use ir::{CompilationUnit, StorageLayoutOracle};

use crate::config;
use crate::driver::{detect, Finding};

/// Severity classification a host uses to group/filter findings, matching
/// the two-level scale the Python detector declares via `IMPACT`/
/// `CONFIDENCE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Medium,
}

/// A detector pluggable into a host's analysis registry.
pub trait Detector {
    fn argument(&self) -> &'static str;
    fn help(&self) -> &'static str;
    fn impact(&self) -> Classification;
    fn confidence(&self) -> Classification;
    fn wiki(&self) -> &'static str;
    fn wiki_title(&self) -> &'static str;
    fn wiki_description(&self) -> &'static str;
    fn wiki_exploit_scenario(&self) -> &'static str;
    fn wiki_recommendation(&self) -> &'static str;
    fn detect(&self, unit: &CompilationUnit, layout: &dyn StorageLayoutOracle) -> Vec<Finding>;
}

pub const WIKI: &str = "https://github.com/crytic/slither/wiki/tainted-storage";

pub const WIKI_TITLE: &str = "Storage tainted by gas-dependent or CREATE2 values";

pub const WIKI_DESCRIPTION: &str = "Detects state variables whose stored value depends on \
`gasleft()`, `tx.gasprice`, `block.basefee`, `block.blobbasefee`, `block.gaslimit`, the address \
returned by CREATE2, or `msg.sender.balance`. These values are non-deterministic or manipulable \
and storing them can lead to unexpected contract behavior.";

pub const WIKI_EXPLOIT_SCENARIO: &str = r#"
```solidity
contract Example {
    uint256 public gasSnapshot;
    function save() external {
        gasSnapshot = gasleft();
    }
}
```
`gasSnapshot` depends on remaining gas, which varies per call and
can be manipulated by callers to influence contract state."#;

pub const WIKI_RECOMMENDATION: &str = "Avoid storing values derived from `gasleft()`, \
`tx.gasprice`, `block.basefee`, `block.blobbasefee`, `block.gaslimit`, CREATE2 deployment \
addresses, or `msg.sender.balance` in contract storage. If needed, document the \
non-determinism clearly and add validation logic.";

/// The tainted-storage detector itself.
pub struct TaintedStorageDetector;

impl Detector for TaintedStorageDetector {
    fn argument(&self) -> &'static str {
        config::ARGUMENT
    }

    fn help(&self) -> &'static str {
        config::HELP
    }

    fn impact(&self) -> Classification {
        Classification::Medium
    }

    fn confidence(&self) -> Classification {
        Classification::Medium
    }

    fn wiki(&self) -> &'static str {
        WIKI
    }

    fn wiki_title(&self) -> &'static str {
        WIKI_TITLE
    }

    fn wiki_description(&self) -> &'static str {
        WIKI_DESCRIPTION
    }

    fn wiki_exploit_scenario(&self) -> &'static str {
        WIKI_EXPLOIT_SCENARIO
    }

    fn wiki_recommendation(&self) -> &'static str {
        WIKI_RECOMMENDATION
    }

    fn detect(&self, unit: &CompilationUnit, layout: &dyn StorageLayoutOracle) -> Vec<Finding> {
        detect(unit, layout)
    }
}

/// The registry entry point a host calls to discover detectors/printers
/// (`spec.md` §6: `(detectors, printers) = ([TaintedStorage], [])`).
pub fn get_detectors() -> (Vec<Box<dyn Detector>>, Vec<()>) {
    (vec![Box::new(TaintedStorageDetector)], Vec::new())
}
