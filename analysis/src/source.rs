//! Taint-source recognition tables (`spec.md` §4.3): the builtin and
//! solidity-call names that introduce taint, ported from the module-level
//! constants of the Python detector this crate generalises.

/// `gasleft()` introduces taint unconditionally.
pub const GASLEFT: &str = "gasleft()";

/// `balance(address)` introduces taint only when its argument resolves to
/// `msg.sender` (`spec.md` §4.3).
pub const BALANCE: &str = "balance(address)";

pub const MSG_SENDER: &str = "msg.sender";

/// Gas-related composed globals that become taint sources the moment they
/// are read (`spec.md` §4.3's fourth bullet). The label is the variable's
/// own name, so this is really a membership table rather than a
/// name-rewriting one.
pub const GAS_COMPOSED_SOURCES: &[&str] =
    &["tx.gasprice", "block.basefee", "block.blobbasefee", "block.gaslimit"];

pub fn is_gas_composed_source(builtin_name: &str) -> bool {
    GAS_COMPOSED_SOURCES.contains(&builtin_name)
}

/// Hashing and ABI-encoding calls propagate taint from their arguments to
/// their lvalue but are not themselves sources (`spec.md` §4.4.3).
pub const HASH_AND_ENCODE: &[&str] = &[
    "keccak256()",
    "keccak256(bytes)",
    "sha3()",
    "sha256()",
    "sha256(bytes)",
    "ripemd160()",
    "ripemd160(bytes)",
    "abi.encode()",
    "abi.encodePacked()",
    "abi.encodeWithSelector()",
    "abi.encodeWithSignature()",
    "abi.encodeCall()",
];

pub fn is_hash_or_encode(function: &str) -> bool {
    HASH_AND_ENCODE.contains(&function)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_gas_composed_globals() {
        assert!(is_gas_composed_source("tx.gasprice"));
        assert!(is_gas_composed_source("block.basefee"));
        assert!(!is_gas_composed_source("block.timestamp"));
    }

    #[test]
    fn recognises_hash_and_encode_variants() {
        assert!(is_hash_or_encode("keccak256(bytes)"));
        assert!(is_hash_or_encode("abi.encodeWithSelector()"));
        assert!(!is_hash_or_encode("someOtherCall()"));
    }
}
