//! Safe substitutes for upstream errors of read-only methods.
//!
//! A sentinel such as `"0x0"` is not ground truth. Consumers that need to
//! tell a real zero from a failed call can't rely on these methods alone.

use serde_json::{Value, json};

use crate::jsonrpc::{self, ResponseData};

/// Prefixes and names of methods that change state or require a signature.
/// Their errors are always passed through.
const STATE_MUTATING_METHOD_PREFIXES: &[&str] = &[
    "eth_sendRawTransaction",
    "eth_sendTransaction",
    "eth_sign",
    "personal_sign",
    "wallet_",
];

/// Whether errors of the method must reach the caller unchanged.
///
/// `eth_sign` also covers `eth_signTransaction` and the `eth_signTypedData`
/// family.
pub fn is_state_mutating(method: &str) -> bool {
    STATE_MUTATING_METHOD_PREFIXES
        .iter()
        .any(|prefix| method.starts_with(prefix))
}

/// The sentinel result that replaces an upstream error of `method`, or `None`
/// if the error has to be passed through.
pub fn fallback_result(method: &str) -> Option<Value> {
    if is_state_mutating(method) {
        return None;
    }

    let result = match method {
        "eth_blockNumber" | "eth_gasPrice" => json!("0x0"),
        "eth_getBlockByNumber" | "eth_getBlockByHash" => json!({
            "number": "0x0",
            "hash": "0x0",
            "transactions": [],
        }),
        "eth_call" => json!("0x"),
        "eth_getLogs" => json!([]),
        _ => Value::Null,
    };

    Some(result)
}

/// Maps an error reported by the node for `method` to what the caller
/// observes.
pub fn resolve_upstream_error(method: &str, error: jsonrpc::Error) -> ResponseData<Value> {
    match fallback_result(method) {
        Some(result) => {
            log::warn!("Substituting {result} for failed '{method}' call: {error}");
            ResponseData::Success { result }
        }
        None => ResponseData::Error { error },
    }
}
