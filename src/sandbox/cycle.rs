//! Structural self-reference check for data crossing a frame boundary.
//!
//! Payload values are usually rebuilt by the evaluator, so pointer identity
//! tells us nothing: a payload is unsafe when any value inside it is
//! structurally equal to the caller's whole data environment.

use std::collections::BTreeMap;

use crate::value::Value;

/// Nesting depth past which a payload is rejected outright.
pub const MAX_DEPTH: usize = 1000;

/// Returns false if `node` (or anything inside it) equals `env`, or if the
/// walk goes deeper than [`MAX_DEPTH`].
pub fn is_safe(node: &Value, env: &BTreeMap<String, Value>, depth: usize) -> bool {
    if depth > MAX_DEPTH {
        return false;
    }
    if is_environment(node, env) {
        return false;
    }

    let Some(children) = node.children() else {
        return true;
    };

    for child in children {
        if child.is_container() {
            if !is_safe(child, env, depth + 1) {
                return false;
            }
        } else if is_environment(child, env) {
            return false;
        }
    }

    true
}

fn is_environment(node: &Value, env: &BTreeMap<String, Value>) -> bool {
    matches!(node, Value::Map(map) if map == env)
}
