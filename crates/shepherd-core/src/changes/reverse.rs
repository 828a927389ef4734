use crate::{
    blob::{self, ChangeBlob},
    obs::metrics,
    value::{Value, ValueMap},
};
use std::collections::btree_map;

/// Reverse a change blob: every `(before, after)` pair swaps, every nested
/// map reverses, `_create` and `_destroy` swap, everything else copies
/// as-is. A pure structural transform (no schema, no entities) and an
/// involution: reversing twice restores the input.
#[must_use]
pub fn reverse_changes(changes: &ChangeBlob) -> ChangeBlob {
    metrics::count(|m| m.ops.reverse_calls += 1);

    ChangeBlob::from_map(reverse_map(changes.as_map()))
}

struct Frame<'a> {
    /// Key under which the finished map lands in its parent; `None` at root.
    key: Option<String>,
    entries: btree_map::Iter<'a, String, Value>,
    out: ValueMap,
}

// Depth-first over an explicit stack; nesting depth costs heap, not call
// stack, so arbitrarily deep blobs reverse safely.
fn reverse_map(source: &ValueMap) -> ValueMap {
    let mut stack = vec![Frame {
        key: None,
        entries: source.iter(),
        out: ValueMap::new(),
    }];

    loop {
        let Some(frame) = stack.last_mut() else {
            // unreachable: the root frame only pops via the return below
            return ValueMap::new();
        };

        if let Some((key, value)) = frame.entries.next() {
            if let Value::Map(inner) = value {
                stack.push(Frame {
                    key: Some(reversed_key(key)),
                    entries: inner.iter(),
                    out: ValueMap::new(),
                });
            } else {
                let (key, value) = reversed_leaf(key, value);
                frame.out.insert(key, value);
            }
            continue;
        }

        let Some(done) = stack.pop() else {
            return ValueMap::new();
        };
        match (stack.last_mut(), done.key) {
            (Some(parent), Some(key)) => {
                parent.out.insert(key, Value::Map(done.out));
            }
            _ => return done.out,
        }
    }
}

// `_create` ⇄ `_destroy`; other keys pass through.
fn reversed_key(key: &str) -> String {
    if key == blob::CREATE_KEY {
        blob::DESTROY_KEY.to_string()
    } else if key == blob::DESTROY_KEY {
        blob::CREATE_KEY.to_string()
    } else {
        key.to_string()
    }
}

fn reversed_leaf(key: &str, value: &Value) -> (String, Value) {
    let reversed = match value.as_pair() {
        Some((before, after)) => Value::pair(after.clone(), before.clone()),
        None => value.clone(),
    };

    (reversed_key(key), reversed)
}
