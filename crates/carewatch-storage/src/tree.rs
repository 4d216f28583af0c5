// Local mirror of a realtime database subtree
//
// Streaming subscriptions send `put` (replace at path) and `patch` (merge
// children at path) deltas. Applying them to a local JSON tree yields the
// complete snapshot that subscribers expect.

use serde_json::{Map, Value};

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Replace the value at `path`; `null` deletes it
pub fn apply_put(root: &mut Value, path: &str, data: Value) {
    let segments = segments(path);
    let Some((last, parents)) = segments.split_last() else {
        *root = data;
        return;
    };

    let mut node = root;
    for segment in parents {
        if data.is_null() {
            // Deleting under a missing parent leaves the tree untouched
            node = match node {
                Value::Object(map) => match map.get_mut(*segment) {
                    Some(child) => child,
                    None => return,
                },
                _ => return,
            };
            continue;
        }
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => return,
        };
    }

    if data.is_null() {
        if let Value::Object(map) = node {
            map.remove(*last);
        }
        return;
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        map.insert(last.to_string(), data);
    }
}

/// Merge each child of `data` into the value at `path`
pub fn apply_patch(root: &mut Value, path: &str, data: Value) {
    let Value::Object(children) = data else {
        apply_put(root, path, data);
        return;
    };
    let base = path.trim_end_matches('/');
    for (key, value) in children {
        apply_put(root, &format!("{}/{}", base, key), value);
    }
}
