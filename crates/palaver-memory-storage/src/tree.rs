//! JSON tree helpers
//!
//! The store follows realtime-database conventions: `null` and empty objects do not
//! exist, so writing either deletes the node and any ancestor left empty.

use palaver_storage_traits::path::validate_segment;
use palaver_storage_traits::{StoreError, StorePath};
use serde_json::{Map, Value};

/// Strips `null` children and empty objects, validating object keys on the way.
pub(crate) fn normalize(value: Value) -> Result<Option<Value>, StoreError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => {
            let mut cleaned = Map::with_capacity(map.len());
            for (key, child) in map {
                validate_segment(&key)?;
                if let Some(child) = normalize(child)? {
                    cleaned.insert(key, child);
                }
            }
            if cleaned.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Value::Object(cleaned)))
            }
        }
        other => Ok(Some(other)),
    }
}

/// Value stored at `path`, if any.
pub(crate) fn get_at(root: &Map<String, Value>, path: &StorePath) -> Option<Value> {
    let Some((first, rest)) = path.segments().split_first() else {
        if root.is_empty() {
            return None;
        }
        return Some(Value::Object(root.clone()));
    };
    let mut node = root.get(first)?;
    for segment in rest {
        node = node.as_object()?.get(segment)?;
    }
    Some(node.clone())
}

/// Writes `value` at `path`; `None` deletes.
///
/// The root node itself can only hold an object.
pub(crate) fn set_at(
    root: &mut Map<String, Value>,
    path: &StorePath,
    value: Option<Value>,
) -> Result<(), StoreError> {
    if path.is_root() {
        *root = match value {
            None => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(StoreError::Other(
                    "the store root can only hold an object".to_string(),
                ));
            }
        };
        return Ok(());
    }
    set_in(root, path.segments(), value);
    Ok(())
}

fn set_in(map: &mut Map<String, Value>, segments: &[String], value: Option<Value>) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        match value {
            Some(value) => {
                map.insert(first.clone(), value);
            }
            None => {
                map.remove(first);
            }
        }
        return;
    }

    if value.is_none() && !map.get(first).is_some_and(Value::is_object) {
        return;
    }

    let child = map
        .entry(first.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    let now_empty = match child {
        Value::Object(child) => {
            set_in(child, rest, value);
            child.is_empty()
        }
        _ => false,
    };
    if now_empty {
        map.remove(first);
    }
}
