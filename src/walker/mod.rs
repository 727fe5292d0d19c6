//! Recursive leaf visitor for nested JSON values.

use crate::error::SeedResult;
use serde_json::Value;

/// Visits every leaf (non-object, non-array) value reachable from `value` in
/// depth-first, left-to-right order and lets the handler replace it in place.
///
/// Containers are recursed into, never handed to the handler. Field order
/// follows declaration order because serde_json is compiled with
/// `preserve_order`.
pub fn walk_leaves<F>(value: &mut Value, handler: &mut F) -> SeedResult<()>
where
    F: FnMut(&mut Value) -> SeedResult<()>,
{
    match value {
        Value::Object(map) => {
            for (_, child) in map.iter_mut() {
                walk_leaves(child, handler)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                walk_leaves(child, handler)?;
            }
            Ok(())
        }
        leaf => handler(leaf),
    }
}

#[cfg(test)]
mod tests {
    use super::walk_leaves;
    use serde_json::{json, Value};

    #[test]
    fn test_visits_leaves_in_declaration_order() {
        let mut value = json!({
            "a": 1,
            "b": { "c": 2, "d": [3, { "e": 4 }] },
            "f": 5
        });

        let mut seen = Vec::new();
        walk_leaves(&mut value, &mut |leaf| {
            seen.push(leaf.clone());
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, vec![json!(1), json!(2), json!(3), json!(4), json!(5)]);
    }

    #[test]
    fn test_replaces_leaves_in_place() {
        let mut value = json!({
            "name": "x",
            "nested": { "tags": ["a", "b"] }
        });

        walk_leaves(&mut value, &mut |leaf| {
            if let Some(s) = leaf.as_str() {
                *leaf = Value::String(s.to_uppercase());
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(
            value,
            json!({ "name": "X", "nested": { "tags": ["A", "B"] } })
        );
    }

    #[test]
    fn test_containers_are_never_handed_to_the_handler() {
        let mut value = json!({ "a": { "b": [1] } });

        walk_leaves(&mut value, &mut |leaf| {
            assert!(!leaf.is_object() && !leaf.is_array());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_scalar_root_is_a_leaf() {
        let mut value = json!("->users");
        walk_leaves(&mut value, &mut |leaf| {
            *leaf = json!(42);
            Ok(())
        })
        .unwrap();
        assert_eq!(value, json!(42));
    }
}
