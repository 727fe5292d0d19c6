//! Per-record field classification.
//!
//! Expressions frequently read sibling fields that foreign-key resolution
//! just populated, so the engine processes a record's fields in a fixed
//! order: plain fields first, then foreign-key fields, then expression
//! fields, each group in declaration order. The engine additionally runs a
//! separate pass per placeholder kind, so the ordering here only has to make
//! `where` lookups between foreign-key fields well defined.

use serde_json::{Map, Value};

/// How a top-level record field participates in resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// No placeholder at the top level.
    Plain,
    /// A foreign-key placeholder string, or an array leading with one.
    ForeignKey,
    /// An expression placeholder string, or an array leading with one.
    Expression,
}

/// Classifies a field value. Arrays are inspected one level deep: an array
/// whose first element is a placeholder string classifies like that string,
/// supporting array-valued placeholder fields such as
/// `"userIds": ["->users:next", "->users:next"]`.
pub fn classify(value: &Value, fk_leader: &str, exp_leader: &str) -> FieldKind {
    match value {
        Value::String(s) => classify_str(s, fk_leader, exp_leader),
        Value::Array(items) => match items.first() {
            Some(Value::String(s)) => classify_str(s, fk_leader, exp_leader),
            _ => FieldKind::Plain,
        },
        _ => FieldKind::Plain,
    }
}

fn classify_str(s: &str, fk_leader: &str, exp_leader: &str) -> FieldKind {
    if s.starts_with(fk_leader) {
        FieldKind::ForeignKey
    } else if s.starts_with(exp_leader) {
        FieldKind::Expression
    } else {
        FieldKind::Plain
    }
}

/// Returns the record's field names ordered plain, then foreign-key, then
/// expression fields, each group keeping declaration order.
pub fn field_order(rec: &Map<String, Value>, fk_leader: &str, exp_leader: &str) -> Vec<String> {
    let mut plain = Vec::new();
    let mut foreign = Vec::new();
    let mut expressions = Vec::new();

    for (name, value) in rec {
        match classify(value, fk_leader, exp_leader) {
            FieldKind::Plain => plain.push(name.clone()),
            FieldKind::ForeignKey => foreign.push(name.clone()),
            FieldKind::Expression => expressions.push(name.clone()),
        }
    }

    plain.extend(foreign);
    plain.extend(expressions);
    plain
}

#[cfg(test)]
mod tests {
    use super::{classify, field_order, FieldKind};
    use serde_json::json;

    #[test]
    fn test_classify_strings() {
        assert_eq!(classify(&json!("->users"), "->", "=>"), FieldKind::ForeignKey);
        assert_eq!(classify(&json!("=>1 + 1"), "->", "=>"), FieldKind::Expression);
        assert_eq!(classify(&json!("plain"), "->", "=>"), FieldKind::Plain);
        assert_eq!(classify(&json!(7), "->", "=>"), FieldKind::Plain);
    }

    #[test]
    fn test_classify_checks_first_array_element() {
        assert_eq!(
            classify(&json!(["->users:next", "->users:next"]), "->", "=>"),
            FieldKind::ForeignKey
        );
        assert_eq!(classify(&json!(["=>ctx.foo()"]), "->", "=>"), FieldKind::Expression);
        assert_eq!(classify(&json!([1, "->users"]), "->", "=>"), FieldKind::Plain);
        assert_eq!(classify(&json!([]), "->", "=>"), FieldKind::Plain);
    }

    #[test]
    fn test_field_order_groups_and_keeps_declaration_order() {
        let rec = json!({
            "total": "=>rec.count + 1",
            "userId": "->users:next",
            "count": 3,
            "friendId": "->users:curr",
            "name": "aa"
        });

        let order = field_order(rec.as_object().unwrap(), "->", "=>");
        assert_eq!(order, vec!["count", "name", "userId", "friendId", "total"]);
    }
}
