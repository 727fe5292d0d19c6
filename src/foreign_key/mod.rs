//! Foreign-key placeholder parsing and row-value extraction.
//!
//! A foreign-key placeholder has the shape `->table:mode:field:where` after
//! the configurable leader. Every segment but the table name is optional:
//! an omitted or empty mode means `random`, an omitted field means the
//! target table's identifier field, and a `where` segment names a field on
//! the current record whose value selects a reduced view of the target.

use crate::error::{SeedError, SeedResult};
use serde_json::Value;

/// Sampling mode of a foreign-key reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Independent uniform draw, with replacement.
    Random,
    /// Without-replacement draw from a per-record shuffle.
    Next,
    /// The row chosen by the previous `next` on the same table.
    Curr,
}

/// A parsed foreign-key placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct FkRef {
    /// Target table name.
    pub table: String,
    /// Sampling mode.
    pub mode: Mode,
    /// Field to copy from the chosen row; the target's key field when absent.
    pub field: Option<String>,
    /// Field on the current record whose value filters the target table.
    pub where_field: Option<String>,
}

impl FkRef {
    /// Parses the body of a placeholder. `placeholder` is the full leaf text
    /// including the leader; it is carried into error messages verbatim.
    pub fn parse(placeholder: &str, leader: &str) -> SeedResult<Self> {
        let body = &placeholder[leader.len()..];
        let mut parts = body.split(':');

        let table = parts.next().unwrap_or("").to_string();
        let mode = match parts.next() {
            None | Some("") | Some("random") => Mode::Random,
            Some("next") => Mode::Next,
            Some("curr") => Mode::Curr,
            Some(_) => return Err(SeedError::InvalidMode(placeholder.to_string())),
        };
        let field = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        let where_field = parts.next().filter(|s| !s.is_empty()).map(str::to_string);

        Ok(Self {
            table,
            mode,
            field,
            where_field,
        })
    }
}

/// Dotted-path lookup into a row: `foo.bar` descends objects and numeric
/// segments index arrays (`baz.0.bar`). Returns `None` when any segment is
/// missing, which resolution maps to JSON `null` rather than an error.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::{get_path, FkRef, Mode};
    use crate::error::SeedError;
    use serde_json::json;

    #[test]
    fn test_parse_table_only() {
        let fk = FkRef::parse("->users", "->").unwrap();
        assert_eq!(fk.table, "users");
        assert_eq!(fk.mode, Mode::Random);
        assert_eq!(fk.field, None);
        assert_eq!(fk.where_field, None);
    }

    #[test]
    fn test_parse_empty_mode_means_random() {
        let fk = FkRef::parse("->users:", "->").unwrap();
        assert_eq!(fk.mode, Mode::Random);

        let fk = FkRef::parse("->users::name", "->").unwrap();
        assert_eq!(fk.mode, Mode::Random);
        assert_eq!(fk.field.as_deref(), Some("name"));
    }

    #[test]
    fn test_parse_modes_field_and_where() {
        let fk = FkRef::parse("->users:next:foo.bar", "->").unwrap();
        assert_eq!(fk.mode, Mode::Next);
        assert_eq!(fk.field.as_deref(), Some("foo.bar"));

        let fk = FkRef::parse("->items:curr:id:type", "->").unwrap();
        assert_eq!(fk.mode, Mode::Curr);
        assert_eq!(fk.field.as_deref(), Some("id"));
        assert_eq!(fk.where_field.as_deref(), Some("type"));
    }

    #[test]
    fn test_parse_trailing_empty_segments() {
        let fk = FkRef::parse("->users:random:", "->").unwrap();
        assert_eq!(fk.mode, Mode::Random);
        assert_eq!(fk.field, None);
    }

    #[test]
    fn test_parse_invalid_mode() {
        let err = FkRef::parse("->users:bogus", "->").unwrap_err();
        assert!(matches!(err, SeedError::InvalidMode(ph) if ph == "->users:bogus"));
    }

    #[test]
    fn test_parse_custom_leader() {
        let fk = FkRef::parse("@@users:next", "@@").unwrap();
        assert_eq!(fk.table, "users");
        assert_eq!(fk.mode, Mode::Next);
    }

    #[test]
    fn test_get_path() {
        let row = json!({ "id": 1, "foo": { "bar": "a1" }, "baz": [{ "bar": "a2" }] });

        assert_eq!(get_path(&row, "id"), Some(&json!(1)));
        assert_eq!(get_path(&row, "foo.bar"), Some(&json!("a1")));
        assert_eq!(get_path(&row, "baz.0.bar"), Some(&json!("a2")));
        assert_eq!(get_path(&row, "missing"), None);
        assert_eq!(get_path(&row, "foo.bar.deeper"), None);
        assert_eq!(get_path(&row, "baz.7"), None);
        assert_eq!(get_path(&row, "baz.x"), None);
    }
}
