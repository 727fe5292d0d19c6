//! Per-table sampling state.
//!
//! The registry tracks one [`TableInfo`] per table name encountered during a
//! run, including synthetic reduced views. Declared tables are registered
//! eagerly before any record is walked; reduced views are added lazily the
//! first time a `where` placeholder needs them. The per-record sampling
//! session (`shuffled` flag, cursor) is reset through [`TableRegistry::reset_session`].

use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Sampling state for one table or reduced view.
#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    /// Table whose rows `keys` index into. For reduced views this is the
    /// base table; for declared tables it is the table itself.
    pub source: String,
    /// Identifier field: `"id"` if the first record has one, else `"_id"`.
    pub key_name: String,
    /// Row indices into `source`. Reduced views narrow this list without
    /// copying rows.
    pub keys: Vec<usize>,
    /// Round-robin cursor, -1 before the first draw.
    pub cursor: i64,
    /// Whether a `next` draw has shuffled this table during the current
    /// record's session.
    pub shuffled: bool,
}

impl TableInfo {
    /// Number of selectable rows.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the table has no selectable rows.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Registry of sampling state for every declared table and reduced view.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: HashMap<String, TableInfo>,
}

impl TableRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a declared table, deriving its identifier field from the
    /// first record and its key list from the row count.
    pub fn register(&mut self, name: &str, rows: &[Value]) {
        let key_name = rows
            .first()
            .and_then(Value::as_object)
            .map(|rec| if rec.contains_key("id") { "id" } else { "_id" })
            .unwrap_or("_id");

        debug!(
            "registered table '{}' ({} rows, key '{}')",
            name,
            rows.len(),
            key_name
        );

        self.tables.insert(
            name.to_string(),
            TableInfo {
                source: name.to_string(),
                key_name: key_name.to_string(),
                keys: (0..rows.len()).collect(),
                cursor: -1,
                shuffled: false,
            },
        );
    }

    /// Registers a reduced view under its synthetic name.
    pub fn register_view(&mut self, name: &str, info: TableInfo) {
        self.tables.insert(name.to_string(), info);
    }

    /// Whether a table or view is known under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Looks up the sampling state for `name`.
    pub fn get(&self, name: &str) -> Option<&TableInfo> {
        self.tables.get(name)
    }

    /// Mutable lookup of the sampling state for `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut TableInfo> {
        self.tables.get_mut(name)
    }

    /// Clears the per-record sampling session for every known table and
    /// view: the `shuffled` flag always, the cursor only outside
    /// deterministic mode, where round robin continues across records.
    pub fn reset_session(&mut self, test_mode: bool) {
        for info in self.tables.values_mut() {
            info.shuffled = false;
            if !test_mode {
                info.cursor = -1;
            }
        }
    }

    /// Advances the cursor of `name` one position, wrapping around the key
    /// list, and returns the new position. Callers must have excluded the
    /// empty-table case.
    pub fn advance(&mut self, name: &str) -> Option<usize> {
        let info = self.tables.get_mut(name)?;
        let len = info.keys.len() as i64;
        if len == 0 {
            return None;
        }
        info.cursor = (info.cursor + 1) % len;
        Some(info.cursor as usize)
    }

    /// Snapshot of every table's sampling metadata, exposed to expressions
    /// as `ctx.tables`.
    pub fn metadata(&self) -> Value {
        let mut map = Map::new();
        for (name, info) in &self.tables {
            let value = serde_json::to_value(info).unwrap_or(Value::Null);
            map.insert(name.clone(), value);
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::TableRegistry;
    use serde_json::json;

    #[test]
    fn test_register_derives_key_name() {
        let mut registry = TableRegistry::new();
        registry.register("users", json!([{ "id": 1 }, { "id": 2 }]).as_array().unwrap());
        registry.register("posts", json!([{ "_id": 11 }]).as_array().unwrap());
        registry.register("empty", &[]);

        assert_eq!(registry.get("users").unwrap().key_name, "id");
        assert_eq!(registry.get("users").unwrap().keys, vec![0, 1]);
        assert_eq!(registry.get("posts").unwrap().key_name, "_id");
        assert_eq!(registry.get("empty").unwrap().key_name, "_id");
        assert!(registry.get("empty").unwrap().is_empty());
    }

    #[test]
    fn test_advance_wraps_around() {
        let mut registry = TableRegistry::new();
        registry.register("users", json!([{ "id": 1 }, { "id": 2 }]).as_array().unwrap());

        assert_eq!(registry.advance("users"), Some(0));
        assert_eq!(registry.advance("users"), Some(1));
        assert_eq!(registry.advance("users"), Some(0));
        assert_eq!(registry.advance("missing"), None);
    }

    #[test]
    fn test_reset_session_keeps_cursor_in_test_mode() {
        let mut registry = TableRegistry::new();
        registry.register("users", json!([{ "id": 1 }, { "id": 2 }]).as_array().unwrap());
        registry.advance("users");
        registry.get_mut("users").unwrap().shuffled = true;

        registry.reset_session(true);
        assert!(!registry.get("users").unwrap().shuffled);
        assert_eq!(registry.get("users").unwrap().cursor, 0);

        registry.reset_session(false);
        assert_eq!(registry.get("users").unwrap().cursor, -1);
    }
}
