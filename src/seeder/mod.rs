//! Dataset orchestration.
//!
//! [`seed`] drives table and record iteration: it registers every declared
//! table, resets the sampling session before each record, and walks each
//! record twice, a foreign-key pass followed by an expression pass, so
//! expressions always see foreign keys already resolved to concrete values.
//! The dataset is mutated in place; a failure aborts the run and leaves it
//! partially mutated.

use std::collections::{HashMap, HashSet};
use std::mem;

use log::{debug, trace};
use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Map, Value};

use crate::error::{SeedError, SeedResult};
use crate::expression::ast::Value as ExprValue;
use crate::expression::interpreter::{builtin_functions, ContextFunction, Interpreter};
use crate::expression::parser::ExpressionParser;
use crate::foreign_key::{get_path, FkRef, Mode};
use crate::ordering::field_order;
use crate::registry::{TableInfo, TableRegistry};
use crate::walker::walk_leaves;

/// A dataset: table name to rows, in declaration order.
pub type Dataset = Map<String, Value>;

/// Options for [`seed`].
///
/// Defaults match the conventional placeholder syntax: `->` for foreign
/// keys, `=>` for expressions, sampling random.
pub struct SeedOptions {
    /// Prefix marking foreign-key placeholders.
    pub fk_leader: String,
    /// Prefix marking expression placeholders.
    pub exp_leader: String,
    /// Deterministic round-robin sampling: cursors persist across records
    /// and keys are never shuffled, so output is reproducible.
    pub test_mode_index: bool,
    context_values: HashMap<String, Value>,
    context_functions: HashMap<String, ContextFunction>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            fk_leader: "->".to_string(),
            exp_leader: "=>".to_string(),
            test_mode_index: false,
            context_values: HashMap::new(),
            context_functions: HashMap::new(),
        }
    }
}

impl SeedOptions {
    /// Creates options with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the foreign-key leader.
    pub fn fk_leader(mut self, leader: &str) -> Self {
        self.fk_leader = leader.to_string();
        self
    }

    /// Sets the expression leader.
    pub fn exp_leader(mut self, leader: &str) -> Self {
        self.exp_leader = leader.to_string();
        self
    }

    /// Enables or disables deterministic round-robin sampling.
    pub fn test_mode_index(mut self, enabled: bool) -> Self {
        self.test_mode_index = enabled;
        self
    }

    /// Adds a value to the shared expression context, readable as
    /// `ctx.<name>`.
    pub fn context_value(mut self, name: &str, value: Value) -> Self {
        self.context_values.insert(name.to_string(), value);
        self
    }

    /// Registers a function callable from expressions as `ctx.<name>(...)`.
    /// The closure may carry mutable state; it persists for the whole run.
    pub fn context_fn(mut self, name: &str, function: ContextFunction) -> Self {
        self.context_functions.insert(name.to_string(), function);
        self
    }
}

/// Which placeholder kind a walk resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    ForeignKey,
    Expression,
}

/// Resolves every placeholder in `data`, mutating it in place.
///
/// Only entries whose value is a JSON array are treated as tables; other
/// entries are left untouched. Tables resolve in declaration order, except
/// that a table referenced by a `where` placeholder before its own turn is
/// resolved on demand.
pub fn seed(data: &mut Dataset, options: SeedOptions) -> SeedResult<()> {
    // Leaders must be disjoint so a leaf can match at most one resolver.
    if options.fk_leader.starts_with(&options.exp_leader)
        || options.exp_leader.starts_with(&options.fk_leader)
    {
        return Err(SeedError::LeaderOverlap(
            options.fk_leader,
            options.exp_leader,
        ));
    }

    let SeedOptions {
        fk_leader,
        exp_leader,
        test_mode_index,
        context_values,
        context_functions,
    } = options;

    let mut functions = builtin_functions();
    functions.extend(context_functions);

    let mut engine = Engine {
        data,
        registry: TableRegistry::new(),
        fk_leader,
        exp_leader,
        test_mode: test_mode_index,
        context_values,
        functions,
        parser: ExpressionParser::new(),
        rng: rand::thread_rng(),
        resolved: HashSet::new(),
        in_progress: HashSet::new(),
        record_index: 0,
    };

    engine.register_tables();

    let names: Vec<String> = engine.data.keys().cloned().collect();
    for name in &names {
        engine.resolve_table(name)?;
    }

    Ok(())
}

struct Engine<'a> {
    data: &'a mut Dataset,
    registry: TableRegistry,
    fk_leader: String,
    exp_leader: String,
    test_mode: bool,
    context_values: HashMap<String, Value>,
    functions: HashMap<String, ContextFunction>,
    parser: ExpressionParser,
    rng: ThreadRng,
    /// Tables whose every record has been fully resolved.
    resolved: HashSet<String>,
    /// Tables currently mid-resolution, for cycle detection.
    in_progress: HashSet<String>,
    /// 0-based position of the record being resolved, exposed as `ctx.index`.
    record_index: usize,
}

impl Engine<'_> {
    fn register_tables(&mut self) {
        let mut count = 0;
        for (name, value) in self.data.iter() {
            if let Some(rows) = value.as_array() {
                self.registry.register(name, rows);
                count += 1;
            }
        }
        debug!("registered {} tables", count);
    }

    /// Resolves every record of one table.
    fn resolve_table(&mut self, name: &str) -> SeedResult<()> {
        // Non-array dataset entries are not tables.
        if !self.registry.contains(name) || self.resolved.contains(name) {
            return Ok(());
        }
        self.in_progress.insert(name.to_string());
        debug!("resolving table '{}'", name);

        let len = self
            .data
            .get(name)
            .and_then(Value::as_array)
            .map(|rows| rows.len())
            .unwrap_or(0);

        // Building a reduced view mid-record can resolve another table and
        // overwrite this; keep the caller's position intact.
        let saved_index = self.record_index;

        for index in 0..len {
            // Detach the record so resolvers can read the rest of the dataset
            // while the record is rewritten.
            let record = match self.data.get_mut(name).and_then(Value::as_array_mut) {
                Some(rows) => mem::replace(&mut rows[index], Value::Null),
                None => break,
            };

            self.record_index = index;
            self.registry.reset_session(self.test_mode);

            let result = self.resolve_record(record);
            let (record, outcome) = match result {
                Ok(record) => (record, Ok(())),
                Err((record, err)) => (record, Err(err)),
            };

            if let Some(rows) = self.data.get_mut(name).and_then(Value::as_array_mut) {
                rows[index] = record;
            }
            outcome?;
        }

        self.record_index = saved_index;
        self.in_progress.remove(name);
        self.resolved.insert(name.to_string());
        Ok(())
    }

    /// Resolves one detached record: foreign-key pass, then expression pass,
    /// fields visited in classified order within each pass. Returns the
    /// record alongside any error so the caller can reattach it either way.
    fn resolve_record(&mut self, mut record: Value) -> Result<Value, (Value, SeedError)> {
        let order = record
            .as_object()
            .map(|map| field_order(map, &self.fk_leader, &self.exp_leader));

        let result = match &order {
            Some(order) => self
                .field_pass(&mut record, order, Pass::ForeignKey)
                .and_then(|_| self.field_pass(&mut record, order, Pass::Expression)),
            None => {
                // A table of scalar rows: the record itself is the leaf tree.
                let empty = Value::Object(Map::new());
                self.walk_pass(&mut record, &empty, Pass::ForeignKey)
                    .and_then(|_| self.walk_pass(&mut record, &empty, Pass::Expression))
            }
        };

        match result {
            Ok(()) => Ok(record),
            Err(err) => Err((record, err)),
        }
    }

    /// Runs one pass over the record's fields in the given order, detaching
    /// each field so the rest of the record stays readable for `where`
    /// lookups and `rec` bindings.
    fn field_pass(&mut self, record: &mut Value, order: &[String], pass: Pass) -> SeedResult<()> {
        for name in order {
            let mut field = match record.as_object_mut().and_then(|map| map.get_mut(name)) {
                Some(slot) => mem::take(slot),
                None => continue,
            };

            let result = self.walk_pass(&mut field, record, pass);

            if let Some(slot) = record.as_object_mut().and_then(|map| map.get_mut(name)) {
                *slot = field;
            }
            result?;
        }
        Ok(())
    }

    /// Walks one value, resolving every leaf that carries this pass's leader.
    fn walk_pass(&mut self, value: &mut Value, record: &Value, pass: Pass) -> SeedResult<()> {
        walk_leaves(value, &mut |leaf| {
            let text = match leaf.as_str() {
                Some(text) => text,
                None => return Ok(()),
            };

            let replacement = match pass {
                Pass::ForeignKey if text.starts_with(&self.fk_leader) => {
                    let placeholder = text.to_string();
                    self.resolve_fk(&placeholder, record)?
                }
                Pass::Expression if text.starts_with(&self.exp_leader) => {
                    let placeholder = text.to_string();
                    self.resolve_expression(&placeholder, record)?
                }
                _ => return Ok(()),
            };

            *leaf = replacement;
            Ok(())
        })
    }

    /// Resolves one foreign-key placeholder to a concrete value.
    fn resolve_fk(&mut self, placeholder: &str, record: &Value) -> SeedResult<Value> {
        let fk = FkRef::parse(placeholder, &self.fk_leader)?;
        trace!("resolving foreign key {:?}", placeholder);

        let target = match &fk.where_field {
            Some(where_field) => {
                let match_value = record
                    .as_object()
                    .and_then(|map| map.get(where_field))
                    .cloned()
                    .ok_or_else(|| SeedError::MissingWhereField(placeholder.to_string()))?;
                self.reduced_view(&fk.table, where_field, &match_value, placeholder)?
            }
            None => fk.table.clone(),
        };

        let (len, shuffled, cursor, key_name) = {
            let info = self
                .registry
                .get(&target)
                .ok_or_else(|| SeedError::TableNotFound(placeholder.to_string()))?;
            (info.len(), info.shuffled, info.cursor, info.key_name.clone())
        };

        if len == 0 {
            return Err(SeedError::EmptyTable(placeholder.to_string()));
        }

        let position = match fk.mode {
            Mode::Random => {
                if self.test_mode {
                    self.registry
                        .advance(&target)
                        .ok_or_else(|| SeedError::EmptyTable(placeholder.to_string()))?
                } else {
                    self.rng.gen_range(0..len)
                }
            }
            Mode::Next => {
                if !shuffled && !self.test_mode {
                    if let Some(info) = self.registry.get_mut(&target) {
                        info.keys.shuffle(&mut self.rng);
                        info.cursor = -1;
                    }
                }
                if let Some(info) = self.registry.get_mut(&target) {
                    info.shuffled = true;
                }
                self.registry
                    .advance(&target)
                    .ok_or_else(|| SeedError::EmptyTable(placeholder.to_string()))?
            }
            Mode::Curr => {
                if !shuffled {
                    return Err(SeedError::NoPriorNext(placeholder.to_string()));
                }
                cursor as usize
            }
        };

        let field = fk.field.as_deref().unwrap_or(&key_name);
        let row = self
            .target_row(&target, position)
            .ok_or_else(|| SeedError::TableNotFound(placeholder.to_string()))?;
        let value = get_path(row, field).cloned().unwrap_or(Value::Null);

        trace!("{} -> row position {} field '{}'", placeholder, position, field);
        Ok(value)
    }

    /// The row a key-list position points at.
    fn target_row(&self, name: &str, position: usize) -> Option<&Value> {
        let info = self.registry.get(name)?;
        let row_index = *info.keys.get(position)?;
        self.data.get(&info.source)?.as_array()?.get(row_index)
    }

    /// Returns the synthetic name of the reduced view of `base` filtered by
    /// `where_field == match_value`, building and registering it on first
    /// use. Building requires the base table to be fully resolved, which may
    /// recursively resolve it here; a cycle fails fast.
    fn reduced_view(
        &mut self,
        base: &str,
        where_field: &str,
        match_value: &Value,
        placeholder: &str,
    ) -> SeedResult<String> {
        let name = format!("{}_{}", base, where_field);
        if self.registry.contains(&name) {
            return Ok(name);
        }
        if !self.registry.contains(base) {
            return Err(SeedError::TableNotFound(placeholder.to_string()));
        }

        if self.in_progress.contains(base) {
            return Err(SeedError::CircularReference(placeholder.to_string()));
        }
        if !self.resolved.contains(base) {
            self.resolve_table(base)?;
        }

        let (keys, total) = {
            let rows = self
                .data
                .get(base)
                .and_then(Value::as_array)
                .ok_or_else(|| SeedError::TableNotFound(placeholder.to_string()))?;
            let keys: Vec<usize> = rows
                .iter()
                .enumerate()
                .filter(|(_, row)| row.get(where_field) == Some(match_value))
                .map(|(index, _)| index)
                .collect();
            (keys, rows.len())
        };

        debug!("built reduced view '{}' ({} of {} rows)", name, keys.len(), total);

        let key_name = self
            .registry
            .get(base)
            .map(|info| info.key_name.clone())
            .unwrap_or_else(|| "_id".to_string());

        self.registry.register_view(
            &name,
            TableInfo {
                source: base.to_string(),
                key_name,
                keys,
                cursor: -1,
                shuffled: false,
            },
        );

        Ok(name)
    }

    /// Resolves one expression placeholder by parsing and evaluating its
    /// source against the `rec`/`ctx`/`data` bindings.
    fn resolve_expression(&mut self, placeholder: &str, record: &Value) -> SeedResult<Value> {
        let source = &placeholder[self.exp_leader.len()..];
        trace!("evaluating expression {:?}", source);

        let ast = self
            .parser
            .parse_expression(source)
            .map_err(|message| SeedError::Expression {
                expr: source.to_string(),
                message,
            })?;

        let variables = self.expression_bindings(record);
        let mut interpreter = Interpreter::new(variables, &mut self.functions);
        let value = interpreter
            .evaluate(&ast)
            .map_err(|message| SeedError::Expression {
                expr: source.to_string(),
                message,
            })?;

        Ok(value.into())
    }

    /// Builds the named bindings for one expression evaluation.
    fn expression_bindings(&self, record: &Value) -> HashMap<String, ExprValue> {
        let mut ctx = Map::new();
        ctx.insert("index".to_string(), json!(self.record_index));
        ctx.insert("tables".to_string(), self.registry.metadata());
        for (name, value) in &self.context_values {
            ctx.insert(name.clone(), value.clone());
        }

        let mut variables = HashMap::new();
        variables.insert("rec".to_string(), ExprValue::from(record.clone()));
        variables.insert("ctx".to_string(), ExprValue::Object(ctx));
        variables.insert(
            "data".to_string(),
            ExprValue::Object(self.data.clone()),
        );
        variables
    }
}

#[cfg(test)]
mod tests {
    use super::{seed, Dataset, SeedOptions};
    use crate::error::SeedError;
    use serde_json::{json, Value};

    fn dataset(value: Value) -> Dataset {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object dataset, got {:?}", other),
        }
    }

    #[test]
    fn test_leader_overlap_is_rejected() {
        let mut data = dataset(json!({}));

        let err = seed(&mut data, SeedOptions::new().fk_leader("=").exp_leader("=>")).unwrap_err();
        assert!(matches!(err, SeedError::LeaderOverlap(_, _)));

        let err = seed(&mut data, SeedOptions::new().fk_leader("->").exp_leader("-")).unwrap_err();
        assert!(matches!(err, SeedError::LeaderOverlap(_, _)));
    }

    #[test]
    fn test_non_array_entries_are_left_untouched() {
        let mut data = dataset(json!({
            "meta": { "version": "->not a placeholder table" },
            "users": [{ "id": 1 }]
        }));

        seed(&mut data, SeedOptions::new()).unwrap();
        assert_eq!(data["meta"], json!({ "version": "->not a placeholder table" }));
    }

    #[test]
    fn test_custom_leaders() {
        let mut data = dataset(json!({
            "users": [{ "id": 7 }],
            "posts": [{ "_id": 1, "userId": "@@users", "sum": "##1 + 2" }]
        }));

        let options = SeedOptions::new()
            .fk_leader("@@")
            .exp_leader("##")
            .test_mode_index(true);
        seed(&mut data, options).unwrap();

        assert_eq!(data["posts"][0]["userId"], json!(7));
        assert_eq!(data["posts"][0]["sum"], json!(3.0));
    }

    #[test]
    fn test_scalar_rows_resolve() {
        let mut data = dataset(json!({
            "users": [{ "id": 1 }, { "id": 2 }],
            "ids": ["->users:next", "->users:next"]
        }));

        seed(&mut data, SeedOptions::new().test_mode_index(true)).unwrap();
        assert_eq!(data["ids"], json!([1, 2]));
    }
}
