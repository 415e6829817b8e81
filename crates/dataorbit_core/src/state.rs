//! In-memory state of a store and its reconstruction from disk.

use crate::allocator::KeyAllocator;
use crate::error::{CoreError, CoreResult};
use crate::index::ConstraintIndex;
use crate::schema::TableSchema;
use crate::types::{ColumnType, Row, Value};
use dataorbit_codec::RawDataset;
use std::collections::BTreeMap;

/// Rows per table, in insertion order.
pub(crate) type Tables = BTreeMap<String, Vec<Row>>;

/// Everything a store owns, guarded as one unit by the store lock.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    /// Schemas of every known table (configured, created, or inferred).
    pub(crate) schemas: BTreeMap<String, TableSchema>,
    /// The dataset.
    pub(crate) tables: Tables,
    /// Primary-key counters.
    pub(crate) allocator: KeyAllocator,
    /// Used values of unique columns.
    pub(crate) index: ConstraintIndex,
}

impl StoreState {
    /// Creates an empty state knowing the configured schemas.
    pub(crate) fn new(schemas: BTreeMap<String, TableSchema>) -> Self {
        Self {
            schemas,
            ..Self::default()
        }
    }

    /// Builds the state from a dataset read from disk.
    ///
    /// Tables without a configured schema get one inferred from their rows.
    /// The constraint index is rebuilt and the key allocator is reseeded past
    /// the largest integer key of each table.
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` if a row does not fit its schema or lacks a
    /// primary key, and `UniqueConstraintViolation` if the file already holds
    /// duplicates.
    pub(crate) fn from_dataset(
        schemas: BTreeMap<String, TableSchema>,
        raw: &RawDataset,
    ) -> CoreResult<Self> {
        let mut state = Self::new(schemas);

        for (table, raw_rows) in raw {
            let schema = match state.schemas.get(table) {
                Some(schema) => schema.clone(),
                None => {
                    let inferred = TableSchema::infer(raw_rows);
                    tracing::debug!(table, "inferred schema for unconfigured table");
                    state.schemas.insert(table.clone(), inferred.clone());
                    inferred
                }
            };

            let pk = schema.primary_key_column();
            let mut rows = Vec::with_capacity(raw_rows.len());
            for raw_row in raw_rows {
                let row = schema.decode_row(table, raw_row)?;
                let Some(key) = row.get(pk) else {
                    return Err(CoreError::schema_violation(
                        table.as_str(),
                        pk,
                        "stored row has no primary key",
                    ));
                };
                if let Some(n) = key.as_integer_key() {
                    state.allocator.observe(table, n);
                }
                rows.push(row);
            }

            if let Some((column, value)) = state.index.rebuild(table, &schema, &rows) {
                return Err(CoreError::unique_violation(table.as_str(), column, value));
            }
            state.tables.insert(table.clone(), rows);
        }

        Ok(state)
    }

    /// Returns the schema for `table`.
    pub(crate) fn schema(&self, table: &str) -> CoreResult<&TableSchema> {
        self.schemas
            .get(table)
            .ok_or_else(|| CoreError::unknown_table(table))
    }

    /// Picks the key an insert without a primary key would receive.
    ///
    /// Keys already taken by explicitly supplied values are skipped. The
    /// returned key is only consumed once the caller claims it with
    /// `allocator.next_key` after a successful insert.
    ///
    /// Fails with `Configuration` for a `Path` primary key, and once the
    /// table has run out of keys its column type can represent.
    pub(crate) fn candidate_key(
        &mut self,
        table: &str,
        schema: &TableSchema,
    ) -> CoreResult<(u64, Value)> {
        let pk = schema.primary_key_column();
        let ty = schema.primary_key_type();
        if ty == ColumnType::Path {
            return Err(CoreError::configuration(format!(
                "table {table}: cannot generate keys for a Path primary key"
            )));
        }
        let exhausted =
            || CoreError::configuration(format!("table {table}: key space exhausted"));

        loop {
            let key = self.allocator.peek(table).ok_or_else(exhausted)?;
            let value = Value::from_generated_key(key, ty).ok_or_else(exhausted)?;
            if !self.index.contains(table, pk, &value) {
                return Ok((key, value));
            }
            self.allocator.observe(table, key);
        }
    }

    /// Returns the rows of `table`, or an empty slice.
    pub(crate) fn rows(&self, table: &str) -> &[Row] {
        self.tables.get(table).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawDataset {
        serde_json::from_value(value).unwrap()
    }

    fn users_schema() -> BTreeMap<String, TableSchema> {
        let mut schemas = BTreeMap::new();
        schemas.insert(
            "users".to_string(),
            TableSchema::new()
                .column("id", ColumnType::Number)
                .column("name", ColumnType::Text)
                .column("email", ColumnType::Text)
                .unique("email"),
        );
        schemas
    }

    #[test]
    fn reseeds_allocator_past_max_key() {
        let dataset = raw(json!({
            "users": [
                {"id": 3, "name": "a", "email": "a@x"},
                {"id": 7, "name": "b", "email": "b@x"}
            ]
        }));
        let mut state = StoreState::from_dataset(users_schema(), &dataset).unwrap();
        let schema = state.schema("users").unwrap().clone();

        let (key, value) = state.candidate_key("users", &schema).unwrap();
        assert_eq!(key, 8);
        assert_eq!(value, Value::from(8));
    }

    #[test]
    fn rebuilds_index() {
        let dataset = raw(json!({"users": [{"id": 1, "name": "a", "email": "a@x"}]}));
        let state = StoreState::from_dataset(users_schema(), &dataset).unwrap();

        assert!(state.index.contains("users", "email", &Value::from("a@x")));
        assert!(state.index.contains("users", "id", &Value::from(1)));
    }

    #[test]
    fn duplicate_in_file_is_rejected() {
        let dataset = raw(json!({
            "users": [
                {"id": 1, "name": "a", "email": "same@x"},
                {"id": 2, "name": "b", "email": "same@x"}
            ]
        }));
        let result = StoreState::from_dataset(users_schema(), &dataset);
        assert!(matches!(
            result,
            Err(CoreError::UniqueConstraintViolation { .. })
        ));
    }

    #[test]
    fn row_without_primary_key_is_rejected() {
        let dataset = raw(json!({"users": [{"name": "a"}]}));
        assert!(StoreState::from_dataset(users_schema(), &dataset).is_err());
    }

    #[test]
    fn unconfigured_table_gets_inferred_schema() {
        let dataset = raw(json!({"notes": [{"id": 1, "body": "hi"}]}));
        let state = StoreState::from_dataset(BTreeMap::new(), &dataset).unwrap();

        let schema = state.schema("notes").unwrap();
        assert_eq!(schema.column_type("body"), Some(ColumnType::Text));
        assert_eq!(state.rows("notes").len(), 1);
    }

    #[test]
    fn candidate_key_skips_taken_values() {
        let dataset = raw(json!({"users": [{"id": 1, "name": "a", "email": "a@x"}]}));
        let mut state = StoreState::from_dataset(users_schema(), &dataset).unwrap();
        // Simulate a counter that lags behind an explicit key.
        state.allocator.forget("users");
        let schema = state.schema("users").unwrap().clone();

        let (key, _) = state.candidate_key("users", &schema).unwrap();
        assert_eq!(key, 2);
    }

    #[test]
    fn candidate_key_errors_when_text_keys_are_exhausted() {
        let mut schemas = BTreeMap::new();
        schemas.insert(
            "tags".to_string(),
            TableSchema::new().column("id", ColumnType::Text),
        );
        let dataset = raw(json!({"tags": [{"id": "18446744073709551615"}]}));
        let mut state = StoreState::from_dataset(schemas, &dataset).unwrap();
        let schema = state.schema("tags").unwrap().clone();

        assert!(matches!(
            state.candidate_key("tags", &schema),
            Err(CoreError::Configuration { .. })
        ));
    }

    #[test]
    fn candidate_key_errors_past_exact_number_range() {
        let dataset = raw(json!({
            "users": [{"id": 9_007_199_254_740_992u64, "name": "a", "email": "a@x"}]
        }));
        let mut state = StoreState::from_dataset(users_schema(), &dataset).unwrap();
        let schema = state.schema("users").unwrap().clone();

        assert!(matches!(
            state.candidate_key("users", &schema),
            Err(CoreError::Configuration { .. })
        ));
    }

    #[test]
    fn unknown_table_schema() {
        let state = StoreState::new(BTreeMap::new());
        assert!(matches!(
            state.schema("nope"),
            Err(CoreError::UnknownTable { .. })
        ));
        assert!(state.rows("nope").is_empty());
    }
}
