//! Table schemas.
//!
//! A schema declares a table's columns and their types, which column is the
//! primary key, and which columns must hold unique values. The primary key
//! is always unique, whether or not it is listed.
//!
//! In JSON, columns are written flat next to the two reserved keys:
//!
//! ```text
//! {
//!     "id": "Text",
//!     "email": "Text",
//!     "age": "Number",
//!     "primaryKey": "id",
//!     "unique": ["email"]
//! }
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::{ColumnType, Row, Value};
use dataorbit_codec::RawRow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default primary-key column name.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

const PRIMARY_KEY_FIELD: &str = "primaryKey";
const UNIQUE_FIELD: &str = "unique";

/// Schema of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, serde_json::Value>")]
#[serde(into = "BTreeMap<String, serde_json::Value>")]
pub struct TableSchema {
    columns: BTreeMap<String, ColumnType>,
    primary_key: String,
    unique: BTreeSet<String>,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            columns: BTreeMap::new(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            unique: BTreeSet::new(),
        }
    }
}

impl TableSchema {
    /// Creates an empty schema with primary key `id`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a column.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.insert(name.into(), ty);
        self
    }

    /// Sets the primary-key column.
    #[must_use]
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    /// Marks a column as unique.
    #[must_use]
    pub fn unique(mut self, name: impl Into<String>) -> Self {
        self.unique.insert(name.into());
        self
    }

    /// Returns the primary-key column name.
    #[must_use]
    pub fn primary_key_column(&self) -> &str {
        &self.primary_key
    }

    /// Returns the type of the primary-key column.
    ///
    /// An undeclared primary-key column is treated as `Number`.
    #[must_use]
    pub fn primary_key_type(&self) -> ColumnType {
        self.columns
            .get(&self.primary_key)
            .copied()
            .unwrap_or(ColumnType::Number)
    }

    /// Returns the declared type of a column, counting the implicit primary
    /// key.
    #[must_use]
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        match self.columns.get(name) {
            Some(ty) => Some(*ty),
            None if name == self.primary_key => Some(ColumnType::Number),
            None => None,
        }
    }

    /// Returns the declared columns.
    #[must_use]
    pub fn columns(&self) -> &BTreeMap<String, ColumnType> {
        &self.columns
    }

    /// Returns every column whose values must be unique, primary key first.
    #[must_use]
    pub fn unique_columns(&self) -> Vec<&str> {
        let mut columns = vec![self.primary_key.as_str()];
        columns.extend(
            self.unique
                .iter()
                .map(String::as_str)
                .filter(|c| *c != self.primary_key),
        );
        columns
    }

    /// Returns true if `column` must hold unique values.
    #[must_use]
    pub fn is_unique(&self, column: &str) -> bool {
        column == self.primary_key || self.unique.contains(column)
    }

    /// Checks that the schema is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the primary key is empty or a `Path`
    /// column, or a unique column is not declared.
    pub fn validate(&self, table: &str) -> CoreResult<()> {
        if self.primary_key.is_empty() {
            return Err(CoreError::configuration(format!(
                "table {table}: primary key column name is empty"
            )));
        }
        if self.primary_key_type() == ColumnType::Path {
            return Err(CoreError::configuration(format!(
                "table {table}: primary key {} cannot be a Path column",
                self.primary_key
            )));
        }
        for column in &self.unique {
            if self.column_type(column).is_none() {
                return Err(CoreError::configuration(format!(
                    "table {table}: unique column {column} is not declared"
                )));
            }
        }
        Ok(())
    }

    /// Checks every value of `row` against the declared column types.
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` for an undeclared column, a value of the
    /// wrong type, or a NaN or infinite number.
    pub fn check_row(&self, table: &str, row: &Row) -> CoreResult<()> {
        for (column, value) in row.iter() {
            let Some(expected) = self.column_type(column) else {
                return Err(CoreError::schema_violation(
                    table,
                    column,
                    "column is not declared",
                ));
            };
            if value.column_type() != expected {
                return Err(CoreError::schema_violation(
                    table,
                    column,
                    format!("expected {expected}, found {}", value.column_type()),
                ));
            }
            if let Some(n) = value.as_number().filter(|n| !n.is_finite()) {
                return Err(CoreError::schema_violation(
                    table,
                    column,
                    format!("number {n} cannot be stored"),
                ));
            }
        }
        Ok(())
    }

    /// Converts an untyped row from the data file into a typed row.
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` if a column is undeclared or holds JSON of
    /// the wrong kind.
    pub fn decode_row(&self, table: &str, raw: &RawRow) -> CoreResult<Row> {
        let mut row = Row::new();
        for (column, json) in raw {
            let Some(ty) = self.column_type(column) else {
                return Err(CoreError::schema_violation(
                    table,
                    column,
                    "column is not declared",
                ));
            };
            let value = Value::from_json(json, ty)
                .map_err(|message| CoreError::schema_violation(table, column, message))?;
            row.set(column.clone(), value);
        }
        Ok(row)
    }

    /// Infers a schema from rows found in the data file for a table that has
    /// no configured schema. The primary key is `id`; nothing else is unique.
    #[must_use]
    pub fn infer(rows: &[RawRow]) -> Self {
        let mut schema = Self::new();
        for row in rows {
            for (column, json) in row {
                if schema.columns.contains_key(column) {
                    continue;
                }
                if let Some(ty) = Value::infer_type(json) {
                    schema.columns.insert(column.clone(), ty);
                }
            }
        }
        schema
    }
}

impl TryFrom<BTreeMap<String, serde_json::Value>> for TableSchema {
    type Error = String;

    fn try_from(fields: BTreeMap<String, serde_json::Value>) -> Result<Self, Self::Error> {
        let mut schema = Self::new();
        for (name, value) in fields {
            match name.as_str() {
                PRIMARY_KEY_FIELD => {
                    schema.primary_key = value
                        .as_str()
                        .ok_or("primaryKey must be a string")?
                        .to_string();
                }
                UNIQUE_FIELD => {
                    let list: Vec<String> = serde_json::from_value(value)
                        .map_err(|e| format!("unique must be a list of column names: {e}"))?;
                    schema.unique.extend(list);
                }
                _ => {
                    let ty: ColumnType = serde_json::from_value(value)
                        .map_err(|e| format!("column {name}: {e}"))?;
                    schema.columns.insert(name, ty);
                }
            }
        }
        Ok(schema)
    }
}

impl From<TableSchema> for BTreeMap<String, serde_json::Value> {
    fn from(schema: TableSchema) -> Self {
        let mut fields: Self = schema
            .columns
            .into_iter()
            .map(|(name, ty)| (name, serde_json::Value::String(ty.to_string())))
            .collect();
        if schema.primary_key != DEFAULT_PRIMARY_KEY {
            fields.insert(
                PRIMARY_KEY_FIELD.to_string(),
                serde_json::Value::String(schema.primary_key),
            );
        }
        if !schema.unique.is_empty() {
            fields.insert(
                UNIQUE_FIELD.to_string(),
                serde_json::Value::from(schema.unique.into_iter().collect::<Vec<_>>()),
            );
        }
        fields
    }
}
