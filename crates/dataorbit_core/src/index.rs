//! Constraint index for unique columns.
//!
//! The index is derived entirely from the rows in memory. It is rebuilt on
//! load and kept in step with every insert, edit, and delete.

use crate::schema::TableSchema;
use crate::types::{Row, Value};
use std::collections::{HashMap, HashSet};

/// Used values per unique column.
type ColumnSets = HashMap<String, HashSet<Value>>;

/// Tracks the values present in every unique column of every table.
///
/// The primary-key column is always tracked. Rows without a value in a
/// unique column contribute nothing for that column.
#[derive(Debug, Clone, Default)]
pub struct ConstraintIndex {
    tables: HashMap<String, ColumnSets>,
}

impl ConstraintIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the entries for `table` from its rows.
    ///
    /// Returns the first duplicate found as `(column, value)`, if the rows
    /// already violate a constraint. The index still holds every distinct
    /// value in that case.
    pub fn rebuild(
        &mut self,
        table: &str,
        schema: &TableSchema,
        rows: &[Row],
    ) -> Option<(String, Value)> {
        let mut sets = ColumnSets::new();
        let mut duplicate = None;
        for column in schema.unique_columns() {
            let set = sets.entry(column.to_string()).or_default();
            for row in rows {
                if let Some(value) = row.get(column) {
                    if !set.insert(value.clone()) && duplicate.is_none() {
                        duplicate = Some((column.to_string(), value.clone()));
                    }
                }
            }
        }
        self.tables.insert(table.to_string(), sets);
        duplicate
    }

    /// Adds the row's unique-column values.
    pub fn add(&mut self, table: &str, schema: &TableSchema, row: &Row) {
        let sets = self.tables.entry(table.to_string()).or_default();
        for column in schema.unique_columns() {
            if let Some(value) = row.get(column) {
                sets.entry(column.to_string())
                    .or_default()
                    .insert(value.clone());
            }
        }
    }

    /// Removes the row's unique-column values.
    pub fn remove(&mut self, table: &str, schema: &TableSchema, row: &Row) {
        let Some(sets) = self.tables.get_mut(table) else {
            return;
        };
        for column in schema.unique_columns() {
            if let (Some(value), Some(set)) = (row.get(column), sets.get_mut(column)) {
                set.remove(value);
            }
        }
    }

    /// Returns true if `value` is already used in `table.column`.
    #[must_use]
    pub fn contains(&self, table: &str, column: &str, value: &Value) -> bool {
        self.tables
            .get(table)
            .and_then(|sets| sets.get(column))
            .is_some_and(|set| set.contains(value))
    }

    /// Returns the first unique column of `row` whose value is taken.
    ///
    /// `ignore` is a row whose own values do not count as conflicts (the
    /// row being edited).
    #[must_use]
    pub fn find_conflict<'r>(
        &self,
        table: &str,
        schema: &TableSchema,
        row: &'r Row,
        ignore: Option<&Row>,
    ) -> Option<(&'r str, &'r Value)> {
        schema.unique_columns().into_iter().find_map(|column| {
            let (column, value) = row.iter().find(|(c, _)| *c == column)?;
            let own = ignore.and_then(|r| r.get(column)) == Some(value);
            (!own && self.contains(table, column, value)).then_some((column, value))
        })
    }

    /// Drops every entry for `table`.
    pub fn forget(&mut self, table: &str) {
        self.tables.remove(table);
    }

    /// Returns the number of values tracked for `table.column`.
    #[must_use]
    pub fn value_count(&self, table: &str, column: &str) -> usize {
        self.tables
            .get(table)
            .and_then(|sets| sets.get(column))
            .map_or(0, HashSet::len)
    }
}
