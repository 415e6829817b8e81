//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data that fits the
//! schemas it is generated for.

use dataorbit_core::{ColumnType, Row, TableSchema, Value};
use proptest::prelude::*;
use std::path::PathBuf;

/// Strategy for generating valid table and column names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating text values, including non-ASCII text.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 @._\\-éü漢]{0,24}").expect("Invalid regex")
}

/// Strategy for generating numbers that survive a JSON round trip exactly:
/// integers and quarter fractions.
pub fn number_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-1_000_000_000i64..1_000_000_000).prop_map(|n| n as f64),
        (-4_000i32..4_000).prop_map(|n| f64::from(n) / 4.0),
    ]
}

/// Strategy for generating absolute Unix-style paths.
pub fn path_strategy() -> impl Strategy<Value = PathBuf> {
    prop::string::string_regex("(/[a-z0-9_]{1,8}){1,4}(\\.[a-z]{2,4})?")
        .expect("Invalid regex")
        .prop_map(PathBuf::from)
}

/// Strategy for generating a value of the given column type.
pub fn value_strategy(ty: ColumnType) -> BoxedStrategy<Value> {
    match ty {
        ColumnType::Text => text_strategy().prop_map(Value::Text).boxed(),
        ColumnType::Number => number_strategy().prop_map(Value::Number).boxed(),
        ColumnType::Path => path_strategy().prop_map(Value::Path).boxed(),
    }
}

/// Strategy for generating column types.
pub fn column_type_strategy() -> impl Strategy<Value = ColumnType> {
    prop_oneof![
        Just(ColumnType::Text),
        Just(ColumnType::Number),
        Just(ColumnType::Path),
    ]
}

/// Strategy for generating schemas with an implicit numeric `id` key and
/// up to six other columns, some of them unique.
pub fn schema_strategy() -> impl Strategy<Value = TableSchema> {
    prop::collection::btree_map(
        name_strategy().prop_filter("id is the primary key", |n| n != "id"),
        (column_type_strategy(), any::<bool>()),
        0..6,
    )
    .prop_map(|columns| {
        columns
            .into_iter()
            .fold(TableSchema::new(), |schema, (name, (ty, unique))| {
                let schema = schema.column(name.clone(), ty);
                if unique {
                    schema.unique(name)
                } else {
                    schema
                }
            })
    })
}

/// Strategy for generating rows that fit `schema`, without the primary key.
///
/// Each column is present or absent independently.
pub fn row_strategy(schema: &TableSchema) -> impl Strategy<Value = Row> {
    let pk = schema.primary_key_column().to_string();
    let columns: Vec<_> = schema
        .columns()
        .iter()
        .filter(|(name, _)| **name != pk)
        .map(|(name, ty)| {
            let name = name.clone();
            prop::option::of(value_strategy(*ty)).prop_map(move |v| (name.clone(), v))
        })
        .collect();

    columns.prop_map(|cells| {
        cells
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect::<Row>()
    })
}

/// An operation against the fixture `accounts` table.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Insert an account; the email comes from a small pool so collisions
    /// happen.
    Insert {
        /// Account name.
        name: String,
        /// Account email.
        email: String,
    },
    /// Delete by primary key.
    Delete {
        /// Primary key.
        key: u64,
    },
    /// Change an account's email.
    Edit {
        /// Primary key.
        key: u64,
        /// New email.
        email: String,
    },
    /// Look up by primary key.
    Get {
        /// Primary key.
        key: u64,
    },
}

/// Strategy for generating emails from a pool of `pool` addresses.
pub fn email_strategy(pool: u32) -> impl Strategy<Value = String> {
    (0..pool).prop_map(|n| format!("user{n}@example.com"))
}

/// Strategy for generating store operations.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        4 => (text_strategy(), email_strategy(12))
            .prop_map(|(name, email)| StoreOperation::Insert { name, email }),
        1 => (1u64..16).prop_map(|key| StoreOperation::Delete { key }),
        2 => (1u64..16, email_strategy(12))
            .prop_map(|(key, email)| StoreOperation::Edit { key, email }),
        2 => (1u64..16).prop_map(|key| StoreOperation::Get { key }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    ///
    /// Every case of a store property writes files, so this is what the
    /// store tests use.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
