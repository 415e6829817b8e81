//! Core type definitions for DataOrbit: column types, values, and rows.

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Largest integer an `f64` represents exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;
const MAX_EXACT_KEY: u64 = 1 << 53;

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// UTF-8 text.
    Text,
    /// A number (stored as `f64`).
    Number,
    /// A filesystem path, stored as text in the data file.
    Path,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "Text",
            Self::Number => "Number",
            Self::Path => "Path",
        };
        f.write_str(name)
    }
}

/// A single cell value.
///
/// Numbers compare and hash by bit pattern, with `-0.0` treated as `0.0`,
/// so that they can live in the constraint index.
#[derive(Debug, Clone)]
pub enum Value {
    /// Text value.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// Path value.
    Path(PathBuf),
}

impl Value {
    /// Returns the column type this value belongs to.
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Text(_) => ColumnType::Text,
            Self::Number(_) => ColumnType::Number,
            Self::Path(_) => ColumnType::Path,
        }
    }

    /// Returns the text, if this is a `Text` value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number, if this is a `Number` value.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the path, if this is a `Path` value.
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }

    /// Interprets the value as a non-negative integer key.
    ///
    /// Whole numbers and text holding a decimal integer qualify. Used to
    /// reseed the key allocator after a reload.
    #[must_use]
    pub fn as_integer_key(&self) -> Option<u64> {
        match self {
            Self::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= MAX_EXACT_INTEGER => {
                Some(*n as u64)
            }
            Self::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Builds the value for an auto-assigned key in a column of type `ty`.
    ///
    /// Returns `None` for `Path` columns, which cannot hold generated keys,
    /// and for `Number` keys past 2^53, which an `f64` cannot hold exactly.
    #[must_use]
    pub fn from_generated_key(key: u64, ty: ColumnType) -> Option<Self> {
        match ty {
            ColumnType::Number if key <= MAX_EXACT_KEY => Some(Self::Number(key as f64)),
            ColumnType::Number => None,
            ColumnType::Text => Some(Self::Text(key.to_string())),
            ColumnType::Path => None,
        }
    }

    /// Converts a JSON value read from the data file into a typed value.
    ///
    /// # Errors
    ///
    /// Returns a description of the mismatch if `json` does not fit `ty`.
    pub fn from_json(json: &serde_json::Value, ty: ColumnType) -> Result<Self, String> {
        match (ty, json) {
            (ColumnType::Text, serde_json::Value::String(s)) => Ok(Self::Text(s.clone())),
            (ColumnType::Path, serde_json::Value::String(s)) => Ok(Self::Path(PathBuf::from(s))),
            (ColumnType::Number, serde_json::Value::Number(n)) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| format!("number {n} is out of range")),
            (ty, other) => Err(format!("expected {ty}, found {}", json_kind(other))),
        }
    }

    /// Converts the value to JSON, writing whole numbers without a fraction.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Path(p) => serde_json::Value::String(p.to_string_lossy().into_owned()),
            Self::Number(n) => match whole_number(*n) {
                Some(i) => serde_json::Value::from(i),
                None => serde_json::Number::from_f64(*n)
                    .map_or(serde_json::Value::Null, serde_json::Value::Number),
            },
        }
    }

    /// Infers a column type from a JSON value, for tables without a schema.
    #[must_use]
    pub fn infer_type(json: &serde_json::Value) -> Option<ColumnType> {
        match json {
            serde_json::Value::String(_) => Some(ColumnType::Text),
            serde_json::Value::Number(_) => Some(ColumnType::Number),
            _ => None,
        }
    }

    fn normalized_bits(n: f64) -> u64 {
        if n == 0.0 {
            0.0f64.to_bits()
        } else {
            n.to_bits()
        }
    }
}

fn whole_number(n: f64) -> Option<i64> {
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER {
        Some(n as i64)
    } else {
        None
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Path(a), Self::Path(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => {
                Self::normalized_bits(*a) == Self::normalized_bits(*b)
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Text(s) => s.hash(state),
            Self::Path(p) => p.hash(state),
            Self::Number(n) => Self::normalized_bits(*n).hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Path(p) => write!(f, "{:?}", p.display().to_string()),
            Self::Number(n) => match whole_number(*n) {
                Some(i) => write!(f, "{i}"),
                None => write!(f, "{n}"),
            },
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Path(p) => serializer.serialize_str(&p.to_string_lossy()),
            Self::Number(n) if !n.is_finite() => Err(S::Error::custom(format!(
                "number {n} has no JSON representation"
            ))),
            Self::Number(n) => match whole_number(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl From<&Path> for Value {
    fn from(p: &Path) -> Self {
        Self::Path(p.to_path_buf())
    }
}

/// A row: column name to value.
///
/// Columns are kept in name order; row order within a table is kept by the
/// table itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column, builder style.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    /// Sets a column, returning the previous value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(column.into(), value.into())
    }

    /// Returns a column's value.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Removes a column, returning its value.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    /// Returns true if the row has a value for `column`.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// Copies every column of `patch` into this row, overwriting existing
    /// values and keeping the rest.
    pub fn merge(&mut self, patch: &Row) {
        for (column, value) in &patch.0 {
            self.0.insert(column.clone(), value.clone());
        }
    }

    /// Iterates over `(column, value)` pairs in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the row to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn number_equality_ignores_zero_sign() {
        assert_eq!(Value::Number(0.0), Value::Number(-0.0));

        let mut set = HashSet::new();
        set.insert(Value::Number(0.0));
        assert!(set.contains(&Value::Number(-0.0)));
    }

    #[test]
    fn values_of_different_types_differ() {
        assert_ne!(Value::from("1"), Value::from(1));
        assert_ne!(Value::from("/tmp"), Value::from(PathBuf::from("/tmp")));
    }

    #[test]
    fn integer_keys() {
        assert_eq!(Value::from(7).as_integer_key(), Some(7));
        assert_eq!(Value::from("12").as_integer_key(), Some(12));
        assert_eq!(Value::from(1.5).as_integer_key(), None);
        assert_eq!(Value::from(-3).as_integer_key(), None);
        assert_eq!(Value::from("abc").as_integer_key(), None);
    }

    #[test]
    fn generated_keys_follow_column_type() {
        assert_eq!(
            Value::from_generated_key(3, ColumnType::Number),
            Some(Value::Number(3.0))
        );
        assert_eq!(
            Value::from_generated_key(3, ColumnType::Text),
            Some(Value::from("3"))
        );
        assert_eq!(Value::from_generated_key(3, ColumnType::Path), None);
    }

    #[test]
    fn generated_number_keys_stop_at_exact_range() {
        assert_eq!(
            Value::from_generated_key(1 << 53, ColumnType::Number),
            Some(Value::Number(9_007_199_254_740_992.0))
        );
        assert_eq!(
            Value::from_generated_key((1 << 53) + 1, ColumnType::Number),
            None
        );
        assert_eq!(
            Value::from_generated_key(u64::MAX, ColumnType::Text),
            Some(Value::from("18446744073709551615"))
        );
        assert_eq!(Value::from(1e300).as_integer_key(), None);
    }

    #[test]
    fn non_finite_numbers_do_not_serialize() {
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(serde_json::to_string(&Value::Number(n)).is_err());
        }
        assert_eq!(serde_json::to_string(&Value::Number(2.5)).unwrap(), "2.5");
    }

    #[test]
    fn from_json_checks_type() {
        assert_eq!(
            Value::from_json(&json!("x"), ColumnType::Path).unwrap(),
            Value::Path(PathBuf::from("x"))
        );
        assert_eq!(
            Value::from_json(&json!(30), ColumnType::Number).unwrap(),
            Value::Number(30.0)
        );
        let err = Value::from_json(&json!(true), ColumnType::Text).unwrap_err();
        assert_eq!(err, "expected Text, found boolean");
    }

    #[test]
    fn whole_numbers_serialize_without_fraction() {
        assert_eq!(serde_json::to_string(&Value::from(30)).unwrap(), "30");
        assert_eq!(serde_json::to_string(&Value::from(10.99)).unwrap(), "10.99");
        assert_eq!(Value::from(30).to_json(), json!(30));
    }

    #[test]
    fn display() {
        assert_eq!(Value::from("John").to_string(), "\"John\"");
        assert_eq!(Value::from(30).to_string(), "30");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
    }

    #[test]
    fn row_merge_keeps_untouched_columns() {
        let mut row = Row::new().with("id", "1").with("name", "John").with("age", 30);
        row.merge(&Row::new().with("id", "1").with("age", 31));

        assert_eq!(row.get("name"), Some(&Value::from("John")));
        assert_eq!(row.get("age"), Some(&Value::from(31)));
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn row_serializes_as_object() {
        let row = Row::new().with("name", "John").with("age", 30);
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({"age": 30, "name": "John"})
        );
    }
}
