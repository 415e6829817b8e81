//! JSON form of a dataset.
//!
//! A dataset serializes as a JSON object mapping table names to arrays of
//! row objects, pretty-printed with 4-space indentation:
//!
//! ```text
//! {
//!     "users": [
//!         {
//!             "age": 30,
//!             "id": "1",
//!             "name": "John"
//!         }
//!     ]
//! }
//! ```
//!
//! Row order inside each array is preserved exactly.

use crate::error::{CodecError, CodecResult};
use crate::obfuscate::ObfuscationKey;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// An untyped row as it appears in the file.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// An untyped dataset as it appears in the file.
pub type RawDataset = BTreeMap<String, Vec<RawRow>>;

/// Indentation used for the pretty-printed form.
const INDENT: &[u8] = b"    ";

/// Serializes a dataset to pretty-printed JSON bytes.
///
/// # Errors
///
/// Returns `SerializeFailed` if the value cannot be represented as JSON.
pub fn encode_dataset<T: Serialize + ?Sized>(dataset: &T) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    dataset
        .serialize(&mut serializer)
        .map_err(|e| CodecError::serialize_failed(e.to_string()))?;
    Ok(out)
}

/// Parses JSON bytes into a dataset.
///
/// # Errors
///
/// Returns `DeserializeFailed` if the bytes are not valid UTF-8 JSON of the
/// expected shape.
pub fn decode_dataset<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::deserialize_failed(e.to_string()))
}

/// Serializes and obfuscates a dataset, ready to be written to disk.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn seal<T: Serialize + ?Sized>(dataset: &T, key: &ObfuscationKey) -> CodecResult<Vec<u8>> {
    let mut bytes = encode_dataset(dataset)?;
    key.apply_in_place(&mut bytes);
    Ok(bytes)
}

/// Deobfuscates and parses bytes read from disk.
///
/// # Errors
///
/// Returns `DeserializeFailed` if the result is not a valid dataset, which
/// is also what a wrong key produces.
pub fn open<T: DeserializeOwned>(blob: &[u8], key: &ObfuscationKey) -> CodecResult<T> {
    let mut bytes = blob.to_vec();
    key.apply_in_place(&mut bytes);
    decode_dataset(&bytes)
}
