//! # DataOrbit Codec
//!
//! Turns a dataset into the bytes stored on disk and back.
//!
//! Two layers:
//! - **Serialization**: the dataset as pretty-printed JSON (4-space indent)
//! - **Obfuscation**: a repeating-key XOR over those bytes
//!
//! The obfuscation layer is a reversible transform that hides the JSON from
//! casual inspection. It offers no confidentiality against anyone who tries.
//!
//! ## Usage
//!
//! ```
//! use dataorbit_codec::{obfuscate, deobfuscate};
//!
//! let blob = obfuscate(b"{\"users\": []}", b"mySecretKey").unwrap();
//! let plain = deobfuscate(&blob, b"mySecretKey").unwrap();
//! assert_eq!(plain, b"{\"users\": []}");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dataset;
mod error;
mod obfuscate;

pub use dataset::{decode_dataset, encode_dataset, open, seal, RawDataset, RawRow};
pub use error::{CodecError, CodecResult};
pub use obfuscate::{deobfuscate, obfuscate, ObfuscationKey};
