//! Repeating-key XOR obfuscation.
//!
//! This is a reversible byte transform that keeps casual readers from
//! seeing the data file as plain JSON. It is **not** encryption: anyone who
//! knows (or guesses) the key, or has a known plaintext, can undo it.

use crate::error::{CodecError, CodecResult};
use zeroize::Zeroizing;

/// Key for [`obfuscate`] and [`deobfuscate`].
///
/// Guaranteed non-empty. The key bytes are wiped from memory on drop and
/// never shown by `Debug`.
#[derive(Clone)]
pub struct ObfuscationKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl ObfuscationKey {
    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `EmptyKey` if `bytes` is empty.
    pub fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.is_empty() {
            return Err(CodecError::EmptyKey);
        }
        Ok(Self {
            bytes: Zeroizing::new(bytes.to_vec()),
        })
    }

    /// Creates a key from the UTF-8 bytes of a string.
    ///
    /// # Errors
    ///
    /// Returns `EmptyKey` if `key` is empty.
    pub fn new(key: &str) -> CodecResult<Self> {
        Self::from_bytes(key.as_bytes())
    }

    /// Returns the key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Applies the transform in place.
    pub fn apply_in_place(&self, data: &mut [u8]) {
        for (byte, k) in data.iter_mut().zip(self.bytes.iter().cycle()) {
            *byte ^= k;
        }
    }
}

impl std::fmt::Debug for ObfuscationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObfuscationKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Obfuscates `plaintext`: output byte `i` is `plaintext[i] ^ key[i % key.len()]`.
///
/// # Errors
///
/// Returns `EmptyKey` if `key` is empty.
pub fn obfuscate(plaintext: &[u8], key: &[u8]) -> CodecResult<Vec<u8>> {
    let key = ObfuscationKey::from_bytes(key)?;
    let mut out = plaintext.to_vec();
    key.apply_in_place(&mut out);
    Ok(out)
}

/// Reverses [`obfuscate`]. XOR is its own inverse, so this is the same
/// transform.
///
/// # Errors
///
/// Returns `EmptyKey` if `key` is empty.
pub fn deobfuscate(blob: &[u8], key: &[u8]) -> CodecResult<Vec<u8>> {
    obfuscate(blob, key)
}
