//! Stable name derivation.
//!
//! This module provides the [`NameHasher`] type used to derive the suffix of
//! generated resource names from a SHA-256 digest of the stack and logical
//! names. Repeated applies of the same stack land on the same generated
//! name, so the engine can diff against the existing resource rather than
//! create a fresh one.
//!
//! # Examples
//!
//! ```
//! use kumo::hasher::NameHasher;
//!
//! let suffix = NameHasher::suffix("dev", "bootdiagnosticsstorage");
//! assert_eq!(suffix.len(), 8);
//! assert_eq!(suffix, NameHasher::suffix("dev", "bootdiagnosticsstorage"));
//! ```

use sha2::{Digest, Sha256};

/// Number of digest characters appended to generated names.
const SUFFIX_LEN: usize = 8;

/// Derives stable suffixes for generated resource names.
pub struct NameHasher;

impl NameHasher {
    /// Derive the suffix for `logical_name` within `stack`.
    ///
    /// The result is lowercase hexadecimal, safe for the strictest provider
    /// naming rules (lowercase alphanumeric only).
    #[must_use]
    pub fn suffix(stack: &str, logical_name: &str) -> String {
        let mut hasher = Sha256::new();
        Self::update_with_len(&mut hasher, stack.as_bytes());
        Self::update_with_len(&mut hasher, logical_name.as_bytes());
        format!("{:x}", hasher.finalize())
            .chars()
            .take(SUFFIX_LEN)
            .collect()
    }

    fn update_with_len(hasher: &mut Sha256, bytes: &[u8]) {
        let len = bytes.len();
        hasher.update(format!("{len}:").as_bytes());
        hasher.update(bytes);
    }
}
