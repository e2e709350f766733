//! Secret value handling.
//!
//! Secrets enter kumo as opaque strings (environment overlays or programmatic
//! injection) and must never leak through logs or debug output. The
//! [`SecretString`] wrapper renders as `***REDACTED***` everywhere except the
//! explicit [`SecretString::expose`] accessor, which exists so the plan
//! generator can hand the value to the engine under its `$secret` tag.

use std::fmt;

/// Replacement text used wherever a secret would otherwise be printed.
pub const REDACTED: &str = "***REDACTED***";

/// An owned secret value with a redacting `Debug` and `Display`.
///
/// # Examples
///
/// ```
/// use kumo::secret::SecretString;
///
/// let secret = SecretString::new("hunter2");
/// assert_eq!(format!("{secret:?}"), "SecretString(***REDACTED***)");
/// assert_eq!(secret.expose(), "hunter2");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the inner value.
    ///
    /// Call sites of this method are the audit surface for secret handling;
    /// keep them few.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString({REDACTED})")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
