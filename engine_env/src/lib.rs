#![forbid(unsafe_code)]

//! Shared environment constants used across kumo crates (library, tests, and
//! helpers).

/// Environment variable override for the orchestration engine executable.
///
/// # Examples
///
/// ```
/// use engine_env::ENGINE_ENV;
/// assert_eq!(ENGINE_ENV, "KUMO_ENGINE");
/// ```
pub const ENGINE_ENV: &str = "KUMO_ENGINE";

/// Default engine executable looked up on `PATH` when no override is set.
pub const DEFAULT_ENGINE: &str = "kumo-engine";
