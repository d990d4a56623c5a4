//!
//! Defines error types for the mutation gate.
//!
//! Only two things can go wrong: the policy cannot be built at startup, or the
//! external mutation engine fails on a fragment. The first halts the process
//! before any fragment is written; the second never leaves the gate.

/// Errors raised while building a `GateConfig`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A numeric override was not a non-negative integer.
    #[error("Invalid value for {key}: {value:?} is not a non-negative integer")]
    InvalidInteger { key: String, value: String },
    /// The seed override was neither `timestamp` nor a non-negative integer.
    ///
    /// Negative seeds are rejected rather than wrapped or sign-extended, so
    /// `-1` fails here instead of silently selecting some other seed.
    #[error("Invalid seed for {key}: {value:?} (expected \"timestamp\" or a non-negative integer)")]
    InvalidSeed { key: String, value: String },
    /// An override under the namespace was not valid Unicode.
    #[error("Invalid value for {key}: {value:?} is not valid Unicode")]
    NonUnicode { key: String, value: String },
    /// A policy file could not be read.
    #[error("Failed to read policy file {path}: {reason}")]
    Io { path: String, reason: String },
    /// A policy document was not valid JSON for `GateConfig`.
    #[error("Malformed policy document: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err.to_string())
    }
}

/// Errors reported by a `Mutator`. The gate recovers from all of them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// The mutation engine process could not be started.
    #[error("Failed to start mutation engine {program}: {reason}")]
    Spawn { program: String, reason: String },
    /// Feeding the fragment to, or reading the result from, the engine failed.
    #[error("Mutation engine I/O failed: {0}")]
    Io(String),
    /// The engine exited unsuccessfully.
    #[error("Mutation engine exited with status {status:?}: {stderr}")]
    Exit { status: Option<i32>, stderr: String },
    /// The engine panicked while mutating.
    #[error("Mutation engine panicked: {0}")]
    Panicked(String),
    /// Any other engine-specific failure.
    #[error("Mutation failed: {0}")]
    Other(String),
}
