//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`SlingError`]
//! via `From`. Adapters box their errors into [`SlingError::Storage`].

/// Top-level error for slingwatch operations.
#[derive(Debug, thiserror::Error)]
pub enum SlingError {
    /// A value failed validation.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A strict lookup did not find what it was asked for.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A registry or configuration invariant was broken.
    #[error("invariant violated")]
    Invariant(#[from] InvariantError),

    /// The persisted snapshot could not be encoded or decoded.
    #[error("snapshot error")]
    Snapshot(#[from] serde_json::Error),

    /// A persistence adapter failed.
    #[error("storage error")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

impl SlingError {
    /// Whether this error must stop the console ingest loop.
    ///
    /// Broken invariants and strict lookups of unknown boxes are caller-level
    /// bugs; continuing would apply commands to the wrong state.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Invariant(_) | Self::NotFound(_))
    }
}

/// Validation failures on domain values.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A box name was empty or whitespace only.
    #[error("box name must not be empty")]
    EmptyBoxName,

    /// A remote-control code mapping is missing a required key.
    #[error("remote code `{0}` is missing")]
    MissingRemoteCode(&'static str),

    /// A remote-control code is not a non-negative integer.
    #[error("remote code `{key}` has invalid value `{value}`")]
    InvalidRemoteCode {
        /// Mapping key (`Ch+`, `Ch-` or `Last`).
        key: &'static str,
        /// Offending value.
        value: String,
    },

    /// Two remote-control commands share the same code.
    #[error("remote code {0} is assigned to more than one command")]
    DuplicateRemoteCode(u32),

    /// A snapshot document does not have the expected shape.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(&'static str),

    /// A snapshot heartbeat is not a `yyyy-MM-ddTHH:mm:ss` timestamp.
    #[error("invalid heartbeat timestamp `{0}`")]
    InvalidTimestamp(String),
}

/// Returned by strict lookups when the requested item does not exist.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    /// Kind of thing looked up (e.g. `"SlingBox"`).
    pub entity: &'static str,
    /// Identifier that was requested.
    pub id: String,
}

/// Fatal integrity violations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvariantError {
    /// A box with this name is already registered.
    #[error("box `{name}` is already registered")]
    DuplicateBox {
        /// Name announced twice.
        name: String,
    },

    /// A command type outside the known set reached the interpreter.
    #[error("unexpected remote control command type {0}, expected 0 (up), 1 (down), 2 (change) or 3 (last)")]
    UnknownCommandType(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_treat_invariant_errors_as_fatal() {
        let err = SlingError::from(InvariantError::DuplicateBox {
            name: "sb1".to_string(),
        });
        assert!(err.is_fatal());
    }

    #[test]
    fn should_treat_strict_lookup_miss_as_fatal() {
        let err = SlingError::from(NotFoundError {
            entity: "SlingBox",
            id: "ghost".to_string(),
        });
        assert!(err.is_fatal());
    }

    #[test]
    fn should_not_treat_storage_errors_as_fatal() {
        let io = std::io::Error::other("disk full");
        let err = SlingError::Storage(Box::new(io));
        assert!(!err.is_fatal());
    }

    #[test]
    fn should_render_not_found_message() {
        let err = NotFoundError {
            entity: "SlingBox",
            id: "sb9".to_string(),
        };
        assert_eq!(err.to_string(), "SlingBox `sb9` not found");
    }
}
