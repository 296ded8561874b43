//! Checkpoint error types.

use thiserror::Error;

/// Errors that can occur during snapshot and restore operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Snapshot version is not supported by this version
    #[error("Unsupported snapshot version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// A snapshot references a state it does not list
    #[error("Snapshot references unknown state #{seq}")]
    UnknownState { seq: u32 },

    /// No guard is bound to a guarded transition's label
    #[error("No guard bound for transition '{label}'")]
    UnboundGuard { label: String },

    /// Several different guards are bound to the same label
    #[error("Label '{label}' is bound to more than one guard")]
    AmbiguousGuard { label: String },

    #[error("Snapshot I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
