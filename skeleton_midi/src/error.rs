//! Error types for mapping and recording playback.

use thiserror::Error;

use crate::pose::Arm;

/// Problems the mapper can report for a single user in a single frame.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MappingError {
    /// The arm's bone length is zero or not finite.  Expected on tracking
    /// loss; the arm is skipped for this frame.
    #[error("{arm:?} arm has degenerate length {length}")]
    DegenerateArmLength { arm: Arm, length: f32 },

    /// The caller asked for a user id outside the four user slots.  This
    /// is a contract violation by the caller.
    #[error("user id {user_id} has no slot (valid ids are 1–{slots})")]
    MissingUserSlot { user_id: u16, slots: usize },
}

/// Problems loading a [`MappingConfig`](crate::MappingConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Zero, negative or non-finite distances would never latch a clap.
    #[error("clap_distance must be a positive number, got {0}")]
    ClapDistance(f32),
}

/// Problems reading or writing a JSON-lines skeleton recording.
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Json {
        line:   usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("encoding frame: {0}")]
    Encode(#[source] serde_json::Error),
}
