use thiserror::Error;

/// Errors that can arise while driving the progression engine or its stores.
#[derive(Debug, Error)]
pub enum GameError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around JSON serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// No quest is currently in progress.
    #[error("no active quest")]
    NoActiveQuest,

    /// A proof submission for the active quest is already awaiting judgement.
    #[error("a submission is already being verified")]
    SubmissionInFlight,

    /// The active quest already has a result; retry or pick another quest.
    #[error("quest already resolved")]
    QuestResolved,

    /// Proof arrived after a timed quest's deadline; the quest is now failed.
    #[error("Time ran out! You were too slow.")]
    TimeRanOut,

    /// Quest id is not on the board.
    #[error("unknown quest: {0}")]
    UnknownQuest(String),

    /// User-initiated Oracle request failed.
    #[error("The Oracle is confused. Try again.")]
    OracleConfused,

    /// Rejected user input (blank prompt, bad email, short password).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Bad credentials or duplicate registration.
    #[error("{0}")]
    Auth(String),

    /// Internal error (hashing failures, unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure reported by a content generator. Always absorbed or mapped by the engine.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generator disabled")]
    Disabled,

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<serde_json::Error> for GeneratorError {
    fn from(err: serde_json::Error) -> Self {
        GeneratorError::InvalidResponse(err.to_string())
    }
}
