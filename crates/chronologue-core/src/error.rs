/// Structural defect in a trace record. Reported per record, never fatal to a
/// batch. `Display` is the diagnostic naming the first violated rule.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Trace must be a JSON object")]
    NotAnObject,

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Importance must be a number (got {0})")]
    ImportanceNotNumeric(String),

    #[error("Importance must be between 0.0 and 1.0 (got {0})")]
    ImportanceOutOfRange(f64),

    #[error("Collaborators must be a list")]
    CollaboratorsNotList,

    #[error("Invalid completion_status: {0}")]
    InvalidCompletionStatus(String),

    #[error("Invalid visibility: {0}")]
    InvalidVisibility(String),

    #[error("linked_event_uid must be a string")]
    LinkedEventUidNotText,

    #[error("Embedding must be a list")]
    EmbeddingNotList,

    #[error("Malformed trace: {0}")]
    Malformed(String),
}

impl ValidationError {
    /// Short machine-readable name of the violated rule.
    pub fn rule(&self) -> &'static str {
        match self {
            Self::NotAnObject => "object",
            Self::MissingField(_) => "required_fields",
            Self::InvalidType(_) => "type",
            Self::InvalidTimestamp(_) => "timestamp",
            Self::ImportanceNotNumeric(_) | Self::ImportanceOutOfRange(_) => "importance",
            Self::CollaboratorsNotList => "collaborators",
            Self::InvalidCompletionStatus(_) => "completion_status",
            Self::InvalidVisibility(_) => "visibility",
            Self::LinkedEventUidNotText => "linked_event_uid",
            Self::EmbeddingNotList => "embedding",
            Self::Malformed(_) => "shape",
        }
    }
}

/// A validated trace that still lacks what the encoder needs. Only reachable
/// when the validator's required-field set has been loosened.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Missing field required for encoding: {0}")]
    MissingField(&'static str),

    /// UIDs are single content lines; a line break would split the block.
    #[error("Field {0} must not contain a line break")]
    LineBreak(&'static str),
}
