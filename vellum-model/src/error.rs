use thiserror::Error;

/// Errors produced by model parsing and constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid {kind} id: '{value}'")]
    InvalidId { kind: &'static str, value: String },

    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
