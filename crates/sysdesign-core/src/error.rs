use thiserror::Error;

/// Which half of a profile an override addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideKind {
    Toggle,
    Param,
}

impl std::fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toggle => f.write_str("toggle"),
            Self::Param => f.write_str("param"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SizingError {
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    #[error("Unknown {kind} override: {key}")]
    UnknownOverrideKey { kind: OverrideKind, key: String },
}

impl SizingError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SizingError>;
