//! Property store errors.

use super::value::ValueKind;

/// Errors from defining or assigning properties.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    #[error("property `{0}` is not defined")]
    Undefined(String),
    #[error("property `{0}` is already defined")]
    AlreadyDefined(String),
    #[error("property `{name}` holds {expected} values, got {found}")]
    TypeMismatch {
        name: String,
        expected: ValueKind,
        found: ValueKind,
    },
}
