//! Error types for the errwire pipeline.

use thiserror::Error;

/// Errors produced by a [`Decoder`](crate::Decoder) while turning raw input
/// into a [`DecodedRepresentation`](crate::DecodedRepresentation).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed {format} payload: {reason}")]
    Malformed { format: &'static str, reason: String },

    #[error("Payload is missing the required '{field}' member")]
    MissingField { field: &'static str },

    #[error("Invalid payload shape: {0}")]
    Shape(#[from] ShapeError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A decoded payload does not have the shape of an error payload.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("'{member}' must be {expected}, got {got}")]
pub struct ShapeError {
    pub member: String,
    pub expected: &'static str,
    pub got: &'static str,
}

/// Errors from unmarshaling a decoded payload into a typed error tree.
#[derive(Debug, Error)]
pub enum UnmarshalError {
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Unknown error kind '{kind}'")]
    UnknownKind { kind: String },

    #[error("Unknown field '{field}' for kind '{kind}'")]
    UnknownField { kind: String, field: String },

    #[error("Malformed cause payload: {0}")]
    MalformedCause(#[source] ShapeError),

    #[error("Field '{field}' could not be rebuilt as {type_name}: {source}")]
    Reconstruction {
        field: String,
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl UnmarshalError {
    /// Internal failures signal a broken payload contract. They always
    /// propagate and are never downgraded to an unknown cause.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::MalformedCause(_) | Self::Reconstruction { .. })
    }
}

/// Errors raised while building an unmarshaler configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Sentinel error ({type_name}, \"{message}\") is registered twice")]
    DuplicateSentinel { type_name: String, message: String },
}

/// Errors from loading a definition catalogue.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Unsupported field type '{ty}' for field '{field}' of kind '{kind}'")]
    UnsupportedType { kind: String, field: String, ty: String },

    #[error("Invalid default for field '{field}' of kind '{kind}': {source}")]
    InvalidDefault {
        kind: String,
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Kind '{kind}' derives from unknown parent '{parent}'")]
    UnknownParent { kind: String, parent: String },

    #[error("Kind '{kind}' is declared twice")]
    DuplicateKind { kind: String },

    #[error("Catalogue parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_classification() {
        let shape = ShapeError {
            member: "causes[0]".into(),
            expected: "a map",
            got: "number",
        };
        assert!(UnmarshalError::MalformedCause(shape).is_internal());
        assert!(!UnmarshalError::UnknownKind { kind: "x".into() }.is_internal());
        assert!(!UnmarshalError::UnknownField {
            kind: "x".into(),
            field: "y".into()
        }
        .is_internal());
    }

    #[test]
    fn shape_error_message() {
        let e = ShapeError {
            member: "stack".into(),
            expected: "a sequence",
            got: "string",
        };
        assert_eq!(e.to_string(), "'stack' must be a sequence, got string");
    }
}
