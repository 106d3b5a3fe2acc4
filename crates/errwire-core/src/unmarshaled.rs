//! The reconstructed error tree.

use crate::decoded::Frame;
use crate::definition::Definition;
use crate::field::{Field, FieldKey, FieldType, FieldValue};
use crate::kind::Kind;
use crate::raw::RawValue;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

// ─── Sentinel ─────────────────────────────────────────────────────────────────

/// A pre-existing canonical error instance, matched during cause
/// reconstruction by `(type_name, message)`.
///
/// Cloning shares the same instance; [`Sentinel::ptr_eq`] tests identity.
#[derive(Clone)]
pub struct Sentinel {
    type_name: Cow<'static, str>,
    error: Arc<dyn Error + Send + Sync>,
}

impl Sentinel {
    /// Wrap an error, naming its origin type after the Rust type.
    pub fn new<E: Error + Send + Sync + 'static>(error: E) -> Self {
        Self {
            type_name: Cow::Borrowed(std::any::type_name::<E>()),
            error: Arc::new(error),
        }
    }

    /// Wrap an error under an explicit origin type name.
    pub fn named<E: Error + Send + Sync + 'static>(
        type_name: impl Into<Cow<'static, str>>,
        error: E,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            error: Arc::new(error),
        }
    }

    /// Wrap an already shared error instance, keeping its identity.
    pub fn from_arc(
        type_name: impl Into<Cow<'static, str>>,
        error: Arc<dyn Error + Send + Sync>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            error,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub fn error(&self) -> &Arc<dyn Error + Send + Sync> {
        &self.error
    }

    /// Identity comparison of the wrapped instances.
    pub fn ptr_eq(&self, other: &Sentinel) -> bool {
        Arc::ptr_eq(&self.error, &other.error)
    }
}

impl fmt::Debug for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sentinel")
            .field("type_name", &self.type_name)
            .field("message", &self.error.to_string())
            .finish()
    }
}

// ─── UnknownCause ─────────────────────────────────────────────────────────────

/// Synthetic leaf for a cause whose kind could not be resolved or whose
/// origin type is foreign. Keeps everything the payload carried so the cause
/// re-encodes without loss.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownCause {
    pub message: String,
    pub type_name: String,
    /// Wire kind, when the payload named one that did not resolve.
    pub kind: Option<String>,
    pub fields: IndexMap<String, RawValue>,
    pub stack: Vec<Frame>,
    pub causes: Vec<Cause>,
}

impl fmt::Display for UnknownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for UnknownCause {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.causes.first().map(|c| c as &(dyn Error + 'static))
    }
}

// ─── Cause ────────────────────────────────────────────────────────────────────

/// One wrapped cause of an [`UnmarshaledError`].
#[derive(Debug, Clone)]
pub enum Cause {
    /// A cause whose kind resolved to a known definition.
    Error(UnmarshaledError),
    /// A registered canonical instance (identity preserved).
    Sentinel(Sentinel),
    /// A cause that could not be matched to a schema or sentinel.
    Unknown(UnknownCause),
}

impl Cause {
    pub fn message(&self) -> Cow<'_, str> {
        match self {
            Self::Error(e) => Cow::Borrowed(e.message()),
            Self::Sentinel(s) => Cow::Owned(s.message()),
            Self::Unknown(u) => Cow::Borrowed(&u.message),
        }
    }

    /// Nested causes; sentinels have none.
    pub fn causes(&self) -> &[Cause] {
        match self {
            Self::Error(e) => e.causes(),
            Self::Sentinel(_) => &[],
            Self::Unknown(u) => &u.causes,
        }
    }

    pub fn as_error(&self) -> Option<&UnmarshaledError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_sentinel(&self) -> Option<&Sentinel> {
        match self {
            Self::Sentinel(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_unknown(&self) -> Option<&UnknownCause> {
        match self {
            Self::Unknown(u) => Some(u),
            _ => None,
        }
    }

    /// Returns `true` if this cause is exactly the given sentinel instance.
    pub fn is_sentinel(&self, sentinel: &Sentinel) -> bool {
        self.as_sentinel().is_some_and(|s| s.ptr_eq(sentinel))
    }
}

impl PartialEq for Cause {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Error(a), Self::Error(b)) => a == b,
            (Self::Sentinel(a), Self::Sentinel(b)) => a.ptr_eq(b),
            (Self::Unknown(a), Self::Unknown(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl Error for Cause {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Error(e) => e.source(),
            Self::Sentinel(s) => s.error.source(),
            Self::Unknown(u) => u.source(),
        }
    }
}

// ─── UnmarshaledError ─────────────────────────────────────────────────────────

/// The pieces an [`UnmarshaledError`] is assembled from.
#[derive(Debug, Clone)]
pub struct ErrorParts {
    pub definition: Definition,
    pub message: String,
    pub fields: IndexMap<FieldKey, FieldValue>,
    pub unknown_fields: IndexMap<String, RawValue>,
    pub stack: Vec<Frame>,
    pub causes: Vec<Cause>,
    pub unresolved_kind: Option<String>,
}

impl ErrorParts {
    /// Parts with no fields, stack or causes.
    pub fn new(definition: Definition, message: impl Into<String>) -> Self {
        Self {
            definition,
            message: message.into(),
            fields: IndexMap::new(),
            unknown_fields: IndexMap::new(),
            stack: Vec::new(),
            causes: Vec::new(),
            unresolved_kind: None,
        }
    }
}

/// A typed, navigable error rebuilt from a wire payload (or built locally
/// through [`Definition::new_error`]).
#[derive(Debug, Clone)]
pub struct UnmarshaledError {
    definition: Definition,
    message: String,
    fields: IndexMap<FieldKey, FieldValue>,
    unknown_fields: IndexMap<String, RawValue>,
    stack: Arc<[Frame]>,
    causes: Vec<Cause>,
    unresolved_kind: Option<String>,
}

impl UnmarshaledError {
    pub fn from_parts(parts: ErrorParts) -> Self {
        Self {
            definition: parts.definition,
            message: parts.message,
            fields: parts.fields,
            unknown_fields: parts.unknown_fields,
            stack: parts.stack.into(),
            causes: parts.causes,
            unresolved_kind: parts.unresolved_kind,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Kind of the resolved definition. When a fallback definition was
    /// substituted this is the fallback's kind; see [`Self::unresolved_kind`].
    pub fn kind(&self) -> &Kind {
        self.definition.kind()
    }

    /// The wire kind that failed to resolve, when a fallback definition was
    /// substituted for it.
    pub fn unresolved_kind(&self) -> Option<&str> {
        self.unresolved_kind.as_deref()
    }

    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    /// Typed fields: coerced values plus declared defaults.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldKey, &FieldValue)> {
        self.fields.iter()
    }

    pub fn field_value(&self, key: &FieldKey) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Typed accessor.
    pub fn get<T: FieldType>(&self, field: &Field<T>) -> Option<&T> {
        self.fields.get(&field.key())?.downcast_ref::<T>()
    }

    /// Fields kept verbatim because they did not match the schema (or were
    /// redacted, or failed coercion).
    pub fn unknown_fields(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.unknown_fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Raw accessor for a field kept verbatim.
    pub fn raw_field(&self, name: &str) -> Option<&RawValue> {
        self.unknown_fields.get(name)
    }

    pub fn stack(&self) -> &[Frame] {
        &self.stack
    }

    /// Direct causes, in wire order.
    pub fn causes(&self) -> &[Cause] {
        &self.causes
    }

    /// Returns `true` if this error was built from `definition` or from a
    /// definition derived from it.
    pub fn is(&self, definition: &Definition) -> bool {
        self.definition.is_a(definition)
    }

    /// Render the stored frames in the usual `func\n\tfile:line` layout.
    /// A reconstructed error has no live call stack, so this is synthesized
    /// entirely from the wire frames.
    pub fn render_stack(&self) -> String {
        let mut out = String::new();
        for frame in self.stack.iter() {
            let _ = writeln!(out, "{frame}");
        }
        out
    }
}

impl PartialEq for UnmarshaledError {
    fn eq(&self, other: &Self) -> bool {
        self.definition.ptr_eq(&other.definition)
            && self.message == other.message
            && self.fields == other.fields
            && self.unknown_fields == other.unknown_fields
            && self.stack == other.stack
            && self.causes == other.causes
            && self.unresolved_kind == other.unresolved_kind
    }
}

impl fmt::Display for UnmarshaledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for UnmarshaledError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.causes.first().map(|c| c as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn def() -> Definition {
        Definition::builder("test.error").build()
    }

    #[test]
    fn source_walks_first_cause() {
        let eof = Sentinel::named("std::io::Error", io::Error::from(io::ErrorKind::UnexpectedEof));
        let mut parts = ErrorParts::new(def(), "outer");
        parts.causes = vec![Cause::Sentinel(eof.clone())];
        let err = UnmarshaledError::from_parts(parts);

        let source = err.source().unwrap();
        assert_eq!(source.to_string(), eof.message());
        assert!(err.causes()[0].is_sentinel(&eof));
    }

    #[test]
    fn sentinel_identity_is_per_instance() {
        let a = Sentinel::new(fmt::Error);
        let b = Sentinel::new(fmt::Error);
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
        assert!(a.type_name().ends_with("fmt::Error"));
    }

    #[test]
    fn render_stack_lists_frames() {
        let mut parts = ErrorParts::new(def(), "boom");
        parts.stack = vec![
            Frame { function: "inner".into(), file: "a.rs".into(), line: 3 },
            Frame { function: "outer".into(), file: "b.rs".into(), line: 9 },
        ];
        let err = UnmarshaledError::from_parts(parts);
        assert_eq!(err.render_stack(), "inner\n\ta.rs:3\nouter\n\tb.rs:9\n");
    }

    #[test]
    fn raw_field_accessor() {
        let mut parts = ErrorParts::new(def(), "boom");
        parts.unknown_fields.insert("token".into(), RawValue::redacted());
        let err = UnmarshaledError::from_parts(parts);
        assert_eq!(err.raw_field("token"), Some(&RawValue::redacted()));
        assert_eq!(err.unknown_fields().count(), 1);
    }
}
