//! `Definition` — a named error schema with typed default fields.

use crate::field::{Field, FieldKey, FieldType, FieldValue};
use crate::kind::Kind;
use crate::unmarshaled::{ErrorParts, UnmarshaledError};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

struct Inner {
    kind: Kind,
    fields: IndexMap<FieldKey, FieldValue>,
    parent: Option<Definition>,
}

/// An error schema: a [`Kind`] plus a set of typed fields with declared
/// defaults.
///
/// Definitions are shared by reference (`Clone` is an `Arc` bump). Identity
/// matters: [`Definition::is_a`] and [`UnmarshaledError::is`] compare
/// definitions by pointer, not by kind string.
#[derive(Clone)]
pub struct Definition(Arc<Inner>);

impl Definition {
    /// Start declaring a new root definition.
    pub fn builder(kind: impl Into<Kind>) -> DefinitionBuilder {
        DefinitionBuilder {
            kind: kind.into(),
            fields: IndexMap::new(),
            parent: None,
        }
    }

    /// Start declaring a definition derived from this one. The child inherits
    /// every field default and answers `is_a(parent)` with `true`.
    pub fn derive(&self, kind: impl Into<Kind>) -> DefinitionBuilder {
        DefinitionBuilder {
            kind: kind.into(),
            fields: self.0.fields.clone(),
            parent: Some(self.clone()),
        }
    }

    pub fn kind(&self) -> &Kind {
        &self.0.kind
    }

    pub fn parent(&self) -> Option<&Definition> {
        self.0.parent.as_ref()
    }

    /// Declared fields and their defaults, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldKey, &FieldValue)> {
        self.0.fields.iter()
    }

    /// All declared keys with the given display name. Several keys may share
    /// a name when they differ in type.
    pub fn keys_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldKey> + 'a {
        self.0.fields.keys().filter(move |k| k.name() == name)
    }

    /// The declared default for `key`, if this definition declares it.
    pub fn default_value(&self, key: &FieldKey) -> Option<&FieldValue> {
        self.0.fields.get(key)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Definition) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns `true` if `self` is `ancestor` or was derived from it.
    pub fn is_a(&self, ancestor: &Definition) -> bool {
        let mut current = Some(self);
        while let Some(def) = current {
            if def.ptr_eq(ancestor) {
                return true;
            }
            current = def.parent();
        }
        false
    }

    /// Build a trace-free error instance: no stack, no causes, the declared
    /// defaults overridden by `overrides`.
    pub fn new_error(
        &self,
        message: impl Into<String>,
        overrides: impl IntoIterator<Item = (FieldKey, FieldValue)>,
    ) -> UnmarshaledError {
        let mut fields = self.0.fields.clone();
        for (key, value) in overrides {
            fields.insert(key, value);
        }
        let mut parts = ErrorParts::new(self.clone(), message);
        parts.fields = fields;
        UnmarshaledError::from_parts(parts)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("kind", &self.0.kind)
            .field("fields", &self.0.fields.keys().collect::<Vec<_>>())
            .field("parent", &self.parent().map(|p| p.kind()))
            .finish()
    }
}

/// Builder returned by [`Definition::builder`] and [`Definition::derive`].
pub struct DefinitionBuilder {
    kind: Kind,
    fields: IndexMap<FieldKey, FieldValue>,
    parent: Option<Definition>,
}

impl DefinitionBuilder {
    /// Declare a field with its default value.
    pub fn field<T: FieldType>(mut self, field: &Field<T>, default: T) -> Self {
        let (key, value) = field.value(default);
        self.fields.insert(key, value);
        self
    }

    /// Declare a field from an already type-erased pair.
    pub fn field_value(mut self, key: FieldKey, default: FieldValue) -> Self {
        self.fields.insert(key, default);
        self
    }

    pub fn build(self) -> Definition {
        Definition(Arc::new(Inner {
            kind: self.kind,
            fields: self.fields,
            parent: self.parent,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declined() -> (Definition, Field<u64>, Field<String>) {
        let amount = Field::<u64>::new("amount");
        let currency = Field::<String>::new("currency");
        let def = Definition::builder("payments.declined")
            .field(&amount, 0)
            .field(&currency, "USD".to_string())
            .build();
        (def, amount, currency)
    }

    #[test]
    fn defaults_and_lookup() {
        let (def, amount, _) = declined();
        assert_eq!(def.kind(), &Kind::from_static("payments.declined"));
        assert_eq!(def.keys_named("amount").count(), 1);
        assert_eq!(def.keys_named("missing").count(), 0);
        assert_eq!(
            def.default_value(&amount.key()).and_then(|v| v.downcast_ref::<u64>()),
            Some(&0)
        );
    }

    #[test]
    fn derived_definitions_inherit_and_are_a() {
        let (base, amount, _) = declined();
        let fraud = base.derive("payments.declined.fraud").build();
        assert!(fraud.is_a(&base));
        assert!(!base.is_a(&fraud));
        assert!(fraud.default_value(&amount.key()).is_some());

        let lookalike = Definition::builder("payments.declined").build();
        assert!(!lookalike.is_a(&base));
    }

    #[test]
    fn new_error_applies_overrides() {
        let (def, amount, currency) = declined();
        let err = def.new_error("card declined", [amount.value(1200)]);
        assert_eq!(err.to_string(), "card declined");
        assert_eq!(err.get(&amount), Some(&1200));
        assert_eq!(err.get(&currency).map(String::as_str), Some("USD"));
        assert!(err.stack().is_empty());
        assert!(err.causes().is_empty());
    }
}
