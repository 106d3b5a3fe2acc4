//! Resolver — maps wire kinds and field criteria to known definitions.

use crate::definition::Definition;
use crate::field::{FieldKey, FieldValue};
use crate::kind::Kind;
use std::collections::HashMap;

/// Trait for looking up definitions by kind or by a declared field default.
///
/// The `*_strict` methods report a miss as `None`. The non-strict methods
/// may substitute a fallback definition; by default they behave exactly like
/// their strict counterparts.
pub trait Resolver: Send + Sync {
    /// Look up the definition registered for `kind`.
    fn resolve_kind_strict(&self, kind: &str) -> Option<Definition>;

    /// First definition (in registration order) whose declared default for
    /// `key` equals `wanted`.
    fn resolve_field_strict(&self, key: &FieldKey, wanted: &FieldValue) -> Option<Definition> {
        self.resolve_field_strict_with(key, &|value: &FieldValue| value == wanted)
    }

    /// First definition (in registration order) whose declared default for
    /// `key` satisfies `predicate`.
    fn resolve_field_strict_with(
        &self,
        key: &FieldKey,
        predicate: &dyn Fn(&FieldValue) -> bool,
    ) -> Option<Definition>;

    fn resolve_kind(&self, kind: &str) -> Option<Definition> {
        self.resolve_kind_strict(kind)
    }

    fn resolve_field(&self, key: &FieldKey, wanted: &FieldValue) -> Option<Definition> {
        self.resolve_field_strict(key, wanted)
    }

    fn resolve_field_with(
        &self,
        key: &FieldKey,
        predicate: &dyn Fn(&FieldValue) -> bool,
    ) -> Option<Definition> {
        self.resolve_field_strict_with(key, predicate)
    }
}

// ─── Strict resolver ──────────────────────────────────────────────────────────

/// Registry of definitions keyed by kind. On a duplicate kind the first
/// registration wins.
#[derive(Debug, Clone, Default)]
pub struct StrictResolver {
    /// Registration order.
    definitions: Vec<Definition>,
    /// kind → index into `definitions`
    by_kind: HashMap<Kind, usize>,
}

impl StrictResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver from definitions in registration order.
    pub fn with_definitions(definitions: impl IntoIterator<Item = Definition>) -> Self {
        let mut resolver = Self::new();
        for def in definitions {
            resolver.register(def);
        }
        resolver
    }

    /// Register a definition. Returns `false` (and keeps the earlier entry)
    /// if the kind is already registered.
    pub fn register(&mut self, definition: Definition) -> bool {
        if self.by_kind.contains_key(definition.kind()) {
            return false;
        }
        self.by_kind
            .insert(definition.kind().clone(), self.definitions.len());
        self.definitions.push(definition);
        true
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Registered definitions in registration order.
    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }
}

impl Resolver for StrictResolver {
    fn resolve_kind_strict(&self, kind: &str) -> Option<Definition> {
        let idx = self.by_kind.get(kind)?;
        self.definitions.get(*idx).cloned()
    }

    fn resolve_field_strict_with(
        &self,
        key: &FieldKey,
        predicate: &dyn Fn(&FieldValue) -> bool,
    ) -> Option<Definition> {
        self.definitions
            .iter()
            .find(|def| def.default_value(key).is_some_and(predicate))
            .cloned()
    }
}

// ─── Fallback resolver ────────────────────────────────────────────────────────

/// A [`StrictResolver`] plus one designated default definition that
/// non-strict lookups return instead of "not found".
#[derive(Debug, Clone)]
pub struct DefaultResolver {
    strict: StrictResolver,
    default: Definition,
}

impl DefaultResolver {
    pub fn new(strict: StrictResolver, default: Definition) -> Self {
        Self { strict, default }
    }

    pub fn default_definition(&self) -> &Definition {
        &self.default
    }

    pub fn strict(&self) -> &StrictResolver {
        &self.strict
    }
}

impl Resolver for DefaultResolver {
    fn resolve_kind_strict(&self, kind: &str) -> Option<Definition> {
        self.strict.resolve_kind_strict(kind)
    }

    fn resolve_field_strict_with(
        &self,
        key: &FieldKey,
        predicate: &dyn Fn(&FieldValue) -> bool,
    ) -> Option<Definition> {
        self.strict.resolve_field_strict_with(key, predicate)
    }

    fn resolve_kind(&self, kind: &str) -> Option<Definition> {
        self.resolve_kind_strict(kind)
            .or_else(|| Some(self.default.clone()))
    }

    fn resolve_field(&self, key: &FieldKey, wanted: &FieldValue) -> Option<Definition> {
        self.resolve_field_strict(key, wanted)
            .or_else(|| Some(self.default.clone()))
    }

    fn resolve_field_with(
        &self,
        key: &FieldKey,
        predicate: &dyn Fn(&FieldValue) -> bool,
    ) -> Option<Definition> {
        self.resolve_field_strict_with(key, predicate)
            .or_else(|| Some(self.default.clone()))
    }
}
