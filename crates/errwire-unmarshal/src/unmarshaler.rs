//! `Unmarshaler` — turns decoded payloads into typed error trees.
//!
//! Per payload:
//! 1. Resolve the wire kind (strict, or through the resolver's fallback)
//! 2. Start from the definition's declared defaults
//! 3. Coerce each wire field against the keys declared under its name,
//!    then against the additional cross-cutting keys
//! 4. Rebuild each nested cause (see [`crate::cause`])
//! 5. Assemble the [`UnmarshaledError`]

use std::sync::Arc;

use errwire_core::{
    Cause, ConfigError, DecodedRepresentation, Decoder, Definition, ErrorParts, FieldKey,
    FieldValue, RawValue, Resolver, Sentinel, UnmarshalError, UnmarshaledError,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cause::reconstruct_cause;
use crate::coerce::{coerce, Coercion};
use crate::json::JsonDecoder;
use crate::sentinel::{standard_sentinels, SentinelRegistry};

/// Strictness toggles. Both default to lenient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnmarshalOptions {
    /// Fail with `UnknownKind` instead of consulting the resolver's fallback.
    pub strict_kinds: bool,
    /// Fail with `UnknownField` instead of keeping unmatched fields verbatim.
    pub strict_fields: bool,
}

// ─── Builder ──────────────────────────────────────────────────────────────────

/// Collects the configuration of an [`Unmarshaler`].
pub struct UnmarshalerBuilder {
    resolver: Arc<dyn Resolver>,
    decoder: Arc<dyn Decoder>,
    additional_keys: Vec<FieldKey>,
    sentinels: Vec<Sentinel>,
    options: UnmarshalOptions,
}

impl UnmarshalerBuilder {
    /// Start a configuration around `resolver`, decoding JSON by default.
    pub fn new<R: Resolver + 'static>(resolver: R) -> Self {
        Self::with_shared_resolver(Arc::new(resolver))
    }

    /// Start a configuration around an already shared resolver.
    pub fn with_shared_resolver(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver,
            decoder: Arc::new(JsonDecoder),
            additional_keys: Vec::new(),
            sentinels: Vec::new(),
            options: UnmarshalOptions::default(),
        }
    }

    /// Replace the wire-format decoder.
    pub fn decoder<D: Decoder + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Field keys recognized on every payload, whatever its definition.
    pub fn additional_field_keys(mut self, keys: impl IntoIterator<Item = FieldKey>) -> Self {
        self.additional_keys.extend(keys);
        self
    }

    /// Canonical instances restored by `(type_name, message)` when a leaf
    /// cause matches them.
    pub fn sentinel_errors(mut self, sentinels: impl IntoIterator<Item = Sentinel>) -> Self {
        self.sentinels.extend(sentinels);
        self
    }

    /// Register [`standard_sentinels`].
    pub fn standard_sentinel_errors(self) -> Self {
        self.sentinel_errors(standard_sentinels())
    }

    pub fn strict_kinds(mut self, strict: bool) -> Self {
        self.options.strict_kinds = strict;
        self
    }

    pub fn strict_fields(mut self, strict: bool) -> Self {
        self.options.strict_fields = strict;
        self
    }

    pub fn options(mut self, options: UnmarshalOptions) -> Self {
        self.options = options;
        self
    }

    /// Freeze the configuration. Fails if two sentinels share a
    /// `(type_name, message)` pair.
    pub fn build(self) -> Result<Unmarshaler, ConfigError> {
        let sentinels = SentinelRegistry::from_sentinels(self.sentinels)?;
        Ok(Unmarshaler {
            resolver: self.resolver,
            decoder: self.decoder,
            additional_keys: self.additional_keys,
            sentinels,
            options: self.options,
        })
    }
}

// ─── Unmarshaler ──────────────────────────────────────────────────────────────

/// Immutable reconstruction engine. Share it freely across threads; each call
/// builds an independent result tree.
///
/// # Usage
/// ```rust
/// use errwire_core::{Definition, Field, StrictResolver};
/// use errwire_unmarshal::Unmarshaler;
///
/// let amount = Field::<u64>::new("amount");
/// let declined = Definition::builder("payments.declined").field(&amount, 0).build();
///
/// let unmarshaler = Unmarshaler::builder(StrictResolver::with_definitions([declined.clone()]))
///     .build()
///     .unwrap();
/// let err = unmarshaler
///     .unmarshal(br#"{"message": "card declined", "kind": "payments.declined", "fields": {"amount": 1250}}"#)
///     .unwrap();
///
/// assert!(err.is(&declined));
/// assert_eq!(err.get(&amount), Some(&1250));
/// ```
pub struct Unmarshaler {
    resolver: Arc<dyn Resolver>,
    decoder: Arc<dyn Decoder>,
    additional_keys: Vec<FieldKey>,
    sentinels: SentinelRegistry,
    options: UnmarshalOptions,
}

impl Unmarshaler {
    pub fn builder<R: Resolver + 'static>(resolver: R) -> UnmarshalerBuilder {
        UnmarshalerBuilder::new(resolver)
    }

    pub fn options(&self) -> UnmarshalOptions {
        self.options
    }

    pub fn sentinels(&self) -> &SentinelRegistry {
        &self.sentinels
    }

    pub fn decoder(&self) -> &dyn Decoder {
        self.decoder.as_ref()
    }

    /// Decode `input` with the configured decoder, then rebuild the error.
    pub fn unmarshal(&self, input: &[u8]) -> Result<UnmarshaledError, UnmarshalError> {
        let decoded = self.decoder.decode(input)?;
        self.unmarshal_decoded(&decoded)
    }

    /// Rebuild an error from an already decoded payload.
    pub fn unmarshal_decoded(
        &self,
        decoded: &DecodedRepresentation,
    ) -> Result<UnmarshaledError, UnmarshalError> {
        let definition = self.resolve(decoded)?;
        let unresolved_kind = decoded
            .kind
            .as_deref()
            .filter(|wire| definition.kind() != *wire)
            .map(str::to_string);

        let mut parts = ErrorParts::new(
            definition.clone(),
            decoded.message.clone().unwrap_or_default(),
        );
        parts.fields = definition
            .fields()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        parts.stack = decoded.stack.clone();
        parts.unresolved_kind = unresolved_kind;

        for (name, raw) in &decoded.fields {
            self.apply_field(&definition, name, raw, &mut parts)?;
        }

        parts.causes = decoded
            .causes
            .iter()
            .map(|payload| self.reconstruct_cause(payload))
            .collect::<Result<_, _>>()?;

        Ok(UnmarshaledError::from_parts(parts))
    }

    /// Rebuild one nested cause payload.
    pub fn reconstruct_cause(&self, payload: &RawValue) -> Result<Cause, UnmarshalError> {
        reconstruct_cause(self, payload)
    }

    fn resolve(&self, decoded: &DecodedRepresentation) -> Result<Definition, UnmarshalError> {
        // A missing kind resolves like any unregistered one: only a fallback
        // can answer it.
        let kind = decoded.kind.as_deref().unwrap_or_default();

        let resolved = if self.options.strict_kinds {
            self.resolver.resolve_kind_strict(kind)
        } else {
            self.resolver.resolve_kind(kind)
        };

        match resolved {
            Some(def) => {
                if def.kind() != kind {
                    debug!(wire_kind = kind, fallback = %def.kind(), "kind resolved to fallback definition");
                }
                Ok(def)
            }
            None => Err(UnmarshalError::UnknownKind {
                kind: kind.to_string(),
            }),
        }
    }

    fn apply_field(
        &self,
        definition: &Definition,
        name: &str,
        raw: &RawValue,
        parts: &mut ErrorParts,
    ) -> Result<(), UnmarshalError> {
        if raw.is_redacted() {
            debug!(field = name, "redacted value kept verbatim");
            parts.unknown_fields.insert(name.to_string(), raw.clone());
            return Ok(());
        }

        let mut declared = definition.keys_named(name).peekable();
        if declared.peek().is_some() {
            match coerce_first(declared, raw)? {
                Some((key, value)) => {
                    parts.fields.insert(key, value);
                }
                None => {
                    debug!(
                        field = name,
                        wire = raw.shape_name(),
                        "coercion failed; schema default kept, raw value retained"
                    );
                    parts.unknown_fields.insert(name.to_string(), raw.clone());
                }
            }
            return Ok(());
        }

        let mut additional = self
            .additional_keys
            .iter()
            .filter(|key| key.name() == name)
            .peekable();
        if additional.peek().is_some() {
            match coerce_first(additional, raw)? {
                Some((key, value)) => {
                    parts.fields.insert(key, value);
                }
                None => {
                    debug!(field = name, "additional field did not coerce; kept verbatim");
                    parts.unknown_fields.insert(name.to_string(), raw.clone());
                }
            }
            return Ok(());
        }

        if self.options.strict_fields {
            return Err(UnmarshalError::UnknownField {
                kind: definition.kind().to_string(),
                field: name.to_string(),
            });
        }
        parts.unknown_fields.insert(name.to_string(), raw.clone());
        Ok(())
    }
}

/// Coerce against each key in turn; the first success wins and a hard
/// failure aborts.
fn coerce_first<'k>(
    keys: impl Iterator<Item = &'k FieldKey>,
    raw: &RawValue,
) -> Result<Option<(FieldKey, FieldValue)>, UnmarshalError> {
    for key in keys {
        match coerce(key, raw) {
            Coercion::Coerced(value) => return Ok(Some((key.clone(), value))),
            Coercion::NotApplicable => continue,
            Coercion::Failed(source) => {
                return Err(UnmarshalError::Reconstruction {
                    field: key.name().to_string(),
                    type_name: key.type_name(),
                    source,
                })
            }
        }
    }
    Ok(None)
}
