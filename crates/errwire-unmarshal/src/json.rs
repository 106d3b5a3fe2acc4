//! The built-in JSON wire format.
//!
//! ```json
//! {
//!   "message": "card declined",
//!   "kind":    "payments.declined",
//!   "fields":  { "amount": 1250 },
//!   "stack":   [ { "func": "charge", "file": "src/pay.rs", "line": 42 } ],
//!   "causes":  [ { "message": "unexpected end of file", "type": "std::io::Error" } ]
//! }
//! ```
//!
//! Foreign causes carry `type` instead of `kind`.

use errwire_core::{
    Cause, DecodeError, DecodedRepresentation, Decoder, RawValue, Sentinel, UnknownCause,
    UnmarshaledError,
};
use indexmap::IndexMap;
use serde::Serialize;

// ─── Decoder ──────────────────────────────────────────────────────────────────

/// Decodes the JSON wire format. `message` is required at the top level.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn format(&self) -> &'static str {
        "json"
    }

    fn decode(&self, input: &[u8]) -> Result<DecodedRepresentation, DecodeError> {
        let raw: RawValue = serde_json::from_slice(input).map_err(|e| DecodeError::Malformed {
            format: self.format(),
            reason: e.to_string(),
        })?;
        let decoded = DecodedRepresentation::from_raw(&raw)?;
        if decoded.message.is_none() {
            return Err(DecodeError::MissingField { field: "message" });
        }
        Ok(decoded)
    }
}

// ─── Encoder ──────────────────────────────────────────────────────────────────

/// Encodes a reconstructed error tree back into the JSON wire format.
///
/// - typed fields are written through their serde representation, sensitive
///   ones as the redaction marker
/// - fields kept verbatim are written unchanged and win over a typed field of
///   the same name
/// - the wire kind is written, so a fallback substitution re-encodes as the
///   kind that was received
/// - sentinels and unknown causes use the foreign-cause shape
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder {
    pretty: bool,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent the output.
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    pub fn encode(&self, err: &UnmarshaledError) -> Result<Vec<u8>, serde_json::Error> {
        let raw = self.to_raw(err)?;
        if self.pretty {
            serde_json::to_vec_pretty(&raw)
        } else {
            serde_json::to_vec(&raw)
        }
    }

    /// Build the wire payload of `err` without serializing it.
    pub fn to_raw(&self, err: &UnmarshaledError) -> Result<RawValue, serde_json::Error> {
        let mut out = IndexMap::new();
        out.insert("message".to_string(), RawValue::from(err.message()));
        let kind = err.unresolved_kind().unwrap_or(err.kind().as_str());
        out.insert("kind".to_string(), RawValue::from(kind));

        let mut fields = IndexMap::new();
        for (key, value) in err.fields() {
            if err.raw_field(key.name()).is_some() {
                continue;
            }
            let raw = if key.is_sensitive() {
                RawValue::redacted()
            } else {
                value.to_raw()?
            };
            fields.insert(key.name().to_string(), raw);
        }
        for (name, raw) in err.unknown_fields() {
            fields.insert(name.to_string(), raw.clone());
        }
        insert_non_empty(&mut out, "fields", RawValue::Map(fields));
        insert_non_empty(&mut out, "stack", to_raw(err.stack())?);
        insert_non_empty(&mut out, "causes", self.causes_to_raw(err.causes())?);

        Ok(RawValue::Map(out))
    }

    /// Build the wire payload of one cause.
    pub fn cause_to_raw(&self, cause: &Cause) -> Result<RawValue, serde_json::Error> {
        match cause {
            Cause::Error(err) => self.to_raw(err),
            Cause::Sentinel(sentinel) => Ok(sentinel_to_raw(sentinel)),
            Cause::Unknown(unknown) => self.unknown_to_raw(unknown),
        }
    }

    fn causes_to_raw(&self, causes: &[Cause]) -> Result<RawValue, serde_json::Error> {
        causes
            .iter()
            .map(|c| self.cause_to_raw(c))
            .collect::<Result<Vec<_>, _>>()
            .map(RawValue::Seq)
    }

    fn unknown_to_raw(&self, unknown: &UnknownCause) -> Result<RawValue, serde_json::Error> {
        let mut out = IndexMap::new();
        out.insert("message".to_string(), RawValue::from(unknown.message.as_str()));
        match &unknown.kind {
            Some(kind) => out.insert("kind".to_string(), RawValue::from(kind.as_str())),
            None => out.insert("type".to_string(), RawValue::from(unknown.type_name.as_str())),
        };
        insert_non_empty(&mut out, "fields", RawValue::Map(unknown.fields.clone()));
        insert_non_empty(&mut out, "stack", to_raw(&unknown.stack)?);
        insert_non_empty(&mut out, "causes", self.causes_to_raw(&unknown.causes)?);
        Ok(RawValue::Map(out))
    }
}

fn sentinel_to_raw(sentinel: &Sentinel) -> RawValue {
    let mut out = IndexMap::new();
    out.insert("message".to_string(), RawValue::from(sentinel.message()));
    out.insert("type".to_string(), RawValue::from(sentinel.type_name()));
    RawValue::Map(out)
}

/// Goes through bytes, not `serde_json::Value`, whose maps are sorted.
fn to_raw<T: Serialize + ?Sized>(value: &T) -> Result<RawValue, serde_json::Error> {
    serde_json::from_slice(&serde_json::to_vec(value)?)
}

fn insert_non_empty(out: &mut IndexMap<String, RawValue>, member: &str, value: RawValue) {
    let empty = match &value {
        RawValue::Map(m) => m.is_empty(),
        RawValue::Seq(s) => s.is_empty(),
        _ => false,
    };
    if !empty {
        out.insert(member.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentinel::FMT_ERROR_TYPE;
    use crate::Unmarshaler;
    use errwire_core::{Definition, ErrorParts, Field, Frame, StrictResolver, REDACTED};

    #[test]
    fn decoder_requires_message() {
        let err = JsonDecoder.decode(br#"{"kind": "k"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { field: "message" }));
    }

    #[test]
    fn decoder_rejects_invalid_json_and_shapes() {
        let err = JsonDecoder.decode(b"{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { format: "json", .. }));

        let err = JsonDecoder.decode(br#"{"message": "m", "fields": [1]}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Shape(ref s) if s.member == "fields"));
    }

    #[test]
    fn encoder_writes_sensitive_fields_redacted() {
        let token = Field::<String>::sensitive("token");
        let count = Field::<u32>::new("count");
        let def = Definition::builder("auth.failed")
            .field(&token, String::new())
            .field(&count, 0)
            .build();
        let (tk, tv) = token.value("s3cret".into());
        let (ck, cv) = count.value(2);
        let err = def.new_error("denied", [(tk, tv), (ck, cv)]);

        let out = String::from_utf8(JsonEncoder::new().encode(&err).unwrap()).unwrap();
        assert_eq!(
            out,
            format!(r#"{{"message":"denied","kind":"auth.failed","fields":{{"token":"{REDACTED}","count":2}}}}"#)
        );
    }

    #[test]
    fn encoder_writes_stack_and_foreign_causes() {
        let def = Definition::builder("job.failed").build();
        let mut parts = ErrorParts::new(def, "job failed");
        parts.stack = vec![Frame { function: "run".into(), file: "job.rs".into(), line: 12 }];
        parts.causes = vec![Cause::Sentinel(Sentinel::named(FMT_ERROR_TYPE, std::fmt::Error))];
        let err = UnmarshaledError::from_parts(parts);

        let raw = JsonEncoder::new().to_raw(&err).unwrap();
        let frame = &raw.get("stack").unwrap().as_seq().unwrap()[0];
        assert_eq!(frame.get("func").and_then(RawValue::as_str), Some("run"));
        assert_eq!(frame.get("line").and_then(RawValue::as_f64), Some(12.0));
        let cause = &raw.get("causes").unwrap().as_seq().unwrap()[0];
        assert_eq!(cause.get("type").and_then(RawValue::as_str), Some(FMT_ERROR_TYPE));
        assert!(raw.get("fields").is_none());
    }

    #[test]
    fn decode_then_encode_keeps_payload() {
        let def = Definition::builder("svc.error").field(&Field::<i64>::new("code"), 0).build();
        let unmarshaler = Unmarshaler::builder(StrictResolver::with_definitions([def]))
            .build()
            .unwrap();
        let input = r#"{"message":"boom","kind":"svc.error","fields":{"code":7,"extra":{"a":[1,2.5,"x",null]}},"causes":[{"message":"inner","type":"io"}]}"#;

        let err = unmarshaler.unmarshal(input.as_bytes()).unwrap();
        let out = String::from_utf8(JsonEncoder::new().encode(&err).unwrap()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn stack_frames_keep_wire_member_order() {
        let def = Definition::builder("svc.error").build();
        let unmarshaler = Unmarshaler::builder(StrictResolver::with_definitions([def]))
            .build()
            .unwrap();
        let input = r#"{"message":"boom","kind":"svc.error","stack":[{"func":"svc::run","file":"src/svc.rs","line":9}],"causes":[{"message":"inner","type":"io","stack":[{"func":"io::read","file":"src/io.rs","line":3}]}]}"#;

        let err = unmarshaler.unmarshal(input.as_bytes()).unwrap();
        let out = String::from_utf8(JsonEncoder::new().encode(&err).unwrap()).unwrap();
        assert_eq!(out, input);
    }
}
