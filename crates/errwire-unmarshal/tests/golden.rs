//! Golden fixture integration tests for errwire-unmarshal.
//!
//! Definitions come from `fixtures/catalogue.json`. Payload fixtures in
//! `fixtures/payloads/` wrap a wire payload with the values the rebuilt error
//! is expected to carry; `fixtures/wire/` holds payloads in the exact byte
//! form the encoder produces.

use std::error::Error as _;
use std::io;

use errwire_core::schema::load_catalogue_file;
use errwire_core::{
    record_field, Cause, DefaultResolver, Definition, Field, RawValue, StrictResolver,
    UnmarshalError, UnmarshaledError,
};
use errwire_unmarshal::sentinel::IO_ERROR_TYPE;
use errwire_unmarshal::{JsonEncoder, Unmarshaler};
use serde::{Deserialize, Serialize};

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn fixture_path(name: &str) -> std::path::PathBuf {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../fixtures");
    p.push(name);
    p
}

fn load_fixture(name: &str) -> serde_json::Value {
    let content = std::fs::read_to_string(fixture_path(name)).expect("fixture not found");
    serde_json::from_str(&content).expect("invalid fixture JSON")
}

fn payload_bytes(fixture: &serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&fixture["payload"]).expect("payload re-encode failed")
}

fn catalogue() -> Vec<Definition> {
    load_catalogue_file(&fixture_path("catalogue.json")).expect("catalogue failed to load")
}

fn definition(defs: &[Definition], kind: &str) -> Definition {
    defs.iter()
        .find(|d| d.kind() == kind)
        .cloned()
        .unwrap_or_else(|| panic!("kind {kind} missing from catalogue"))
}

fn strict_unmarshaler() -> Unmarshaler {
    strict_unmarshaler_with(catalogue())
}

/// Definitions are compared by identity, so tests asserting `is` must build
/// the unmarshaler from the same loaded catalogue.
fn strict_unmarshaler_with(defs: Vec<Definition>) -> Unmarshaler {
    Unmarshaler::builder(StrictResolver::with_definitions(defs))
        .standard_sentinel_errors()
        .build()
        .expect("configuration rejected")
}

fn fallback_resolver() -> DefaultResolver {
    let defs = catalogue();
    let unknown = definition(&defs, "unknown");
    DefaultResolver::new(StrictResolver::with_definitions(defs), unknown)
}

// ─── Round trip ───────────────────────────────────────────────────────────────

#[test]
fn golden_round_trip_catalogue_definition() {
    let defs = catalogue();
    let declined = definition(&defs, "payments.declined");
    let fraud = definition(&defs, "payments.declined.fraud");

    let original = fraud.new_error(
        "card declined: suspected fraud",
        [
            Field::<u64>::new("amount").value(1250),
            Field::<String>::new("currency").value("USD".into()),
            Field::<f64>::new("score").value(0.93),
        ],
    );
    let wire = JsonEncoder::new().encode(&original).unwrap();
    let decoded = strict_unmarshaler_with(defs.clone()).unmarshal(&wire).unwrap();

    assert_eq!(decoded.kind(), fraud.kind());
    assert_eq!(decoded.message(), original.message());
    assert!(decoded.is(&fraud));
    assert!(decoded.is(&declined));
    let reloaded = definition(&catalogue(), "payments.declined.fraud");
    assert!(!decoded.is(&reloaded));

    let fields: Vec<_> = decoded.fields().collect();
    let expected: Vec<_> = original.fields().collect();
    assert_eq!(fields, expected);
    assert_eq!(decoded.get(&Field::<String>::new("currency")), Some(&"USD".to_string()));
    assert_eq!(decoded.get(&Field::<String>::new("card_token")), Some(&String::new()));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RetryPolicy {
    #[serde(rename = "maxAttempts")]
    max_attempts: u8,
    backoff_ms: Vec<u32>,
}
record_field!(RetryPolicy);

#[test]
fn golden_round_trip_structured_fields() {
    let policy = Field::<RetryPolicy>::new("policy");
    let boxed = Field::<Box<RetryPolicy>>::new("previous");
    let labels = Field::<std::collections::BTreeMap<String, String>>::new("labels");
    let hops = Field::<Vec<i16>>::new("hops");
    let def = Definition::builder("jobs.gave_up")
        .field(&policy, RetryPolicy { max_attempts: 0, backoff_ms: vec![] })
        .field(&boxed, Box::new(RetryPolicy { max_attempts: 0, backoff_ms: vec![] }))
        .field(&labels, Default::default())
        .field(&hops, vec![])
        .build();

    let original = def.new_error(
        "job gave up",
        [
            policy.value(RetryPolicy { max_attempts: 5, backoff_ms: vec![100, 400, 1600] }),
            boxed.value(Box::new(RetryPolicy { max_attempts: 2, backoff_ms: vec![50] })),
            labels.value([("queue".to_string(), "billing".to_string())].into()),
            hops.value(vec![-3, 0, 12]),
        ],
    );
    let wire = JsonEncoder::new().encode(&original).unwrap();
    let unmarshaler = Unmarshaler::builder(StrictResolver::with_definitions([def.clone()]))
        .strict_fields(true)
        .build()
        .unwrap();
    let decoded = unmarshaler.unmarshal(&wire).unwrap();

    assert_eq!(decoded, original);
    assert_eq!(decoded.get(&policy).map(|p| p.max_attempts), Some(5));
}

// ─── Numeric coercion ─────────────────────────────────────────────────────────

#[test]
fn golden_numeric_boundary() {
    let f = load_fixture("payloads/numeric-boundary.json");
    let err = strict_unmarshaler().unmarshal(&payload_bytes(&f)).unwrap();

    let limit = Field::<i32>::new("limit");
    let used = Field::<i32>::new("used");
    assert_eq!(
        err.get(&limit).map(|v| i64::from(*v)),
        f["expectedLimit"].as_i64(),
        "limit at i32::MAX must coerce"
    );
    assert!(err.raw_field("limit").is_none());

    assert_eq!(err.get(&used).map(|v| i64::from(*v)), f["expectedUsedDefault"].as_i64());
    assert_eq!(
        err.raw_field("used").and_then(RawValue::as_f64),
        f["expectedUnknownUsed"].as_f64(),
        "overflowing value must stay verbatim"
    );
}

#[test]
fn golden_fractional_rejection() {
    let f = load_fixture("payloads/fractional-integer.json");
    let err = strict_unmarshaler().unmarshal(&payload_bytes(&f)).unwrap();

    for (name, expected) in f["expectedUnknown"].as_object().unwrap() {
        assert_eq!(
            err.raw_field(name).and_then(RawValue::as_f64),
            expected.as_f64(),
            "field {name} must keep its exact wire value"
        );
    }
    assert_eq!(
        err.get(&Field::<u8>::new("retries")).map(|v| u64::from(*v)),
        f["expectedRetriesDefault"].as_u64()
    );
}

// ─── Redaction ────────────────────────────────────────────────────────────────

#[test]
fn golden_redacted_field_not_resurrected() {
    let f = load_fixture("payloads/redacted-field.json");
    let err = strict_unmarshaler().unmarshal(&payload_bytes(&f)).unwrap();

    let token = Field::<String>::new("card_token");
    let marker = f["expectedMarker"].as_str().unwrap();
    assert_ne!(err.get(&token).map(String::as_str), Some(marker));
    assert_eq!(err.raw_field("card_token").and_then(RawValue::as_str), Some(marker));
    assert_eq!(
        err.get(&Field::<u64>::new("amount")).copied(),
        f["expectedAmount"].as_u64()
    );

    // Re-encoding writes the marker back unchanged.
    let raw = JsonEncoder::new().to_raw(&err).unwrap();
    let fields = raw.get("fields").unwrap();
    assert_eq!(fields.get("card_token").and_then(RawValue::as_str), Some(marker));
}

// ─── Causes ───────────────────────────────────────────────────────────────────

#[test]
fn golden_cause_chain_depth() {
    let f = load_fixture("payloads/cause-chain.json");
    let unmarshaler = strict_unmarshaler();
    let err = unmarshaler.unmarshal(&payload_bytes(&f)).unwrap();
    let levels = f["expectedLevels"].as_array().unwrap();

    assert_eq!(err.message(), levels[0]["message"].as_str().unwrap());
    assert_eq!(err.kind(), levels[0]["kind"].as_str().unwrap());
    assert_eq!(err.stack().len(), 2);
    assert_eq!(err.stack()[0].function, "checkout::submit");

    let mut cause = err.causes().first();
    for level in &levels[1..] {
        let c = cause.expect("cause chain ended early");
        assert_eq!(c.message(), level["message"].as_str().unwrap());
        if let Some(kind) = level["kind"].as_str() {
            assert_eq!(c.as_error().expect("expected a typed cause").kind(), kind);
        }
        cause = c.causes().first();
    }
    assert!(cause.is_none(), "cause chain deeper than expected");

    // The same depth is reachable through `Error::source`.
    let mut depth = 0;
    let mut source = err.source();
    while let Some(s) = source {
        depth += 1;
        source = s.source();
    }
    assert_eq!(depth, levels.len() - 1);

    let rpc = err.causes()[0].causes()[0].as_error().unwrap();
    assert_eq!(
        rpc.get(&Field::<Vec<String>>::new("tags")),
        Some(&vec!["primary".to_string(), "eu".to_string()])
    );
}

#[test]
fn golden_sentinel_identity() {
    let f = load_fixture("payloads/cause-chain.json");
    let unmarshaler = strict_unmarshaler();
    let err = unmarshaler.unmarshal(&payload_bytes(&f)).unwrap();

    let leaf = &err.causes()[0].causes()[0].causes()[0];
    let registered = unmarshaler
        .sentinels()
        .get(IO_ERROR_TYPE, "unexpected end of file")
        .unwrap();
    assert!(leaf.is_sentinel(registered));

    let sentinel = leaf.as_sentinel().unwrap();
    let io_err = sentinel.error().downcast_ref::<io::Error>().unwrap();
    assert_eq!(io_err.kind(), io::ErrorKind::UnexpectedEof);
}

#[test]
fn golden_foreign_causes() {
    let f = load_fixture("payloads/foreign-causes.json");
    let err = strict_unmarshaler().unmarshal(&payload_bytes(&f)).unwrap();
    let causes = err.causes();
    assert_eq!(causes.len(), 3);

    let quota = causes[0].as_unknown().unwrap();
    assert_eq!(quota.type_name, "vendor::QuotaError");
    assert_eq!(quota.message, "disk quota reached");

    // A registered pair with children stays a synthetic leaf.
    let not_found = causes[1].as_unknown().unwrap();
    assert_eq!(not_found.type_name, IO_ERROR_TYPE);
    assert!(matches!(&not_found.causes[..], [Cause::Unknown(u)] if u.message == "stale handle"));

    let evicted = causes[2].as_unknown().unwrap();
    assert_eq!(evicted.kind.as_deref(), Some("cache.evicted"));
    assert_eq!(evicted.message, errwire_unmarshal::cause::UNKNOWN_MESSAGE);
    assert_eq!(evicted.type_name, errwire_unmarshal::cause::UNKNOWN_TYPE);
    assert_eq!(
        evicted.fields.get("key").and_then(RawValue::as_str),
        Some("orders:42")
    );
}

// ─── Kind resolution ──────────────────────────────────────────────────────────

#[test]
fn golden_strict_vs_lenient_kind() {
    let f = load_fixture("payloads/unregistered-kind.json");
    let payload = payload_bytes(&f);

    let strict = strict_unmarshaler().unmarshal(&payload).unwrap_err();
    assert!(matches!(strict, UnmarshalError::UnknownKind { ref kind } if kind == "unregistered"));

    let lenient = Unmarshaler::builder(fallback_resolver()).build().unwrap();
    let err = lenient.unmarshal(&payload).unwrap();
    assert_eq!(err.kind(), f["fallbackKind"].as_str().unwrap());
    assert_eq!(err.raw_field("hint").and_then(RawValue::as_str), Some("retry later"));
}

/// A fallback resolver in strict-kind mode does not substitute its default,
/// and a lenient substitution reports the fallback's kind from `kind()`.
/// The received kind survives only through `unresolved_kind()`.
#[test]
fn golden_fallback_kind_reporting_is_pinned() {
    let f = load_fixture("payloads/unregistered-kind.json");
    let payload = payload_bytes(&f);

    let strict = Unmarshaler::builder(fallback_resolver())
        .strict_kinds(true)
        .build()
        .unwrap();
    assert!(matches!(
        strict.unmarshal(&payload),
        Err(UnmarshalError::UnknownKind { .. })
    ));

    let lenient = Unmarshaler::builder(fallback_resolver()).build().unwrap();
    let err = lenient.unmarshal(&payload).unwrap();
    assert_eq!(err.kind(), "unknown");
    assert_ne!(err.kind(), "unregistered");
    assert_eq!(err.unresolved_kind(), Some("unregistered"));

    // The encoder writes the received kind back out.
    let raw = JsonEncoder::new().to_raw(&err).unwrap();
    assert_eq!(raw.get("kind").and_then(RawValue::as_str), Some("unregistered"));
}

#[test]
fn golden_strict_fields_with_fallback() {
    let f = load_fixture("payloads/unregistered-kind.json");
    let unmarshaler = Unmarshaler::builder(fallback_resolver())
        .strict_fields(true)
        .build()
        .unwrap();
    let err = unmarshaler.unmarshal(&payload_bytes(&f)).unwrap_err();
    assert!(matches!(err, UnmarshalError::UnknownField { ref field, ref kind }
        if field == "hint" && kind == "unknown"));
}

// ─── Unknown field fidelity ───────────────────────────────────────────────────

#[test]
fn golden_unknown_fields_reencode_byte_for_byte() {
    let wire = std::fs::read_to_string(fixture_path("wire/unknown-fields.json"))
        .expect("fixture not found");
    let wire = wire.trim_end();

    let err: UnmarshaledError = strict_unmarshaler().unmarshal(wire.as_bytes()).unwrap();
    assert_eq!(err.get(&Field::<i32>::new("limit")), Some(&100));
    assert!(err.raw_field("trace_ctx").is_some());
    assert!(err.raw_field("note").is_some());

    let out = JsonEncoder::new().encode(&err).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), wire);
}
