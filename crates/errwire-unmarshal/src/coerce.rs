//! Field coercion — turn one raw wire value into one declared field type.
//!
//! Strategy priority (the first strategy that applies decides):
//! 1. Direct construction      — the raw value already has the declared type
//! 2. Numeric conversion       — wire number → integer / float of any width
//! 3. Structural rebuild       — wire map / list → record, map, list, boxed record
//! 4. Underlying conversion    — wire primitive → newtype over that primitive
//! 5. Boxed scalar             — wire primitive → `Box<primitive>`
//! 6. Otherwise                — not applicable

use errwire_core::{FieldKey, FieldValue, Pointee, RawPrimitive, RawValue, Scalar, ScalarKind, Shape};
use tracing::trace;

/// Outcome of coercing one raw value against one field key.
#[derive(Debug)]
pub enum Coercion {
    Coerced(FieldValue),
    /// No strategy produced a value. The caller degrades gracefully.
    NotApplicable,
    /// The value had the right structural shape but its content did not fit
    /// the declared type. Must propagate.
    Failed(serde_json::Error),
}

impl Coercion {
    pub fn is_coerced(&self) -> bool {
        matches!(self, Self::Coerced(_))
    }
}

/// Coerce `raw` into the type declared by `key`.
pub fn coerce(key: &FieldKey, raw: &RawValue) -> Coercion {
    // 1. Direct construction
    if let Some(value) = key.construct(raw) {
        return Coercion::Coerced(value);
    }

    let shape = key.shape();

    // 2. Numeric conversion
    if let (RawValue::Number(n), Shape::Scalar { kind, .. }) = (raw, shape) {
        if kind.is_numeric() {
            return from_option(numeric(key, kind, *n));
        }
    }

    // 3. Structural rebuild
    if raw.is_structured() && is_structural(shape) {
        return structural(key, raw);
    }

    match (shape, raw.primitive()) {
        // 4. Underlying conversion for named scalars
        (Shape::Scalar { kind, named: true }, Some(prim)) if primitive_matches(kind, prim) => {
            from_option(scalar_of(raw).and_then(|s| key.construct_scalar(s)))
        }
        // 5. Boxed scalars
        (Shape::Pointer(Pointee::Scalar(kind)), Some(prim)) => {
            if let (RawValue::Number(n), true) = (raw, kind.is_numeric()) {
                from_option(numeric(key, kind, *n))
            } else if primitive_matches(kind, prim) {
                from_option(scalar_of(raw).and_then(|s| key.construct_scalar(s)))
            } else {
                Coercion::NotApplicable
            }
        }
        _ => {
            trace!(
                field = key.name(),
                wire = raw.shape_name(),
                declared = key.type_name(),
                "coerce: no applicable strategy"
            );
            Coercion::NotApplicable
        }
    }
}

fn from_option(value: Option<FieldValue>) -> Coercion {
    value.map_or(Coercion::NotApplicable, Coercion::Coerced)
}

fn is_structural(shape: Shape) -> bool {
    matches!(
        shape,
        Shape::Record | Shape::Map | Shape::Sequence | Shape::Pointer(Pointee::Record)
    )
}

/// Range-checked numeric narrowing / widening.
fn numeric(key: &FieldKey, kind: ScalarKind, n: f64) -> Option<FieldValue> {
    if !n.is_finite() {
        return None;
    }
    if let Some((bits, signed)) = kind.integer_bits() {
        if n.fract() != 0.0 {
            return None;
        }
        let (lo, hi_exclusive) = integer_bounds(bits, signed);
        if n < lo || n >= hi_exclusive {
            return None;
        }
        let scalar = if signed {
            Scalar::Int(n as i64)
        } else {
            Scalar::Uint(n as u64)
        };
        return key.construct_scalar(scalar);
    }
    match kind {
        ScalarKind::F32 if n.abs() > f64::from(f32::MAX) => None,
        ScalarKind::F32 | ScalarKind::F64 => key.construct_scalar(Scalar::Float(n)),
        _ => None,
    }
}

/// `[lo, hi)` as doubles. Both ends are powers of two, so exact.
fn integer_bounds(bits: u32, signed: bool) -> (f64, f64) {
    if signed {
        let half = 2f64.powi(bits as i32 - 1);
        (-half, half)
    } else {
        (0.0, 2f64.powi(bits as i32))
    }
}

/// Re-encode the raw value as JSON and decode it straight into the declared
/// type, so the type's own serde rules decide member mapping.
fn structural(key: &FieldKey, raw: &RawValue) -> Coercion {
    let bytes = match serde_json::to_vec(raw) {
        Ok(b) => b,
        Err(e) => return Coercion::Failed(e),
    };
    match key.construct_wire(&bytes) {
        Ok(value) => Coercion::Coerced(value),
        Err(e) => Coercion::Failed(e),
    }
}

fn primitive_matches(kind: ScalarKind, prim: RawPrimitive) -> bool {
    matches!(
        (kind, prim),
        (ScalarKind::Bool, RawPrimitive::Bool)
            | (ScalarKind::String, RawPrimitive::String)
            | (ScalarKind::F64, RawPrimitive::Number)
    )
}

fn scalar_of(raw: &RawValue) -> Option<Scalar> {
    match raw {
        RawValue::Bool(b) => Some(Scalar::Bool(*b)),
        RawValue::String(s) => Some(Scalar::Str(s.clone())),
        RawValue::Number(n) => Some(Scalar::Float(*n)),
        RawValue::Null | RawValue::Map(_) | RawValue::Seq(_) => None,
    }
}
