//! Typed, named error fields.
//!
//! A [`Field<T>`] is the typed handle a crate declares once and uses to read
//! and write values. Internally every field is carried as a type-erased
//! [`FieldKey`] / [`FieldValue`] pair so that a [`Definition`](crate::Definition)
//! can hold fields of many types and the unmarshaler can coerce wire values
//! into them without knowing the destination type at compile time.

use crate::raw::RawValue;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

// ─── Shape ────────────────────────────────────────────────────────────────────

/// Primitive kind of a non-composite field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    String,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl ScalarKind {
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool | Self::String)
    }

    /// Bit width and signedness for integer kinds.
    pub fn integer_bits(self) -> Option<(u32, bool)> {
        match self {
            Self::I8 => Some((8, true)),
            Self::I16 => Some((16, true)),
            Self::I32 => Some((32, true)),
            Self::I64 => Some((64, true)),
            Self::U8 => Some((8, false)),
            Self::U16 => Some((16, false)),
            Self::U32 => Some((32, false)),
            Self::U64 => Some((64, false)),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        };
        f.write_str(s)
    }
}

/// What a boxed field points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointee {
    Record,
    Scalar(ScalarKind),
    Other,
}

/// Description of a field's declared type, as far as coercion cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A primitive. `named` is set for newtypes over a primitive
    /// (e.g. `struct AccountId(String)`).
    Scalar { kind: ScalarKind, named: bool },
    /// A struct with its own serde field rules.
    Record,
    /// A string-keyed map.
    Map,
    /// A list.
    Sequence,
    /// A heap indirection (`Box<T>`).
    Pointer(Pointee),
    /// Anything else; only exact construction applies.
    Opaque,
}

/// A primitive value produced by a conversion strategy, handed to
/// [`FieldType::from_scalar`] to build the concrete field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
}

// ─── FieldType ────────────────────────────────────────────────────────────────

/// A Rust type usable as an error field value.
///
/// The default method bodies refuse everything, so a type only opts into the
/// strategies it actually supports.
pub trait FieldType:
    Any + Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync
{
    /// The declared shape of this type.
    fn shape() -> Shape;

    /// Build a value from a raw wire value of exactly this type (a `String`
    /// from a wire string, an `f64` from a wire number, …).
    fn from_exact(_raw: &RawValue) -> Option<Self> {
        None
    }

    /// Build a value from an already range-checked primitive.
    fn from_scalar(_scalar: Scalar) -> Option<Self> {
        None
    }
}

impl FieldType for bool {
    fn shape() -> Shape {
        Shape::Scalar { kind: ScalarKind::Bool, named: false }
    }

    fn from_exact(raw: &RawValue) -> Option<Self> {
        match raw {
            RawValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn from_scalar(scalar: Scalar) -> Option<Self> {
        match scalar {
            Scalar::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl FieldType for String {
    fn shape() -> Shape {
        Shape::Scalar { kind: ScalarKind::String, named: false }
    }

    fn from_exact(raw: &RawValue) -> Option<Self> {
        raw.as_str().map(str::to_string)
    }

    fn from_scalar(scalar: Scalar) -> Option<Self> {
        match scalar {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl FieldType for f64 {
    fn shape() -> Shape {
        Shape::Scalar { kind: ScalarKind::F64, named: false }
    }

    fn from_exact(raw: &RawValue) -> Option<Self> {
        raw.as_f64()
    }

    fn from_scalar(scalar: Scalar) -> Option<Self> {
        match scalar {
            Scalar::Float(v) => Some(v),
            _ => None,
        }
    }
}

impl FieldType for f32 {
    fn shape() -> Shape {
        Shape::Scalar { kind: ScalarKind::F32, named: false }
    }

    fn from_scalar(scalar: Scalar) -> Option<Self> {
        match scalar {
            Scalar::Float(v) => Some(v as f32),
            _ => None,
        }
    }
}

macro_rules! integer_field_type {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl FieldType for $ty {
                fn shape() -> Shape {
                    Shape::Scalar { kind: ScalarKind::$kind, named: false }
                }

                fn from_scalar(scalar: Scalar) -> Option<Self> {
                    match scalar {
                        Scalar::Int(v) => <$ty>::try_from(v).ok(),
                        Scalar::Uint(v) => <$ty>::try_from(v).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

integer_field_type! {
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
}

impl<T: FieldType> FieldType for Vec<T> {
    fn shape() -> Shape {
        Shape::Sequence
    }
}

impl<T: FieldType> FieldType for BTreeMap<String, T> {
    fn shape() -> Shape {
        Shape::Map
    }
}

impl<T: FieldType> FieldType for HashMap<String, T> {
    fn shape() -> Shape {
        Shape::Map
    }
}

impl<T: FieldType> FieldType for IndexMap<String, T> {
    fn shape() -> Shape {
        Shape::Map
    }
}

impl<T: FieldType> FieldType for Box<T> {
    fn shape() -> Shape {
        match T::shape() {
            Shape::Record => Shape::Pointer(Pointee::Record),
            Shape::Scalar { kind, .. } => Shape::Pointer(Pointee::Scalar(kind)),
            _ => Shape::Pointer(Pointee::Other),
        }
    }

    fn from_scalar(scalar: Scalar) -> Option<Self> {
        T::from_scalar(scalar).map(Box::new)
    }
}

// ─── FieldValue ───────────────────────────────────────────────────────────────

trait ErasedValue: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_erased(&self, other: &dyn ErasedValue) -> bool;
    fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error>;
}

impl<T: FieldType> ErasedValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_erased(&self, other: &dyn ErasedValue) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|o| self == o)
    }

    fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }

    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// A type-erased field value. Cheap to clone.
#[derive(Clone)]
pub struct FieldValue(Arc<dyn ErasedValue>);

impl FieldValue {
    pub fn new<T: FieldType>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the underlying value if it is a `T`.
    pub fn downcast_ref<T: FieldType>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Serialize the value back into the loosely-typed wire model.
    pub fn to_raw(&self) -> Result<RawValue, serde_json::Error> {
        let bytes = self.0.to_json()?;
        serde_json::from_slice(&bytes)
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_erased(other.0.as_ref())
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.debug(f)
    }
}

// ─── FieldKey ─────────────────────────────────────────────────────────────────

trait ErasedKey: Send + Sync {
    fn name(&self) -> &str;
    fn value_type(&self) -> TypeId;
    fn type_name(&self) -> &'static str;
    fn shape(&self) -> Shape;
    fn sensitive(&self) -> bool;
    fn construct(&self, raw: &RawValue) -> Option<FieldValue>;
    fn construct_scalar(&self, scalar: Scalar) -> Option<FieldValue>;
    fn construct_wire(&self, bytes: &[u8]) -> Result<FieldValue, serde_json::Error>;
}

struct TypedKey<T> {
    name: Cow<'static, str>,
    sensitive: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FieldType> ErasedKey for TypedKey<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn shape(&self) -> Shape {
        T::shape()
    }

    fn sensitive(&self) -> bool {
        self.sensitive
    }

    fn construct(&self, raw: &RawValue) -> Option<FieldValue> {
        T::from_exact(raw).map(FieldValue::new)
    }

    fn construct_scalar(&self, scalar: Scalar) -> Option<FieldValue> {
        T::from_scalar(scalar).map(FieldValue::new)
    }

    fn construct_wire(&self, bytes: &[u8]) -> Result<FieldValue, serde_json::Error> {
        serde_json::from_slice::<T>(bytes).map(FieldValue::new)
    }
}

/// A type-erased field key: a display name plus a declared type.
///
/// Two keys are equal when both the name and the Rust type match, so a key
/// re-created from the same `Field<T>` declaration compares equal.
#[derive(Clone)]
pub struct FieldKey(Arc<dyn ErasedKey>);

impl FieldKey {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Rust type name of the declared value type.
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    pub fn shape(&self) -> Shape {
        self.0.shape()
    }

    /// Sensitive fields are written as [`REDACTED`](crate::REDACTED) on encode.
    pub fn is_sensitive(&self) -> bool {
        self.0.sensitive()
    }

    /// Construct a value from `raw` only if it is already of the declared type.
    pub fn construct(&self, raw: &RawValue) -> Option<FieldValue> {
        self.0.construct(raw)
    }

    /// Construct a value from a converted primitive.
    pub fn construct_scalar(&self, scalar: Scalar) -> Option<FieldValue> {
        self.0.construct_scalar(scalar)
    }

    /// Deserialize a JSON document directly into the declared type.
    pub fn construct_wire(&self, bytes: &[u8]) -> Result<FieldValue, serde_json::Error> {
        self.0.construct_wire(bytes)
    }

    /// Returns `true` if `value` holds this key's declared type.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        value.0.as_any().type_id() == self.0.value_type()
    }
}

impl PartialEq for FieldKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.value_type() == other.0.value_type() && self.name() == other.name()
    }
}

impl Eq for FieldKey {}

impl Hash for FieldKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
        self.0.value_type().hash(state);
    }
}

impl fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name(), self.type_name())
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Field<T> ─────────────────────────────────────────────────────────────────

/// Typed handle for a named field.
///
/// ```
/// use errwire_core::Field;
///
/// let attempts = Field::<u32>::new("attempts");
/// let (key, value) = attempts.value(3);
/// assert_eq!(key.name(), "attempts");
/// assert_eq!(value.downcast_ref::<u32>(), Some(&3));
/// ```
pub struct Field<T> {
    key: FieldKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FieldType> Field<T> {
    pub fn new(name: &'static str) -> Self {
        Self::build(Cow::Borrowed(name), false)
    }

    /// A field with a runtime-provided name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::build(Cow::Owned(name.into()), false)
    }

    /// A field whose value is replaced by the redaction marker on encode.
    pub fn sensitive(name: &'static str) -> Self {
        Self::build(Cow::Borrowed(name), true)
    }

    pub fn named_sensitive(name: impl Into<String>) -> Self {
        Self::build(Cow::Owned(name.into()), true)
    }

    fn build(name: Cow<'static, str>, sensitive: bool) -> Self {
        Self {
            key: FieldKey(Arc::new(TypedKey::<T> {
                name,
                sensitive,
                _marker: PhantomData,
            })),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub fn key(&self) -> FieldKey {
        self.key.clone()
    }

    /// Pair this key with a value, ready for a definition or an override list.
    pub fn value(&self, value: T) -> (FieldKey, FieldValue) {
        (self.key.clone(), FieldValue::new(value))
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.key, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_equality_is_name_and_type() {
        let a = Field::<i32>::new("code").key();
        let b = Field::<i32>::named("code".to_string()).key();
        let c = Field::<i64>::new("code").key();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn exact_construction_only_matches_declared_type() {
        let s = Field::<String>::new("s").key();
        assert!(s.construct(&RawValue::from("x")).is_some());
        assert!(s.construct(&RawValue::Number(1.0)).is_none());

        let n = Field::<i32>::new("n").key();
        assert!(n.construct(&RawValue::Number(1.0)).is_none());
    }

    #[test]
    fn integer_scalar_construction_checks_width() {
        let k = Field::<u8>::new("small").key();
        assert!(k.construct_scalar(Scalar::Uint(255)).is_some());
        assert!(k.construct_scalar(Scalar::Uint(256)).is_none());
        assert!(k.construct_scalar(Scalar::Int(-1)).is_none());
    }

    #[test]
    fn values_compare_by_type_and_content() {
        assert_eq!(FieldValue::new(5_i32), FieldValue::new(5_i32));
        assert_ne!(FieldValue::new(5_i32), FieldValue::new(5_i64));
        assert_ne!(FieldValue::new(5_i32), FieldValue::new(6_i32));
    }

    #[test]
    fn boxed_shapes() {
        assert_eq!(
            <Box<i32>>::shape(),
            Shape::Pointer(Pointee::Scalar(ScalarKind::I32))
        );
        assert_eq!(<Box<Vec<i32>>>::shape(), Shape::Pointer(Pointee::Other));
    }

    #[test]
    fn value_to_raw() {
        let v = FieldValue::new(vec![1_u16, 2]);
        assert_eq!(
            v.to_raw().unwrap(),
            RawValue::Seq(vec![RawValue::Number(1.0), RawValue::Number(2.0)])
        );
    }

    #[test]
    fn accepts_checks_value_type() {
        let k = Field::<bool>::new("flag").key();
        assert!(k.accepts(&FieldValue::new(true)));
        assert!(!k.accepts(&FieldValue::new("true".to_string())));
    }
}
