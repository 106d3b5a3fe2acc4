//! Helper macros for declaring user types as field types.

/// Implement [`FieldType`](crate::FieldType) for one or more structs that
/// derive `Serialize` and `Deserialize`.
///
/// Record fields are rebuilt from nested wire maps by deserializing straight
/// into the struct, so the struct's own serde attributes (`rename`,
/// `default`, …) decide how wire members map onto Rust fields.
///
/// ```
/// use errwire_core::{record_field, FieldType, Shape};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct Limit {
///     window_secs: u32,
///     max: u32,
/// }
///
/// record_field!(Limit);
/// assert_eq!(Limit::shape(), Shape::Record);
/// ```
#[macro_export]
macro_rules! record_field {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::FieldType for $ty {
                fn shape() -> $crate::Shape {
                    $crate::Shape::Record
                }
            }
        )+
    };
}

/// Implement [`FieldType`](crate::FieldType) for a single-field tuple struct
/// wrapping a primitive (`String`, `bool`, an integer or a float).
///
/// The newtype must serialize as its inner value (`#[serde(transparent)]`).
///
/// ```
/// use errwire_core::{named_scalar_field, FieldType, ScalarKind, Shape};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// #[serde(transparent)]
/// struct AccountId(String);
///
/// named_scalar_field!(AccountId => String);
/// assert_eq!(
///     AccountId::shape(),
///     Shape::Scalar { kind: ScalarKind::String, named: true }
/// );
/// ```
#[macro_export]
macro_rules! named_scalar_field {
    ($($ty:ident => $inner:ty),+ $(,)?) => {
        $(
            impl $crate::FieldType for $ty {
                fn shape() -> $crate::Shape {
                    match <$inner as $crate::FieldType>::shape() {
                        $crate::Shape::Scalar { kind, .. } => {
                            $crate::Shape::Scalar { kind, named: true }
                        }
                        other => other,
                    }
                }

                fn from_scalar(scalar: $crate::Scalar) -> Option<Self> {
                    <$inner as $crate::FieldType>::from_scalar(scalar).map($ty)
                }
            }
        )+
    };
}
