//! errwire-core — foundation types and traits for the errwire library.
//!
//! This crate defines:
//! - [`Kind`] — the symbolic identifier of an error schema
//! - [`Definition`] — an error schema with typed default fields
//! - [`Field`], [`FieldKey`], [`FieldValue`] — typed and type-erased fields
//! - [`RawValue`] — loosely-typed wire values, and the [`REDACTED`] marker
//! - [`DecodedRepresentation`] and the [`Decoder`] trait every wire format implements
//! - [`Resolver`] — kind/field lookup, strict ([`StrictResolver`]) or with a
//!   fallback ([`DefaultResolver`])
//! - [`UnmarshaledError`] and [`Cause`] — the reconstructed error tree

#[macro_use]
mod macros;

pub mod decoded;
pub mod definition;
pub mod error;
pub mod field;
pub mod kind;
pub mod raw;
pub mod resolver;
pub mod schema;
pub mod unmarshaled;

pub use decoded::{DecodedRepresentation, Decoder, Frame};
pub use definition::{Definition, DefinitionBuilder};
pub use error::{ConfigError, DecodeError, SchemaError, ShapeError, UnmarshalError};
pub use field::{Field, FieldKey, FieldType, FieldValue, Pointee, Scalar, ScalarKind, Shape};
pub use kind::Kind;
pub use raw::{RawPrimitive, RawValue, REDACTED};
pub use resolver::{DefaultResolver, Resolver, StrictResolver};
pub use unmarshaled::{Cause, ErrorParts, Sentinel, UnknownCause, UnmarshaledError};
