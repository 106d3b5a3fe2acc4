//! errwire-unmarshal — rebuilds typed error trees from decoded wire payloads.
//!
//! # Quick Start
//!
//! ```rust
//! use errwire_core::{Definition, DefaultResolver, Field, StrictResolver};
//! use errwire_unmarshal::{JsonEncoder, Unmarshaler};
//!
//! let status = Field::<u16>::new("status");
//! let not_found = Definition::builder("http.not_found").field(&status, 404).build();
//! let unknown = Definition::builder("unknown").build();
//!
//! let resolver = DefaultResolver::new(StrictResolver::with_definitions([not_found]), unknown);
//! let unmarshaler = Unmarshaler::builder(resolver)
//!     .standard_sentinel_errors()
//!     .build()
//!     .unwrap();
//!
//! let payload = br#"{
//!     "message": "no such user",
//!     "kind": "http.not_found",
//!     "fields": { "status": 404, "user": "u-17" },
//!     "causes": [ { "message": "entity not found", "type": "std::io::Error" } ]
//! }"#;
//! let err = unmarshaler.unmarshal(payload).unwrap();
//!
//! assert_eq!(err.get(&status), Some(&404));
//! assert!(err.causes()[0].as_sentinel().is_some());
//! println!("{}", String::from_utf8(JsonEncoder::new().encode(&err).unwrap()).unwrap());
//! ```

pub mod cause;
pub mod coerce;
pub mod json;
pub mod sentinel;
pub mod unmarshaler;

pub use coerce::{coerce, Coercion};
pub use json::{JsonDecoder, JsonEncoder};
pub use sentinel::{standard_sentinels, SentinelRegistry};
pub use unmarshaler::{UnmarshalOptions, Unmarshaler, UnmarshalerBuilder};
