//! Cause reconstruction.
//!
//! Each nested payload becomes, in order of preference:
//! 1. A fully resolved [`UnmarshaledError`](errwire_core::UnmarshaledError)
//! 2. A registered [`Sentinel`](errwire_core::Sentinel), when the payload is a
//!    leaf whose `(type, message)` pair was registered
//! 3. An [`UnknownCause`] leaf carrying everything the payload had
//!
//! Internal failures (malformed payload shape, failed structural rebuild)
//! always propagate.

use errwire_core::{Cause, DecodedRepresentation, RawValue, UnknownCause, UnmarshalError};
use tracing::debug;

use crate::unmarshaler::Unmarshaler;

/// Message given to a cause payload that carried none.
pub const UNKNOWN_MESSAGE: &str = "unknown error";
/// Origin type name given to a cause payload that carried none.
pub const UNKNOWN_TYPE: &str = "unknown";

pub(crate) fn reconstruct_cause(
    unmarshaler: &Unmarshaler,
    payload: &RawValue,
) -> Result<Cause, UnmarshalError> {
    let decoded = DecodedRepresentation::from_raw(payload).map_err(UnmarshalError::MalformedCause)?;

    // Foreign causes carry no kind and never resolve, fallback included.
    if decoded.has_kind() {
        match unmarshaler.unmarshal_decoded(&decoded) {
            Ok(err) => return Ok(Cause::Error(err)),
            Err(e) if e.is_internal() => return Err(e),
            Err(e) => {
                debug!(reason = %e, "cause did not resolve; rebuilding it as an unknown cause");
            }
        }
    }

    let causes = decoded
        .causes
        .iter()
        .map(|nested| reconstruct_cause(unmarshaler, nested))
        .collect::<Result<Vec<_>, _>>()?;

    let message = decoded.message.unwrap_or_else(|| UNKNOWN_MESSAGE.to_string());
    let type_name = decoded.type_name.unwrap_or_else(|| UNKNOWN_TYPE.to_string());

    if causes.is_empty() {
        if let Some(sentinel) = unmarshaler.sentinels().get(&type_name, &message) {
            debug!(type_name = %type_name, message = %message, "cause restored to sentinel");
            return Ok(Cause::Sentinel(sentinel.clone()));
        }
    }

    Ok(Cause::Unknown(UnknownCause {
        message,
        type_name,
        kind: decoded.kind,
        fields: decoded.fields,
        stack: decoded.stack,
        causes,
    }))
}
