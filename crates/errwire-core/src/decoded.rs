//! The wire-agnostic decoded form of a serialized error, and the `Decoder`
//! trait every wire format implements to produce it.

use crate::error::{DecodeError, ShapeError};
use crate::raw::RawValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One stored stack frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "func")]
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\t{}:{}", self.function, self.file, self.line)
    }
}

/// A decoded error payload.
///
/// `kind` is `None` for foreign errors (errors that were not produced from a
/// [`Definition`](crate::Definition)); those carry an origin `type_name`
/// instead. Nested causes are kept as raw payloads and normalized one level
/// at a time with [`DecodedRepresentation::from_raw`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRepresentation {
    pub message: Option<String>,
    pub kind: Option<String>,
    pub type_name: Option<String>,
    pub fields: IndexMap<String, RawValue>,
    pub stack: Vec<Frame>,
    pub causes: Vec<RawValue>,
}

impl DecodedRepresentation {
    /// Normalize a raw payload of the shape
    /// `{ message, kind?, type?, fields?, stack?, causes? }`.
    ///
    /// Members that are present but have the wrong shape are an error; absent
    /// members are left empty. Unrecognized members are ignored.
    pub fn from_raw(raw: &RawValue) -> Result<Self, ShapeError> {
        let map = raw.as_map().ok_or_else(|| shape_err("payload", "a map", raw))?;

        let message = optional_string(map.get("message"), "message")?;
        let kind = optional_string(map.get("kind"), "kind")?;
        let type_name = optional_string(map.get("type"), "type")?;

        let fields = match map.get("fields") {
            None | Some(RawValue::Null) => IndexMap::new(),
            Some(RawValue::Map(m)) => m.clone(),
            Some(other) => return Err(shape_err("fields", "a map", other)),
        };

        let stack = match map.get("stack") {
            None | Some(RawValue::Null) => Vec::new(),
            Some(RawValue::Seq(frames)) => frames
                .iter()
                .enumerate()
                .map(|(i, f)| frame_from_raw(i, f))
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => return Err(shape_err("stack", "a sequence", other)),
        };

        let causes = match map.get("causes") {
            None | Some(RawValue::Null) => Vec::new(),
            Some(RawValue::Seq(c)) => c.clone(),
            Some(other) => return Err(shape_err("causes", "a sequence", other)),
        };

        Ok(Self {
            message,
            kind,
            type_name,
            fields,
            stack,
            causes,
        })
    }

    /// Returns `true` if the payload names a kind (i.e. was produced from a
    /// definition rather than being a foreign error).
    pub fn has_kind(&self) -> bool {
        self.kind.is_some()
    }
}

fn shape_err(member: impl Into<String>, expected: &'static str, got: &RawValue) -> ShapeError {
    ShapeError {
        member: member.into(),
        expected,
        got: got.shape_name(),
    }
}

fn optional_string(v: Option<&RawValue>, member: &str) -> Result<Option<String>, ShapeError> {
    match v {
        None | Some(RawValue::Null) => Ok(None),
        Some(RawValue::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(shape_err(member, "a string", other)),
    }
}

fn frame_from_raw(index: usize, raw: &RawValue) -> Result<Frame, ShapeError> {
    let member = |m: &str| format!("stack[{index}].{m}");
    let map = raw
        .as_map()
        .ok_or_else(|| shape_err(format!("stack[{index}]"), "a map", raw))?;

    let text = |name: &str| -> Result<String, ShapeError> {
        match map.get(name) {
            None | Some(RawValue::Null) => Ok(String::new()),
            Some(RawValue::String(s)) => Ok(s.clone()),
            Some(other) => Err(shape_err(member(name), "a string", other)),
        }
    };

    let line = match map.get("line") {
        None | Some(RawValue::Null) => 0,
        Some(RawValue::Number(n)) if n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u32::MAX) => {
            *n as u32
        }
        Some(other) => return Err(shape_err(member("line"), "a line number", other)),
    };

    Ok(Frame {
        function: text("func")?,
        file: text("file")?,
        line,
    })
}

/// A wire-format decoder.
///
/// Implementations parse their format and normalize it into a
/// [`DecodedRepresentation`]. Nested causes must be normalized into raw
/// payload maps using the same member names as the built-in JSON format
/// (`message`, `kind`, `type`, `fields`, `stack`, `causes`).
pub trait Decoder: Send + Sync {
    /// Short name of the wire format, e.g. `"json"`.
    fn format(&self) -> &'static str;

    /// Decode a complete top-level payload.
    fn decode(&self, input: &[u8]) -> Result<DecodedRepresentation, DecodeError>;
}
