//! Definition catalogues declared in JSON.
//!
//! Services that only need primitive field types can declare their error
//! kinds as data instead of code:
//!
//! ```json
//! [
//!   { "kind": "payments.declined",
//!     "fields": [ { "name": "amount", "type": "u64" },
//!                 { "name": "card_token", "type": "string", "sensitive": true } ] },
//!   { "kind": "payments.declined.fraud", "parent": "payments.declined",
//!     "fields": [ { "name": "score", "type": "f64", "default": 0.5 } ] }
//! ]
//! ```

use crate::definition::{Definition, DefinitionBuilder};
use crate::error::SchemaError;
use crate::field::{Field, FieldType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One declared error kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionSpec {
    pub kind: String,
    /// Kind of an earlier entry this one derives from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// One declared field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// `bool`, `string`, `i8`..`i64`, `u8`..`u64`, `f32`, `f64`, or a
    /// sequence of `string`, `i64`, `f64`, `bool` written as `string[]` etc.
    #[serde(rename = "type")]
    pub ty: String,
    /// Declared default; the type's zero value when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub sensitive: bool,
}

/// Parse a JSON catalogue and build its definitions in declaration order.
pub fn load_catalogue(json: &str) -> Result<Vec<Definition>, SchemaError> {
    let specs: Vec<DefinitionSpec> = serde_json::from_str(json)?;
    build_definitions(&specs)
}

/// Read and parse a JSON catalogue file.
pub fn load_catalogue_file(path: &Path) -> Result<Vec<Definition>, SchemaError> {
    let content = std::fs::read_to_string(path)?;
    load_catalogue(&content)
}

/// Build definitions from already parsed specs. Parents must be declared
/// before their children.
pub fn build_definitions(specs: &[DefinitionSpec]) -> Result<Vec<Definition>, SchemaError> {
    let mut built: HashMap<&str, Definition> = HashMap::new();
    let mut out = Vec::with_capacity(specs.len());

    for spec in specs {
        if built.contains_key(spec.kind.as_str()) {
            return Err(SchemaError::DuplicateKind {
                kind: spec.kind.clone(),
            });
        }

        let mut builder = match &spec.parent {
            None => Definition::builder(spec.kind.clone()),
            Some(parent) => built
                .get(parent.as_str())
                .ok_or_else(|| SchemaError::UnknownParent {
                    kind: spec.kind.clone(),
                    parent: parent.clone(),
                })?
                .derive(spec.kind.clone()),
        };

        for field in &spec.fields {
            builder = add_field(builder, &spec.kind, field)?;
        }

        let def = builder.build();
        built.insert(spec.kind.as_str(), def.clone());
        out.push(def);
    }
    Ok(out)
}

fn add_field(
    builder: DefinitionBuilder,
    kind: &str,
    spec: &FieldSpec,
) -> Result<DefinitionBuilder, SchemaError> {
    match spec.ty.as_str() {
        "bool" => typed::<bool>(builder, kind, spec),
        "string" => typed::<String>(builder, kind, spec),
        "i8" => typed::<i8>(builder, kind, spec),
        "i16" => typed::<i16>(builder, kind, spec),
        "i32" => typed::<i32>(builder, kind, spec),
        "i64" => typed::<i64>(builder, kind, spec),
        "u8" => typed::<u8>(builder, kind, spec),
        "u16" => typed::<u16>(builder, kind, spec),
        "u32" => typed::<u32>(builder, kind, spec),
        "u64" => typed::<u64>(builder, kind, spec),
        "f32" => typed::<f32>(builder, kind, spec),
        "f64" => typed::<f64>(builder, kind, spec),
        "string[]" => typed::<Vec<String>>(builder, kind, spec),
        "i64[]" => typed::<Vec<i64>>(builder, kind, spec),
        "f64[]" => typed::<Vec<f64>>(builder, kind, spec),
        "bool[]" => typed::<Vec<bool>>(builder, kind, spec),
        other => Err(SchemaError::UnsupportedType {
            kind: kind.to_string(),
            field: spec.name.clone(),
            ty: other.to_string(),
        }),
    }
}

fn typed<T: FieldType + Default>(
    builder: DefinitionBuilder,
    kind: &str,
    spec: &FieldSpec,
) -> Result<DefinitionBuilder, SchemaError> {
    let field = if spec.sensitive {
        Field::<T>::named_sensitive(spec.name.clone())
    } else {
        Field::<T>::named(spec.name.clone())
    };
    let default = match &spec.default {
        None => T::default(),
        Some(value) => serde_json::from_value::<T>(value.clone()).map_err(|source| {
            SchemaError::InvalidDefault {
                kind: kind.to_string(),
                field: spec.name.clone(),
                source,
            }
        })?,
    };
    Ok(builder.field(&field, default))
}
